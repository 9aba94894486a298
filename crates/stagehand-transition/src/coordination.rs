//! Parent/child coordination.
//!
//! A node owns one [`CoordinationContext`] and hands it to its descendants as
//! an `Rc<dyn Coordinator>`. Show state travels down through the context's
//! observable; completion travels up through the per-activation [`Barrier`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use stagehand_core::{ObservableReader, ObservableValue, Subscription};

use crate::barrier::{Arrival, Barrier};

/// Surface an ancestor exposes to the nodes nested under it.
pub trait Coordinator {
    fn register_child(&self);

    fn unregister_child(&self);

    /// Show value of the ancestor, `None` before it was ever decided.
    fn current_show(&self) -> Option<bool>;

    fn subscribe_show(&self, observer: Box<dyn Fn(Option<bool>)>) -> Subscription;

    /// Gate of the ancestor's most recent activation.
    fn current_gate(&self) -> Barrier;

    fn report_child_completion(&self) -> Arrival {
        self.current_gate().arrive()
    }
}

struct ContextInner {
    count: Cell<usize>,
    show: ObservableValue<Option<bool>>,
    gate: RefCell<Barrier>,
}

/// Per-node coordination state: registered child count, the observable show
/// value and the gate of the current activation.
#[derive(Clone)]
pub struct CoordinationContext {
    inner: Rc<ContextInner>,
}

impl CoordinationContext {
    pub fn new(initial_show: Option<bool>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                count: Cell::new(0),
                show: ObservableValue::new(initial_show),
                gate: RefCell::new(Barrier::new(0)),
            }),
        }
    }

    pub fn child_count(&self) -> usize {
        self.inner.count.get()
    }

    pub fn show(&self) -> ObservableReader<Option<bool>> {
        self.inner.show.reader()
    }

    /// Starts an activation towards `show` and returns its gate.
    ///
    /// The gate expects one report from every child registered right now,
    /// or none when the show value does not change (children are only
    /// notified of changes). It is installed before children are notified,
    /// so each child reserves its report against this gate.
    pub fn begin_activation(&self, show: bool) -> Barrier {
        let changes = self.inner.show.get() != Some(show);
        let expected = if changes { self.inner.count.get() } else { 0 };
        let gate = Barrier::new(expected);
        log::debug!("activation towards show={show}: gate expects {expected} child report(s)");
        *self.inner.gate.borrow_mut() = gate.clone();
        self.inner.show.set(Some(show));
        gate
    }

    pub fn as_coordinator(&self) -> Rc<dyn Coordinator> {
        Rc::new(self.clone())
    }
}

impl Coordinator for CoordinationContext {
    fn register_child(&self) {
        self.inner.count.set(self.inner.count.get() + 1);
    }

    fn unregister_child(&self) {
        let count = self.inner.count.get();
        debug_assert!(count > 0, "unregister without matching register");
        self.inner.count.set(count.saturating_sub(1));
    }

    fn current_show(&self) -> Option<bool> {
        self.inner.show.get()
    }

    fn subscribe_show(&self, observer: Box<dyn Fn(Option<bool>)>) -> Subscription {
        self.inner.show.subscribe(move |show| observer(*show))
    }

    fn current_gate(&self) -> Barrier {
        self.inner.gate.borrow().clone()
    }
}

impl fmt::Debug for CoordinationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinationContext")
            .field("count", &self.inner.count.get())
            .field("show", &self.inner.show.get())
            .field("gate", &*self.inner.gate.borrow())
            .finish()
    }
}

/// A child's membership in its ancestor's context.
///
/// Registration and subscription happen together on attach and are undone
/// together on drop, so the ancestor's count always matches its subscribers.
pub struct ChildRegistration {
    coordinator: Rc<dyn Coordinator>,
    subscription: Option<Subscription>,
}

impl ChildRegistration {
    pub fn attach(
        coordinator: Rc<dyn Coordinator>,
        observer: impl Fn(Option<bool>) + 'static,
    ) -> Self {
        coordinator.register_child();
        let subscription = coordinator.subscribe_show(Box::new(observer));
        Self {
            coordinator,
            subscription: Some(subscription),
        }
    }

    pub fn coordinator(&self) -> &Rc<dyn Coordinator> {
        &self.coordinator
    }
}

impl Drop for ChildRegistration {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.coordinator.unregister_child();
    }
}

impl fmt::Debug for ChildRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRegistration")
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

/// A report owed to one specific ancestor gate.
///
/// Reserved when the child learns about the ancestor's show change. Dropping
/// it unreported forfeits the slot so the ancestor is never left waiting on
/// a child that went away.
pub struct CompletionReport {
    gate: Barrier,
    reported: bool,
}

impl CompletionReport {
    pub fn reserve(coordinator: &dyn Coordinator) -> Self {
        Self {
            gate: coordinator.current_gate(),
            reported: false,
        }
    }

    pub fn gate(&self) -> &Barrier {
        &self.gate
    }

    /// Arrives at the reserved gate. The returned future resolves once every
    /// sibling has arrived too.
    pub fn report(mut self) -> Arrival {
        self.reported = true;
        self.gate.arrive()
    }
}

impl Drop for CompletionReport {
    fn drop(&mut self) {
        if !self.reported {
            log::debug!("completion report dropped unreported; forfeiting slot");
            self.gate.forfeit();
        }
    }
}

impl fmt::Debug for CompletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionReport")
            .field("gate", &self.gate)
            .field("reported", &self.reported)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/coordination_tests.rs"]
mod tests;
