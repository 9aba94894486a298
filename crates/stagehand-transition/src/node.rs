//! The per-element activation state machine.
//!
//! A [`TransitionNode`] wraps one content element in a wrapper element and
//! runs Enter and Leave activations on it. Activations are queued and run one
//! at a time by a task on the host runtime; each one applies the phase's
//! `base` and `from` classes, waits for the commit, swaps `from` for `to`,
//! then waits for the element's transition and for every registered child
//! before removing its classes.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::future::join;
use smallvec::SmallVec;
use stagehand_core::{yield_now, Display, ElementId, Subscription, TaskHandle, TreeError};

use crate::barrier::Barrier;
use crate::class_list::{PhaseClasses, TransitionClasses};
use crate::commit::FrameSynchronizer;
use crate::coordination::{ChildRegistration, CompletionReport, CoordinationContext, Coordinator};
use crate::error::TransitionError;
use crate::host::TransitionHost;
use crate::props::TransitionProps;
use crate::sequencer::{ClassSequencer, TransitionEndOutcome};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransitionState {
    /// Hidden with the content element detached.
    Unmounted,
    Hidden,
    Entering,
    Shown,
    Leaving,
}

impl TransitionState {
    pub fn is_animating(self) -> bool {
        matches!(self, TransitionState::Entering | TransitionState::Leaving)
    }
}

/// Lifecycle signal emitted around every activation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    BeforeEnter,
    AfterEnter,
    BeforeLeave,
    AfterLeave,
}

struct Activation {
    show: bool,
    /// Owed to the ancestor when the activation was triggered by it.
    report: Option<CompletionReport>,
}

type EventListener = Rc<dyn Fn(TransitionEvent)>;

struct NodeInner {
    host: TransitionHost,
    wrapper: ElementId,
    content: ElementId,
    unmount: bool,
    descendant: bool,
    classes: TransitionClasses,
    sequencer: ClassSequencer,
    commit: FrameSynchronizer,
    context: CoordinationContext,
    parent: Option<Rc<dyn Coordinator>>,
    registration: RefCell<Option<ChildRegistration>>,
    state: Cell<TransitionState>,
    requested: Cell<bool>,
    queue: RefCell<VecDeque<Activation>>,
    driver: RefCell<Option<TaskHandle>>,
    listeners: RefCell<SmallVec<[(u64, EventListener); 2]>>,
    next_listener_id: Cell<u64>,
}

/// One element's enter/leave transition.
///
/// With `shown` set in its props the node is driven by [`set_shown`]. With
/// `shown` unset it is a descendant: it registers with the coordinator it
/// was built with and follows that ancestor's show value, reporting back
/// to the ancestor's gate after each activation the ancestor triggered.
///
/// Dropping the node stops its activations, leaves its ancestor and removes
/// its elements from the tree.
///
/// [`set_shown`]: TransitionNode::set_shown
pub struct TransitionNode {
    inner: Rc<NodeInner>,
}

impl TransitionNode {
    /// Wraps `content` in a new wrapper appended to `parent_element`.
    ///
    /// `content` must not be attached anywhere yet. When the props leave
    /// `shown` unset, `coordinator` is required and the initial state follows
    /// the ancestor's current show value.
    pub fn new(
        host: &TransitionHost,
        parent_element: ElementId,
        content: ElementId,
        props: TransitionProps,
        coordinator: Option<Rc<dyn Coordinator>>,
    ) -> Result<Self, TransitionError> {
        let tree = &host.tree;
        if let Some(parent) = tree.parent(content)? {
            log::debug!("content {content} already has parent {parent}");
            return Err(TransitionError::ContentAlreadyWrapped { id: content });
        }

        let (shown, parent) = match (props.shown, coordinator) {
            (Some(shown), coordinator) => {
                if coordinator.is_some() {
                    log::debug!("explicit shown on element {content}; ignoring coordinator");
                }
                (shown, None)
            }
            (None, Some(coordinator)) => {
                let shown = match coordinator.current_show() {
                    Some(shown) => shown,
                    None => {
                        log::debug!(
                            "ancestor of element {content} has not decided yet; starting hidden"
                        );
                        false
                    }
                };
                (shown, Some(coordinator))
            }
            (None, None) => return Err(TransitionError::MissingCoordinator),
        };

        let wrapper = tree.create("div");
        if let Err(err) = tree.append_child(parent_element, wrapper) {
            let _ = tree.remove(wrapper);
            return Err(err.into());
        }

        let animate_initial = shown && props.appear;
        let initial_state = if shown && !props.appear {
            TransitionState::Shown
        } else if props.unmount {
            TransitionState::Unmounted
        } else {
            TransitionState::Hidden
        };
        if initial_state != TransitionState::Unmounted {
            if let Err(err) = tree.append_child(wrapper, content) {
                let _ = tree.remove(wrapper);
                return Err(err.into());
            }
        }
        let display = if initial_state == TransitionState::Shown {
            Display::Contents
        } else {
            Display::None
        };
        tree.set_display(wrapper, display)?;

        let sequencer = ClassSequencer::new(tree.clone(), content, host.frame_clock())
            .with_timeout(props.transition_timeout);
        let descendant = parent.is_some();
        let inner = Rc::new(NodeInner {
            host: host.clone(),
            wrapper,
            content,
            unmount: props.unmount,
            descendant,
            classes: TransitionClasses::derive(&props),
            sequencer,
            commit: FrameSynchronizer::new(host.frame_clock()),
            // Undecided until the initial Enter runs, so that Enter notifies
            // and waits for the children registered in the meantime.
            context: CoordinationContext::new((!animate_initial).then_some(shown)),
            parent,
            registration: RefCell::new(None),
            state: Cell::new(initial_state),
            requested: Cell::new(shown),
            queue: RefCell::new(VecDeque::new()),
            driver: RefCell::new(None),
            listeners: RefCell::new(SmallVec::new()),
            next_listener_id: Cell::new(1),
        });

        if let Some(coordinator) = inner.parent.clone() {
            let weak = Rc::downgrade(&inner);
            let registration = ChildRegistration::attach(coordinator, move |show| {
                if let Some(inner) = weak.upgrade() {
                    NodeInner::follow_ancestor(&inner, show);
                }
            });
            *inner.registration.borrow_mut() = Some(registration);
        }

        log::debug!(
            "transition node on element {content}: {:?}{}",
            initial_state,
            if descendant { " (descendant)" } else { "" }
        );

        if animate_initial {
            NodeInner::enqueue(
                &inner,
                Activation {
                    show: true,
                    report: None,
                },
            );
        }

        Ok(Self { inner })
    }

    /// Requests the node be shown or hidden.
    ///
    /// Ignored when `show` equals the last requested value, and on
    /// descendant nodes, which only follow their ancestor.
    pub fn set_shown(&self, show: bool) {
        if self.inner.descendant {
            log::warn!(
                "set_shown({show}) on descendant element {}; ignored",
                self.inner.content
            );
            return;
        }
        if self.inner.requested.get() == show {
            return;
        }
        self.execute(show);
    }

    /// Queues an activation towards `show` unconditionally.
    pub fn execute(&self, show: bool) {
        NodeInner::enqueue(&self.inner, Activation { show, report: None });
    }

    pub fn state(&self) -> TransitionState {
        self.inner.state.get()
    }

    /// No activation running or queued.
    pub fn is_settled(&self) -> bool {
        self.inner.driver.borrow().is_none()
            && self.inner.queue.borrow().is_empty()
            && !self.inner.state.get().is_animating()
    }

    /// Last requested show value.
    pub fn is_shown(&self) -> bool {
        self.inner.requested.get()
    }

    pub fn is_descendant(&self) -> bool {
        self.inner.descendant
    }

    pub fn wrapper(&self) -> ElementId {
        self.inner.wrapper
    }

    pub fn content(&self) -> ElementId {
        self.inner.content
    }

    pub fn child_count(&self) -> usize {
        self.inner.context.child_count()
    }

    /// Coordinator to pass to nodes nested inside this one.
    pub fn coordinator(&self) -> Rc<dyn Coordinator> {
        self.inner.context.as_coordinator()
    }

    pub fn on_event(&self, listener: impl Fn(TransitionEvent) + 'static) -> Subscription {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(entry, _)| *entry != id);
            }
        })
    }
}

impl NodeInner {
    fn follow_ancestor(this: &Rc<Self>, show: Option<bool>) {
        let Some(show) = show else {
            return;
        };
        let Some(parent) = this.parent.as_ref() else {
            return;
        };
        let report = CompletionReport::reserve(parent.as_ref());
        Self::enqueue(
            this,
            Activation {
                show,
                report: Some(report),
            },
        );
    }

    fn enqueue(this: &Rc<Self>, activation: Activation) {
        this.requested.set(activation.show);
        this.queue.borrow_mut().push_back(activation);
        if this.driver.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(this);
        match this.host.runtime.spawn_ui(Self::drive(weak)) {
            Some(task) => *this.driver.borrow_mut() = Some(task),
            None => {
                log::warn!(
                    "runtime gone; dropping activations of element {}",
                    this.content
                );
                let dropped = std::mem::take(&mut *this.queue.borrow_mut());
                drop(dropped);
            }
        }
    }

    async fn drive(weak: Weak<Self>) {
        loop {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let next = inner.queue.borrow_mut().pop_front();
            let Some(activation) = next else {
                inner.driver.borrow_mut().take();
                return;
            };
            if activation.show {
                inner.enter(activation.report).await;
            } else {
                inner.leave(activation.report).await;
            }
        }
    }

    async fn enter(self: &Rc<Self>, report: Option<CompletionReport>) {
        log::debug!("element {}: enter", self.content);
        self.emit(TransitionEvent::BeforeEnter);
        let previous = self.state.replace(TransitionState::Entering);
        if previous == TransitionState::Unmounted {
            self.check(
                "mount",
                self.host.tree.append_child(self.wrapper, self.content),
            );
            yield_now().await;
        }
        let gate = self.context.begin_activation(true);
        self.check(
            "show wrapper",
            self.host.tree.set_display(self.wrapper, Display::Contents),
        );

        self.run_phase(&self.classes.enter, gate, report).await;

        self.state.set(TransitionState::Shown);
        log::debug!("element {}: entered", self.content);
        self.emit(TransitionEvent::AfterEnter);
    }

    async fn leave(self: &Rc<Self>, report: Option<CompletionReport>) {
        log::debug!("element {}: leave", self.content);
        self.emit(TransitionEvent::BeforeLeave);
        self.state.set(TransitionState::Leaving);
        let gate = self.context.begin_activation(false);

        self.run_phase(&self.classes.leave, gate, report).await;

        self.check(
            "hide wrapper",
            self.host.tree.set_display(self.wrapper, Display::None),
        );
        if self.unmount {
            self.check("unmount", self.host.tree.detach(self.content));
            self.state.set(TransitionState::Unmounted);
        } else {
            self.state.set(TransitionState::Hidden);
        }
        log::debug!("element {}: left", self.content);
        self.emit(TransitionEvent::AfterLeave);
    }

    /// Applies one phase's classes and waits until this element, every
    /// registered child and, when reporting, every sibling are done.
    async fn run_phase(
        &self,
        phase: &PhaseClasses,
        gate: Barrier,
        report: Option<CompletionReport>,
    ) {
        let start = phase.base.union(&phase.from);
        self.check("apply start classes", self.sequencer.add_classes(&start));

        if !phase.is_empty() {
            let committed_at = self.commit.await_next_commit().await;
            log::trace!(
                "element {}: start classes committed at {committed_at}ns",
                self.content
            );
        }

        let transition_end = match self.sequencer.await_transition_end(&phase.base) {
            Ok(wait) => Some(wait),
            Err(err) => {
                log::error!(
                    "element {}: cannot await transition end: {err}",
                    self.content
                );
                None
            }
        };
        self.check(
            "remove from classes",
            self.sequencer.remove_classes(&phase.from),
        );
        self.check("apply to classes", self.sequencer.add_classes(&phase.to));

        let own = async move {
            match transition_end {
                Some(wait) => wait.await,
                None => TransitionEndOutcome::Skipped,
            }
        };
        let (outcome, ()) = join(own, gate.settled()).await;
        log::trace!(
            "element {}: own transition {:?}, {} child report(s) settled",
            self.content,
            outcome,
            gate.expected()
        );

        if let Some(report) = report {
            report.report().await;
        }

        let settle = phase.base.union(&phase.to);
        self.check(
            "remove transition classes",
            self.sequencer.remove_classes(&settle),
        );
    }

    fn check(&self, step: &str, result: Result<(), TreeError>) {
        if let Err(err) = result {
            log::error!("element {}: {step} failed: {err}", self.content);
        }
    }

    fn emit(&self, event: TransitionEvent) {
        let listeners: SmallVec<[EventListener; 2]> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

impl Drop for TransitionNode {
    fn drop(&mut self) {
        let inner = &self.inner;
        let driver = inner.driver.borrow_mut().take();
        if let Some(task) = driver {
            task.cancel();
        }
        let pending = std::mem::take(&mut *inner.queue.borrow_mut());
        drop(pending);
        let registration = inner.registration.borrow_mut().take();
        drop(registration);

        let tree = &inner.host.tree;
        if tree.contains(inner.wrapper) {
            let _ = tree.remove(inner.wrapper);
        }
        if tree.contains(inner.content) {
            let _ = tree.remove(inner.content);
        }
        log::debug!("transition node on element {} dropped", inner.content);
    }
}

impl fmt::Debug for TransitionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionNode")
            .field("wrapper", &self.inner.wrapper)
            .field("content", &self.inner.content)
            .field("state", &self.inner.state.get())
            .field("descendant", &self.inner.descendant)
            .field("queued", &self.inner.queue.borrow().len())
            .field("children", &self.inner.context.child_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
