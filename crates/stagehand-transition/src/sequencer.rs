//! Class-list mutation and native transition-completion waits.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use stagehand_core::{
    ElementId, FrameCallbackRegistration, FrameClock, ListenerId, Propagation, RenderTree,
    TreeError,
};

use crate::class_list::ClassList;

/// How a transition-end wait resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransitionEndOutcome {
    /// No classes were given, so there was nothing to wait for.
    Skipped,
    /// The element reported a native transition completion.
    Completed,
    /// The configured timeout elapsed first.
    TimedOut,
}

/// Applies class sets to one element and waits for its transitions.
///
/// The sequencer only ever touches the element it was created for.
#[derive(Clone, Debug)]
pub struct ClassSequencer {
    tree: RenderTree,
    element: ElementId,
    clock: FrameClock,
    timeout: Option<Duration>,
}

impl ClassSequencer {
    pub fn new(tree: RenderTree, element: ElementId, clock: FrameClock) -> Self {
        Self {
            tree,
            element,
            clock,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn add_classes(&self, names: &ClassList) -> Result<(), TreeError> {
        for name in names.iter() {
            if self.tree.add_class(self.element, name)? {
                log::trace!("element {}: +{name}", self.element);
            }
        }
        Ok(())
    }

    pub fn remove_classes(&self, names: &ClassList) -> Result<(), TreeError> {
        for name in names.iter() {
            if self.tree.remove_class(self.element, name)? {
                log::trace!("element {}: -{name}", self.element);
            }
        }
        Ok(())
    }

    /// Waits for the next transition completion signalled on the element.
    ///
    /// Resolves immediately with [`TransitionEndOutcome::Skipped`] when
    /// `names` is empty. Otherwise a listener is registered right away; it
    /// fires once, deregisters itself, and stops the signal from reaching
    /// listeners on ancestor elements.
    pub fn await_transition_end(&self, names: &ClassList) -> Result<TransitionEnd, TreeError> {
        if names.is_empty() {
            return Ok(TransitionEnd { state: None });
        }

        let state = Rc::new(TransitionEndState {
            tree: self.tree.clone(),
            element: self.element,
            classes: names.clone(),
            outcome: Cell::new(None),
            waker: RefCell::new(None),
            listener: Cell::new(None),
            timeout: self.timeout.map(|timeout| (self.clock.clone(), timeout)),
            started_at: Cell::new(None),
            timeout_check: RefCell::new(None),
        });

        let weak = Rc::downgrade(&state);
        let listener = self
            .tree
            .add_transition_end_listener(self.element, move |_event| {
                match weak.upgrade() {
                    Some(state) if state.outcome.get().is_none() => {
                        state.resolve(TransitionEndOutcome::Completed);
                        Propagation::Stop
                    }
                    _ => Propagation::Continue,
                }
            })?;
        state.listener.set(Some(listener));

        Ok(TransitionEnd { state: Some(state) })
    }
}

struct TransitionEndState {
    tree: RenderTree,
    element: ElementId,
    classes: ClassList,
    outcome: Cell<Option<TransitionEndOutcome>>,
    waker: RefCell<Option<Waker>>,
    listener: Cell<Option<ListenerId>>,
    timeout: Option<(FrameClock, Duration)>,
    started_at: Cell<Option<u64>>,
    timeout_check: RefCell<Option<FrameCallbackRegistration>>,
}

impl TransitionEndState {
    fn resolve(&self, outcome: TransitionEndOutcome) {
        if self.outcome.get().is_some() {
            return;
        }
        self.outcome.set(Some(outcome));
        self.release();
        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn release(&self) {
        if let Some(listener) = self.listener.take() {
            self.tree.remove_listener(self.element, listener);
        }
        let check = self.timeout_check.borrow_mut().take();
        drop(check);
    }

    fn schedule_timeout_check(this: &Rc<Self>) {
        let Some((clock, timeout)) = this.timeout.clone() else {
            return;
        };
        let weak: Weak<Self> = Rc::downgrade(this);
        let registration = clock.with_frame_nanos(move |now| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let fired = state.timeout_check.borrow_mut().take();
            drop(fired);
            if state.outcome.get().is_some() {
                return;
            }
            let started = match state.started_at.get() {
                Some(started) => started,
                None => {
                    state.started_at.set(Some(now));
                    now
                }
            };
            let limit = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
            if now.saturating_sub(started) >= limit {
                log::warn!(
                    "element {}: no transition end for \"{}\" within {:?}; forcing completion",
                    state.element,
                    state.classes,
                    timeout
                );
                state.resolve(TransitionEndOutcome::TimedOut);
            } else {
                Self::schedule_timeout_check(&state);
            }
        });
        *this.timeout_check.borrow_mut() = Some(registration);
    }
}

/// Future returned by [`ClassSequencer::await_transition_end`].
///
/// Dropping it before it resolves deregisters the listener.
pub struct TransitionEnd {
    state: Option<Rc<TransitionEndState>>,
}

impl TransitionEnd {
    pub fn is_resolved(&self) -> bool {
        self.state
            .as_ref()
            .map(|state| state.outcome.get().is_some())
            .unwrap_or(true)
    }
}

impl Future for TransitionEnd {
    type Output = TransitionEndOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(state) = self.state.as_ref() else {
            return Poll::Ready(TransitionEndOutcome::Skipped);
        };
        if let Some(outcome) = state.outcome.get() {
            return Poll::Ready(outcome);
        }
        *state.waker.borrow_mut() = Some(cx.waker().clone());
        if state.timeout.is_some() && state.timeout_check.borrow().is_none() {
            TransitionEndState::schedule_timeout_check(state);
        }
        Poll::Pending
    }
}

impl Drop for TransitionEnd {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.release();
        }
    }
}

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod tests;
