//! Counting completion gate.
//!
//! A [`Barrier`] is created per activation with the number of descendants
//! expected to report. Each descendant calls [`Barrier::arrive`] once and
//! awaits the returned [`Arrival`], which resolves when every expected
//! descendant has arrived. The owner awaits [`Barrier::settled`], which
//! additionally requires every arrival to have been consumed, so the owner
//! only continues after all descendants have run past their own wait.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use smallvec::SmallVec;

struct BarrierInner {
    expected: usize,
    arrived: Cell<usize>,
    released: Cell<usize>,
    resolved: Cell<bool>,
    waiters: RefCell<SmallVec<[Waker; 4]>>,
}

impl BarrierInner {
    fn register(&self, waker: &Waker) {
        let mut waiters = self.waiters.borrow_mut();
        if !waiters.iter().any(|existing| existing.will_wake(waker)) {
            waiters.push(waker.clone());
        }
    }

    fn wake_all(&self) {
        let waiters = std::mem::take(&mut *self.waiters.borrow_mut());
        for waker in waiters {
            waker.wake();
        }
    }

    fn is_settled(&self) -> bool {
        self.resolved.get() && self.released.get() >= self.expected
    }

    fn release_one(&self) {
        self.released.set(self.released.get() + 1);
        if self.is_settled() {
            self.wake_all();
        }
    }
}

#[derive(Clone)]
pub struct Barrier {
    inner: Rc<BarrierInner>,
}

impl Barrier {
    /// Creates a gate expecting `expected` arrivals. A gate expecting zero is
    /// resolved from the start.
    pub fn new(expected: usize) -> Self {
        Self {
            inner: Rc::new(BarrierInner {
                expected,
                arrived: Cell::new(0),
                released: Cell::new(0),
                resolved: Cell::new(expected == 0),
                waiters: RefCell::new(SmallVec::new()),
            }),
        }
    }

    pub fn expected(&self) -> usize {
        self.inner.expected
    }

    pub fn arrivals(&self) -> usize {
        self.inner.arrived.get()
    }

    /// All expected participants have arrived.
    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.get()
    }

    /// Resolved, and every arrival has been consumed or dropped.
    pub fn is_settled(&self) -> bool {
        self.inner.is_settled()
    }

    /// Records one arrival.
    ///
    /// Arrivals beyond the expected count are ignored (logged) and return an
    /// already-released [`Arrival`]; they can never resolve the gate again.
    pub fn arrive(&self) -> Arrival {
        let inner = &self.inner;
        if inner.arrived.get() >= inner.expected {
            log::warn!(
                "surplus arrival at completion gate expecting {}",
                inner.expected
            );
            return Arrival {
                barrier: self.clone(),
                released: true,
            };
        }
        inner.arrived.set(inner.arrived.get() + 1);
        log::debug!(
            "completion gate: {}/{} arrived",
            inner.arrived.get(),
            inner.expected
        );
        if inner.arrived.get() == inner.expected && !inner.resolved.replace(true) {
            inner.wake_all();
        }
        Arrival {
            barrier: self.clone(),
            released: false,
        }
    }

    /// Arrives on behalf of a participant that will never wait on the result.
    pub fn forfeit(&self) {
        drop(self.arrive());
    }

    pub fn settled(&self) -> Settled {
        Settled {
            barrier: self.clone(),
        }
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("expected", &self.inner.expected)
            .field("arrived", &self.inner.arrived.get())
            .field("released", &self.inner.released.get())
            .finish()
    }
}

/// One participant's arrival; resolves once the whole gate has resolved.
///
/// Dropping an unresolved arrival still releases its slot.
pub struct Arrival {
    barrier: Barrier,
    released: bool,
}

impl Arrival {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.barrier.inner.release_one();
        }
    }
}

impl Future for Arrival {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.barrier.is_resolved() {
            self.barrier.inner.register(cx.waker());
            return Poll::Pending;
        }
        self.release();
        Poll::Ready(())
    }
}

impl Drop for Arrival {
    fn drop(&mut self) {
        self.release();
    }
}

/// Resolves once the gate is resolved and every arrival was consumed.
pub struct Settled {
    barrier: Barrier,
}

impl Future for Settled {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.barrier.is_settled() {
            return Poll::Ready(());
        }
        self.barrier.inner.register(cx.waker());
        Poll::Pending
    }
}

#[cfg(test)]
#[path = "tests/barrier_tests.rs"]
mod tests;
