//! Frame-commit synchronization.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use stagehand_core::{FrameClock, NextFrame};

/// Number of frame boundaries awaited between applying the "from" classes
/// and swapping to the "to" classes.
///
/// A style written during one frame may only be recalculated on the frame
/// after next. Swapping within that window lets the renderer see a single
/// computed state, and the transition collapses to nothing. Two boundaries
/// is the minimum that guarantees the "from" state was committed, leaving
/// two distinct computed states to interpolate between.
pub const TRANSITION_COMMIT_FRAMES: usize = 2;

/// Defers continuation past [`TRANSITION_COMMIT_FRAMES`] frame boundaries.
#[derive(Clone, Debug)]
pub struct FrameSynchronizer {
    clock: FrameClock,
}

impl FrameSynchronizer {
    pub fn new(clock: FrameClock) -> Self {
        Self { clock }
    }

    pub fn await_next_commit(&self) -> NextCommit {
        NextCommit {
            clock: self.clock.clone(),
            remaining: TRANSITION_COMMIT_FRAMES,
            current: None,
            last_frame: 0,
        }
    }
}

/// Future returned by [`FrameSynchronizer::await_next_commit`]; yields the
/// timestamp of the last awaited frame.
pub struct NextCommit {
    clock: FrameClock,
    remaining: usize,
    current: Option<NextFrame>,
    last_frame: u64,
}

impl Future for NextCommit {
    type Output = u64;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        loop {
            let this = &mut *self;
            if this.current.is_none() {
                if this.remaining == 0 {
                    return Poll::Ready(this.last_frame);
                }
                this.remaining -= 1;
                this.current = Some(this.clock.next_frame());
            }
            let Some(frame) = this.current.as_mut() else {
                continue;
            };
            match Pin::new(frame).poll(cx) {
                Poll::Ready(time) => {
                    log::trace!("commit boundary at {time}ns, {} left", this.remaining);
                    this.last_frame = time;
                    this.current = None;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
