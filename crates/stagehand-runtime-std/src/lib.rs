//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `stagehand-core`. Hosts construct a
//! [`StdRuntime`] and call [`StdRuntime::pump_frame`] from their render
//! loop; frame timestamps come from a monotonic wall clock.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use stagehand_core::{Clock, FrameClock, Runtime, RuntimeHandle, RuntimeScheduler};
use web_time::Instant;

/// Scheduler that records frame requests for the host loop to poll.
#[derive(Default)]
pub struct StdScheduler {
    frame_requested: AtomicBool,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.swap(false, Ordering::SeqCst)
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "frame_requested",
                &self.frame_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_frame(&self) {
        self.frame_requested.store(true, Ordering::SeqCst);
    }
}

/// Monotonic clock.
#[derive(Debug, Default, Clone)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed_nanos(&self, since: Self::Instant) -> u64 {
        u64::try_from(since.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Convenience container bundling the standard scheduler, clock and runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: Arc<StdClock>,
    runtime: Runtime,
    started: Instant,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            clock: Arc::new(StdClock),
            runtime,
            started: Instant::now(),
        }
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn frame_clock(&self) -> FrameClock {
        self.runtime.frame_clock()
    }

    /// Returns whether a frame was requested since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Runs queued UI work without crossing a frame boundary.
    pub fn drain_ui(&self) {
        self.runtime_handle().drain_ui();
    }

    /// Emits one frame boundary stamped with the time since construction,
    /// then drains the UI work it unblocked. Returns the frame timestamp.
    pub fn pump_frame(&self) -> u64 {
        let handle = self.runtime_handle();
        handle.drain_ui();
        let now = self.clock.elapsed_nanos(self.started);
        let requested = self.take_frame_request();
        log::trace!("frame at {now}ns (requested: {requested})");
        handle.drain_frame_callbacks(now);
        handle.drain_ui();
        now
    }

    /// Whether any frame callback or UI task is still outstanding.
    pub fn is_idle(&self) -> bool {
        let handle = self.runtime_handle();
        !handle.has_frame_callbacks() && !handle.has_pending_ui()
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/std_runtime_tests.rs"]
mod tests;
