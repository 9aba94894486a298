//! Platform abstraction traits for the stagehand runtime.
//!
//! These traits let the host decide when frames happen and how time is
//! measured, so the runtime never talks to a windowing or browser API
//! directly.

/// Schedules work for the runtime.
///
/// Implementations are responsible for arranging that the host eventually
/// drains frame callbacks and UI tasks. They must be safe to call from any
/// thread because task wakers may be cloned across threads.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}

/// Provides timing information for the runtime.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of nanoseconds elapsed since `since`.
    fn elapsed_nanos(&self, since: Self::Instant) -> u64;
}
