#![doc = r"Host runtime pieces for stagehand: a single-threaded task executor, a frame clock, single-writer observables and an in-memory render tree."]

pub mod collections;
pub mod frame_clock;
pub mod observable;
pub mod platform;
pub mod runtime;
pub mod tree;

pub use frame_clock::{FrameCallbackRegistration, FrameClock, NextFrame};
pub use observable::{ObservableReader, ObservableValue, Subscription};
pub use platform::{Clock, RuntimeScheduler};
pub use runtime::{
    yield_now, DefaultScheduler, FrameCallbackId, Runtime, RuntimeHandle, TaskHandle, YieldNow,
};
pub use tree::{
    Display, ElementId, ListenerId, Propagation, RenderTree, TransitionEndEvent, TreeError,
};
