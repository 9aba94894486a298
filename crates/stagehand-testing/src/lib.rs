//! Testing utilities for stagehand transitions.

pub mod harness;
pub mod recorder;

pub use harness::*;
pub use recorder::*;

pub mod prelude {
    pub use crate::harness::*;
    pub use crate::recorder::*;
    pub use stagehand_transition::{
        TransitionEvent, TransitionNode, TransitionProps, TransitionState,
    };
}
