//! Class-based enter/leave transitions coordinated across nested render trees.
//!
//! Each [`TransitionNode`] runs its own Enter and Leave activations. Nodes
//! nested inside another node follow its show value and report back to its
//! completion gate, so a node only finalizes once everything below it has.

pub mod barrier;
pub mod class_list;
pub mod commit;
pub mod coordination;
pub mod error;
pub mod host;
pub mod node;
pub mod props;
pub mod sequencer;

pub use barrier::{Arrival, Barrier, Settled};
pub use class_list::{ClassList, PhaseClasses, TransitionClasses};
pub use commit::{FrameSynchronizer, NextCommit, TRANSITION_COMMIT_FRAMES};
pub use coordination::{ChildRegistration, CompletionReport, CoordinationContext, Coordinator};
pub use error::TransitionError;
pub use host::TransitionHost;
pub use node::{TransitionEvent, TransitionNode, TransitionState};
pub use props::TransitionProps;
pub use sequencer::{ClassSequencer, TransitionEnd, TransitionEndOutcome};
