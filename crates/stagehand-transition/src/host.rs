use stagehand_core::{FrameClock, RenderTree, RuntimeHandle};

/// The environment transition nodes run in: the runtime that drives their
/// activations and the tree holding their elements.
#[derive(Clone, Debug)]
pub struct TransitionHost {
    pub runtime: RuntimeHandle,
    pub tree: RenderTree,
}

impl TransitionHost {
    pub fn new(runtime: RuntimeHandle, tree: RenderTree) -> Self {
        Self { runtime, tree }
    }

    pub fn frame_clock(&self) -> FrameClock {
        self.runtime.frame_clock()
    }
}
