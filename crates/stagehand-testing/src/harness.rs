use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use stagehand_core::{DefaultScheduler, ElementId, RenderTree, Runtime, RuntimeHandle, TreeError};
use stagehand_transition::{
    Coordinator, TransitionError, TransitionHost, TransitionNode, TransitionProps,
};

/// Synthetic frame interval, roughly 60 frames per second.
pub const FRAME_INTERVAL_NANOS: u64 = 16_666_667;

const MAX_IDLE_FRAMES: usize = 10_000;

/// Headless driver for transition trees.
///
/// Owns a runtime with a scheduler that never renders on its own, a render
/// tree with a root element, and a synthetic frame clock. Tests advance
/// frames explicitly and fire transition-end signals by hand, so every run
/// is deterministic.
pub struct TransitionHarness {
    runtime: Runtime,
    tree: RenderTree,
    root: ElementId,
    frame_time: u64,
}

impl TransitionHarness {
    pub fn new() -> Self {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let tree = RenderTree::new();
        let root = tree.create("body");
        Self {
            runtime,
            tree,
            root,
            frame_time: 0,
        }
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn tree(&self) -> &RenderTree {
        &self.tree
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn host(&self) -> TransitionHost {
        TransitionHost::new(self.runtime.handle(), self.tree.clone())
    }

    /// Creates a detached element, ready to be wrapped by a node.
    pub fn create_element(&self, tag: &str) -> ElementId {
        self.tree.create(tag)
    }

    /// Wraps a fresh `div` in a transition node under `parent`.
    pub fn transition(
        &self,
        parent: ElementId,
        props: TransitionProps,
        coordinator: Option<Rc<dyn Coordinator>>,
    ) -> Result<TransitionNode, TransitionError> {
        let content = self.create_element("div");
        TransitionNode::new(&self.host(), parent, content, props, coordinator)
    }

    /// Runs queued UI work and polls woken tasks without advancing time.
    pub fn pump(&self) {
        self.runtime.handle().drain_ui();
    }

    /// Delivers one frame at the next synthetic timestamp, then pumps.
    pub fn advance_frame(&mut self) -> u64 {
        self.frame_time += FRAME_INTERVAL_NANOS;
        let handle = self.runtime.handle();
        handle.drain_frame_callbacks(self.frame_time);
        handle.drain_ui();
        self.frame_time
    }

    pub fn advance_frames(&mut self, count: usize) {
        for _ in 0..count {
            self.advance_frame();
        }
    }

    /// Advances whole frames until at least `duration` of frame time passed.
    pub fn advance_time(&mut self, duration: Duration) {
        let target = self
            .frame_time
            .saturating_add(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX));
        while self.frame_time < target {
            self.advance_frame();
        }
    }

    /// Fires a native transition-end signal on `element` and pumps.
    ///
    /// Returns the number of listeners that saw the signal.
    pub fn finish_transition(&self, element: ElementId) -> Result<usize, TreeError> {
        let invoked = self.tree.dispatch_transition_end(element)?;
        self.pump();
        Ok(invoked)
    }

    /// Pumps and advances frames until nothing waits on a frame any more.
    ///
    /// Waits on transition-end signals are not frame driven, so this returns
    /// with such waits still pending. Returns the number of frames advanced.
    pub fn pump_until_idle(&mut self) -> usize {
        self.pump();
        let mut frames = 0;
        while self.runtime.handle().has_frame_callbacks() {
            frames += 1;
            if frames > MAX_IDLE_FRAMES {
                panic!("pump_until_idle: still requesting frames after {MAX_IDLE_FRAMES} frames");
            }
            self.advance_frame();
        }
        frames
    }

    pub fn frame_time(&self) -> u64 {
        self.frame_time
    }

    pub fn dump_tree(&self) -> String {
        self.tree.dump_tree(self.root)
    }
}

impl Default for TransitionHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` against a fresh harness.
pub fn run_test_transition<R>(f: impl FnOnce(&mut TransitionHarness) -> R) -> R {
    let mut harness = TransitionHarness::new();
    f(&mut harness)
}

#[cfg(test)]
#[path = "tests/harness_tests.rs"]
mod tests;
