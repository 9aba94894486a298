use super::*;
use futures::FutureExt;
use stagehand_core::{DefaultScheduler, Runtime};
use std::sync::Arc;

struct Fixture {
    runtime: Runtime,
    tree: RenderTree,
    parent: ElementId,
    element: ElementId,
}

impl Fixture {
    fn new() -> Self {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let tree = RenderTree::new();
        let parent = tree.create("div");
        let element = tree.create("div");
        tree.append_child(parent, element).expect("attach");
        Self {
            runtime,
            tree,
            parent,
            element,
        }
    }

    fn sequencer(&self) -> ClassSequencer {
        ClassSequencer::new(self.tree.clone(), self.element, self.runtime.frame_clock())
    }

    fn spawn_wait(&self, wait: TransitionEnd) -> Rc<Cell<Option<TransitionEndOutcome>>> {
        let outcome = Rc::new(Cell::new(None));
        let sink = Rc::clone(&outcome);
        self.runtime
            .handle()
            .spawn_ui(async move {
                sink.set(Some(wait.await));
            })
            .expect("runtime alive");
        self.runtime.handle().drain_ui();
        outcome
    }
}

#[test]
fn add_and_remove_are_idempotent() {
    let fixture = Fixture::new();
    let sequencer = fixture.sequencer();
    sequencer
        .add_classes(&ClassList::parse("fade duration-300"))
        .expect("add");
    sequencer
        .add_classes(&ClassList::parse("fade opacity-0"))
        .expect("add again");
    assert_eq!(
        fixture.tree.classes(fixture.element).expect("classes"),
        vec!["fade", "duration-300", "opacity-0"]
    );

    sequencer
        .remove_classes(&ClassList::parse("fade missing"))
        .expect("remove");
    assert_eq!(
        fixture.tree.classes(fixture.element).expect("classes"),
        vec!["duration-300", "opacity-0"]
    );
    assert!(fixture.tree.classes(fixture.parent).expect("classes").is_empty());
}

#[test]
fn empty_class_list_resolves_without_listener() {
    let fixture = Fixture::new();
    let wait = fixture
        .sequencer()
        .await_transition_end(&ClassList::new())
        .expect("wait");
    assert!(wait.is_resolved());
    assert_eq!(fixture.tree.listener_count(fixture.element), 0);
    assert_eq!(wait.now_or_never(), Some(TransitionEndOutcome::Skipped));
}

#[test]
fn resolves_on_first_signal_and_deregisters() {
    let fixture = Fixture::new();
    let wait = fixture
        .sequencer()
        .await_transition_end(&ClassList::parse("fade"))
        .expect("wait");
    assert_eq!(fixture.tree.listener_count(fixture.element), 1);

    let outcome = fixture.spawn_wait(wait);
    assert_eq!(outcome.get(), None);

    fixture
        .tree
        .dispatch_transition_end(fixture.element)
        .expect("dispatch");
    assert_eq!(fixture.tree.listener_count(fixture.element), 0);
    fixture.runtime.handle().drain_ui();
    assert_eq!(outcome.get(), Some(TransitionEndOutcome::Completed));

    // A second signal has nobody left to notify.
    let invoked = fixture
        .tree
        .dispatch_transition_end(fixture.element)
        .expect("dispatch");
    assert_eq!(invoked, 0);
}

#[test]
fn signal_does_not_reach_ancestor_listeners() {
    let fixture = Fixture::new();
    let parent_hits = Rc::new(Cell::new(0));
    {
        let parent_hits = Rc::clone(&parent_hits);
        fixture
            .tree
            .add_transition_end_listener(fixture.parent, move |_| {
                parent_hits.set(parent_hits.get() + 1);
                Propagation::Continue
            })
            .expect("listener");
    }
    let wait = fixture
        .sequencer()
        .await_transition_end(&ClassList::parse("fade"))
        .expect("wait");
    let outcome = fixture.spawn_wait(wait);

    fixture
        .tree
        .dispatch_transition_end(fixture.element)
        .expect("dispatch");
    assert_eq!(parent_hits.get(), 0);

    // Once the wait is gone the signal bubbles normally.
    fixture
        .tree
        .dispatch_transition_end(fixture.element)
        .expect("dispatch");
    assert_eq!(parent_hits.get(), 1);
    fixture.runtime.handle().drain_ui();
    assert_eq!(outcome.get(), Some(TransitionEndOutcome::Completed));
}

#[test]
fn timeout_forces_resolution_after_frame_time() {
    let fixture = Fixture::new();
    let wait = fixture
        .sequencer()
        .with_timeout(Some(Duration::from_millis(50)))
        .await_transition_end(&ClassList::parse("fade"))
        .expect("wait");
    let outcome = fixture.spawn_wait(wait);
    let handle = fixture.runtime.handle();

    for frame in [1_000_000u64, 20_000_000, 40_000_000] {
        handle.drain_frame_callbacks(frame);
        handle.drain_ui();
        assert_eq!(outcome.get(), None, "still waiting at {frame}ns");
    }

    handle.drain_frame_callbacks(51_000_000);
    handle.drain_ui();
    assert_eq!(outcome.get(), Some(TransitionEndOutcome::TimedOut));
    assert_eq!(fixture.tree.listener_count(fixture.element), 0);
    assert!(!handle.has_frame_callbacks());
}

#[test]
fn completion_before_timeout_cancels_the_check() {
    let fixture = Fixture::new();
    let wait = fixture
        .sequencer()
        .with_timeout(Some(Duration::from_millis(50)))
        .await_transition_end(&ClassList::parse("fade"))
        .expect("wait");
    let outcome = fixture.spawn_wait(wait);
    let handle = fixture.runtime.handle();
    assert!(handle.has_frame_callbacks());

    fixture
        .tree
        .dispatch_transition_end(fixture.element)
        .expect("dispatch");
    handle.drain_ui();
    assert_eq!(outcome.get(), Some(TransitionEndOutcome::Completed));
    assert!(!handle.has_frame_callbacks());
}

#[test]
fn dropping_the_wait_releases_the_listener() {
    let fixture = Fixture::new();
    let wait = fixture
        .sequencer()
        .await_transition_end(&ClassList::parse("fade"))
        .expect("wait");
    assert_eq!(fixture.tree.listener_count(fixture.element), 1);
    drop(wait);
    assert_eq!(fixture.tree.listener_count(fixture.element), 0);
}

#[test]
fn missing_element_is_reported() {
    let fixture = Fixture::new();
    fixture.tree.remove(fixture.element).expect("remove");
    let err = fixture
        .sequencer()
        .add_classes(&ClassList::parse("fade"))
        .unwrap_err();
    assert_eq!(err, TreeError::Missing { id: fixture.element });
}
