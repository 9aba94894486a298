use super::*;
use stagehand_core::{DefaultScheduler, RenderTree, Runtime};
use std::sync::Arc;

struct Fixture {
    runtime: Runtime,
    host: TransitionHost,
    root: ElementId,
}

fn fixture() -> Fixture {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let tree = RenderTree::new();
    let root = tree.create("body");
    let host = TransitionHost::new(runtime.handle(), tree);
    Fixture {
        runtime,
        host,
        root,
    }
}

impl Fixture {
    fn node(
        &self,
        parent: ElementId,
        props: TransitionProps,
        coordinator: Option<Rc<dyn Coordinator>>,
    ) -> TransitionNode {
        let content = self.host.tree.create("div");
        TransitionNode::new(&self.host, parent, content, props, coordinator).expect("node")
    }

    fn pump(&self) {
        self.runtime.handle().drain_ui();
    }
}

#[test]
fn animating_states() {
    assert!(TransitionState::Entering.is_animating());
    assert!(TransitionState::Leaving.is_animating());
    assert!(!TransitionState::Shown.is_animating());
    assert!(!TransitionState::Unmounted.is_animating());
}

#[test]
fn wrapper_sits_between_parent_and_content() {
    let fixture = fixture();
    let node = fixture.node(fixture.root, TransitionProps::new().shown(true), None);
    let tree = &fixture.host.tree;
    assert_eq!(tree.parent(node.wrapper()).expect("wrapper"), Some(fixture.root));
    assert_eq!(tree.children(node.wrapper()).expect("wrapper"), vec![node.content()]);
    assert_eq!(tree.display(node.wrapper()).expect("wrapper"), Display::Contents);
}

#[test]
fn driver_task_exists_only_while_work_is_queued() {
    let fixture = fixture();
    let node = fixture.node(fixture.root, TransitionProps::new().shown(false), None);
    assert_eq!(fixture.runtime.handle().task_count(), 0);

    node.set_shown(true);
    assert!(!node.is_settled());
    assert_eq!(fixture.runtime.handle().task_count(), 1);
    fixture.pump();
    assert!(node.is_settled());
    assert_eq!(fixture.runtime.handle().task_count(), 0);
    assert!(node.is_shown());
}

#[test]
fn listener_may_requeue_from_inside_an_activation() {
    let fixture = fixture();
    let node = Rc::new(fixture.node(fixture.root, TransitionProps::new().shown(false), None));
    let weak = Rc::downgrade(&node);
    let _bounce = node.on_event(move |event| {
        if event == TransitionEvent::AfterEnter {
            if let Some(node) = weak.upgrade() {
                node.set_shown(false);
            }
        }
    });

    node.set_shown(true);
    fixture.pump();
    assert_eq!(node.state(), TransitionState::Hidden);
    assert!(node.is_settled());
}

#[test]
fn unsubscribed_listener_stops_receiving_events() {
    let fixture = fixture();
    let node = fixture.node(fixture.root, TransitionProps::new().shown(false), None);
    let seen = Rc::new(Cell::new(0));
    let subscription = {
        let seen = Rc::clone(&seen);
        node.on_event(move |_| seen.set(seen.get() + 1))
    };
    node.set_shown(true);
    fixture.pump();
    assert_eq!(seen.get(), 2);

    subscription.unsubscribe();
    node.set_shown(false);
    fixture.pump();
    assert_eq!(seen.get(), 2);
}

#[test]
fn dropping_a_child_leaves_the_parent_context() {
    let fixture = fixture();
    let parent = fixture.node(fixture.root, TransitionProps::new().shown(true), None);
    let child = fixture.node(parent.content(), TransitionProps::new(), Some(parent.coordinator()));
    assert_eq!(parent.child_count(), 1);
    let child_wrapper = child.wrapper();
    drop(child);
    assert_eq!(parent.child_count(), 0);
    assert!(!fixture.host.tree.contains(child_wrapper));
    assert!(fixture.host.tree.children(parent.content()).expect("content").is_empty());
}

#[test]
fn explicit_shown_ignores_a_supplied_coordinator() {
    let fixture = fixture();
    let parent = fixture.node(fixture.root, TransitionProps::new().shown(true), None);
    let node = fixture.node(
        parent.content(),
        TransitionProps::new().shown(false),
        Some(parent.coordinator()),
    );
    assert!(!node.is_descendant());
    assert_eq!(parent.child_count(), 0);
    assert_eq!(node.state(), TransitionState::Hidden);
}

#[test]
fn appearing_node_leaves_its_show_value_undecided_until_the_enter() {
    let fixture = fixture();
    let node = fixture.node(
        fixture.root,
        TransitionProps::new().shown(true).appear(true),
        None,
    );
    let child = fixture.node(node.content(), TransitionProps::new(), Some(node.coordinator()));
    assert_eq!(node.coordinator().current_show(), None);
    assert_eq!(child.state(), TransitionState::Hidden);

    fixture.pump();
    assert_eq!(node.coordinator().current_show(), Some(true));
    assert_eq!(node.state(), TransitionState::Shown);
    assert_eq!(child.state(), TransitionState::Shown);
    assert!(child.is_settled());
}
