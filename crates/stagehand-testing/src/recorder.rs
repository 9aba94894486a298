use std::cell::RefCell;
use std::rc::Rc;

use stagehand_core::Subscription;
use stagehand_transition::{TransitionEvent, TransitionNode};

/// Collects lifecycle events from any number of nodes into one ordered log.
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<(String, TransitionEvent)>>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every event `node` emits under `label`.
    pub fn attach(&self, label: &str, node: &TransitionNode) -> Subscription {
        let events = Rc::clone(&self.events);
        let label = label.to_owned();
        node.on_event(move |event| events.borrow_mut().push((label.clone(), event)))
    }

    pub fn events(&self) -> Vec<(String, TransitionEvent)> {
        self.events.borrow().clone()
    }

    /// Events recorded for one label, in order.
    pub fn events_for(&self, label: &str) -> Vec<TransitionEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|(entry, _)| entry == label)
            .map(|(_, event)| *event)
            .collect()
    }

    /// `"label:Event"` strings, handy for asserting cross-node order.
    pub fn trace(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|(label, event)| format!("{label}:{event:?}"))
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl std::fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecorder")
            .field("events", &self.events.borrow().len())
            .finish()
    }
}
