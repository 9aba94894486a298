//! A stand-in for a real style engine.
//!
//! Watches class lists and, like a browser, starts a transition when an
//! element's classes change while a `duration-<ms>` class is present both
//! before and after the change. The transition-end signal is dispatched once
//! that many milliseconds of frame time have passed.

use stagehand_core::{ElementId, RenderTree, TreeError};

const DURATION_PREFIX: &str = "duration-";

struct Watched {
    element: ElementId,
    classes: Vec<String>,
}

pub struct SimulatedRenderer {
    tree: RenderTree,
    watched: Vec<Watched>,
    running: Vec<(ElementId, u64)>,
}

impl SimulatedRenderer {
    pub fn new(tree: RenderTree) -> Self {
        Self {
            tree,
            watched: Vec::new(),
            running: Vec::new(),
        }
    }

    pub fn watch(&mut self, element: ElementId) -> Result<(), TreeError> {
        let classes = self.tree.classes(element)?;
        self.watched.push(Watched { element, classes });
        Ok(())
    }

    /// Recalculates styles at `now` and fires every transition that ended.
    pub fn on_frame(&mut self, now: u64) -> Result<(), TreeError> {
        for watched in &mut self.watched {
            if !self.tree.contains(watched.element) {
                continue;
            }
            let classes = self.tree.classes(watched.element)?;
            if classes == watched.classes {
                continue;
            }
            let before = duration_ms(&watched.classes);
            let after = duration_ms(&classes);
            if let (Some(_), Some(duration)) = (before, after) {
                let due = now + duration * 1_000_000;
                log::trace!("element {}: transition until {due}ns", watched.element);
                self.running.retain(|(element, _)| *element != watched.element);
                self.running.push((watched.element, due));
            }
            watched.classes = classes;
        }

        let (ended, running): (Vec<_>, Vec<_>) = self
            .running
            .drain(..)
            .partition(|(_, due)| *due <= now);
        self.running = running;
        for (element, _) in ended {
            if self.tree.contains(element) {
                self.tree.dispatch_transition_end(element)?;
            }
        }
        Ok(())
    }
}

fn duration_ms(classes: &[String]) -> Option<u64> {
    classes
        .iter()
        .find_map(|class| class.strip_prefix(DURATION_PREFIX))
        .and_then(|value| value.parse().ok())
}
