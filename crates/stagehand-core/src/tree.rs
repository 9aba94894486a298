//! In-memory render tree.
//!
//! Elements carry an ordered class list, a display mode and transition-end
//! listeners. The tree models exactly the host surface transitions need:
//! class mutation, mounting and unmounting, and bubbling of the native
//! transition-completion signal.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::collections::map::HashMap;

pub type ElementId = usize;
pub type ListenerId = u64;

/// Layout mode of an element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Display {
    /// Generates its own box.
    #[default]
    Block,
    /// Generates no box; children lay out as if the element were absent.
    Contents,
    /// Not rendered at all.
    None,
}

/// Returned by transition-end listeners to control bubbling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

/// A native transition-completion signal travelling through the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionEndEvent {
    /// Element whose transition finished.
    pub target: ElementId,
    /// Element whose listeners are currently running.
    pub current: ElementId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    Missing { id: ElementId },
    AlreadyAttached { id: ElementId, parent: ElementId },
    Cycle { id: ElementId },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Missing { id } => write!(f, "element {id} missing"),
            TreeError::AlreadyAttached { id, parent } => {
                write!(f, "element {id} already attached to {parent}")
            }
            TreeError::Cycle { id } => {
                write!(f, "attaching element {id} would create a cycle")
            }
        }
    }
}

impl std::error::Error for TreeError {}

type TransitionEndListener = Rc<dyn Fn(&TransitionEndEvent) -> Propagation + 'static>;

struct Element {
    tag: String,
    classes: SmallVec<[String; 4]>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    display: Display,
    listeners: SmallVec<[ListenerId; 2]>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            classes: SmallVec::new(),
            parent: None,
            children: Vec::new(),
            display: Display::default(),
            listeners: SmallVec::new(),
        }
    }
}

#[derive(Default)]
struct TreeInner {
    elements: Vec<Option<Element>>,
    listeners: HashMap<ListenerId, TransitionEndListener>,
    next_listener_id: ListenerId,
}

impl TreeInner {
    fn get(&self, id: ElementId) -> Result<&Element, TreeError> {
        self.elements
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(TreeError::Missing { id })
    }

    fn get_mut(&mut self, id: ElementId) -> Result<&mut Element, TreeError> {
        self.elements
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(TreeError::Missing { id })
    }

    fn is_descendant(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut cursor = self.get(id).ok().and_then(|element| element.parent);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).ok().and_then(|element| element.parent);
        }
        false
    }

    fn detach(&mut self, id: ElementId) -> Result<(), TreeError> {
        let parent = self.get_mut(id)?.parent.take();
        if let Some(parent) = parent {
            if let Ok(parent) = self.get_mut(parent) {
                parent.children.retain(|child| *child != id);
            }
        }
        Ok(())
    }

    fn remove_subtree(&mut self, id: ElementId) {
        let Some(element) = self.elements.get_mut(id).and_then(Option::take) else {
            return;
        };
        for listener in element.listeners {
            self.listeners.remove(&listener);
        }
        for child in element.children {
            self.remove_subtree(child);
        }
    }
}

/// Shared handle to a render tree.
#[derive(Clone, Default)]
pub struct RenderTree {
    inner: Rc<RefCell<TreeInner>>,
}

impl RenderTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, tag: &str) -> ElementId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.elements.len();
        inner.elements.push(Some(Element::new(tag)));
        id
    }

    pub fn len(&self) -> usize {
        self.inner
            .borrow()
            .elements
            .iter()
            .filter(|element| element.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.inner.borrow().get(id).is_ok()
    }

    pub fn tag(&self, id: ElementId) -> Result<String, TreeError> {
        Ok(self.inner.borrow().get(id)?.tag.clone())
    }

    pub fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        let mut inner = self.inner.borrow_mut();
        inner.get(parent)?;
        if let Some(current) = inner.get(child)?.parent {
            return Err(TreeError::AlreadyAttached { id: child, parent: current });
        }
        if parent == child || inner.is_descendant(parent, child) {
            return Err(TreeError::Cycle { id: child });
        }
        inner.get_mut(child)?.parent = Some(parent);
        inner.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Unlinks `id` from its parent. The element and its subtree stay alive.
    pub fn detach(&self, id: ElementId) -> Result<(), TreeError> {
        self.inner.borrow_mut().detach(id)
    }

    /// Removes `id` and its whole subtree, including their listeners.
    pub fn remove(&self, id: ElementId) -> Result<(), TreeError> {
        let mut inner = self.inner.borrow_mut();
        inner.detach(id)?;
        inner.remove_subtree(id);
        Ok(())
    }

    pub fn parent(&self, id: ElementId) -> Result<Option<ElementId>, TreeError> {
        Ok(self.inner.borrow().get(id)?.parent)
    }

    pub fn children(&self, id: ElementId) -> Result<Vec<ElementId>, TreeError> {
        Ok(self.inner.borrow().get(id)?.children.clone())
    }

    /// Whether `id` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, id: ElementId, ancestor: ElementId) -> bool {
        self.inner.borrow().is_descendant(id, ancestor)
    }

    pub fn classes(&self, id: ElementId) -> Result<Vec<String>, TreeError> {
        Ok(self.inner.borrow().get(id)?.classes.to_vec())
    }

    pub fn has_class(&self, id: ElementId, name: &str) -> bool {
        self.inner
            .borrow()
            .get(id)
            .map(|element| element.classes.iter().any(|class| class == name))
            .unwrap_or(false)
    }

    /// Adds `name` unless present. Returns whether the list changed.
    pub fn add_class(&self, id: ElementId, name: &str) -> Result<bool, TreeError> {
        let mut inner = self.inner.borrow_mut();
        let element = inner.get_mut(id)?;
        if element.classes.iter().any(|class| class == name) {
            return Ok(false);
        }
        element.classes.push(name.to_owned());
        Ok(true)
    }

    /// Removes `name` if present. Returns whether the list changed.
    pub fn remove_class(&self, id: ElementId, name: &str) -> Result<bool, TreeError> {
        let mut inner = self.inner.borrow_mut();
        let element = inner.get_mut(id)?;
        let before = element.classes.len();
        element.classes.retain(|class| class != name);
        Ok(element.classes.len() != before)
    }

    pub fn display(&self, id: ElementId) -> Result<Display, TreeError> {
        Ok(self.inner.borrow().get(id)?.display)
    }

    pub fn set_display(&self, id: ElementId, display: Display) -> Result<(), TreeError> {
        self.inner.borrow_mut().get_mut(id)?.display = display;
        Ok(())
    }

    pub fn add_transition_end_listener(
        &self,
        id: ElementId,
        listener: impl Fn(&TransitionEndEvent) -> Propagation + 'static,
    ) -> Result<ListenerId, TreeError> {
        let mut inner = self.inner.borrow_mut();
        inner.get(id)?;
        inner.next_listener_id += 1;
        let listener_id = inner.next_listener_id;
        inner.listeners.insert(listener_id, Rc::new(listener));
        inner.get_mut(id)?.listeners.push(listener_id);
        Ok(listener_id)
    }

    /// Deregisters a listener. Returns `false` if it was already gone.
    pub fn remove_listener(&self, id: ElementId, listener: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if let Ok(element) = inner.get_mut(id) {
            element.listeners.retain(|entry| *entry != listener);
        }
        inner.listeners.remove(&listener).is_some()
    }

    pub fn listener_count(&self, id: ElementId) -> usize {
        self.inner
            .borrow()
            .get(id)
            .map(|element| element.listeners.len())
            .unwrap_or(0)
    }

    /// Delivers a transition-completion signal for `target`, bubbling to the root.
    ///
    /// All listeners on an element run; bubbling stops after that element if
    /// any of them returned [`Propagation::Stop`]. Listeners run without a
    /// tree borrow held. Returns the number of listeners invoked.
    pub fn dispatch_transition_end(&self, target: ElementId) -> Result<usize, TreeError> {
        let path = {
            let inner = self.inner.borrow();
            inner.get(target)?;
            let mut path = vec![target];
            let mut cursor = inner.get(target)?.parent;
            while let Some(current) = cursor {
                path.push(current);
                cursor = inner.get(current).ok().and_then(|element| element.parent);
            }
            path
        };

        let mut invoked = 0;
        for current in path {
            let listeners: SmallVec<[TransitionEndListener; 2]> = {
                let inner = self.inner.borrow();
                let Ok(element) = inner.get(current) else {
                    continue;
                };
                element
                    .listeners
                    .iter()
                    .filter_map(|listener| inner.listeners.get(listener).cloned())
                    .collect()
            };
            let event = TransitionEndEvent { target, current };
            let mut stop = false;
            for listener in listeners {
                invoked += 1;
                if listener(&event) == Propagation::Stop {
                    stop = true;
                }
            }
            if stop {
                log::trace!("transitionend from {target} stopped at {current}");
                break;
            }
        }
        Ok(invoked)
    }

    pub fn dump_tree(&self, root: ElementId) -> String {
        let mut output = String::new();
        self.dump_element(&mut output, root, 0);
        output
    }

    fn dump_element(&self, output: &mut String, id: ElementId, depth: usize) {
        let indent = "  ".repeat(depth);
        let line = {
            let inner = self.inner.borrow();
            match inner.get(id) {
                Ok(element) => {
                    let mut line = format!("{indent}[{id}] <{}>", element.tag);
                    if !element.classes.is_empty() {
                        line.push_str(&format!(" class=\"{}\"", element.classes.join(" ")));
                    }
                    if element.display != Display::Block {
                        line.push_str(&format!(" display={:?}", element.display));
                    }
                    Some((line, element.children.clone()))
                }
                Err(_) => None,
            }
        };
        match line {
            Some((line, children)) => {
                output.push_str(&line);
                output.push('\n');
                for child in children {
                    self.dump_element(output, child, depth + 1);
                }
            }
            None => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }
}

impl fmt::Debug for RenderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RenderTree")
            .field("elements", &inner.elements.iter().flatten().count())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
