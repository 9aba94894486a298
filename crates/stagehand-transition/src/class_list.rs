//! Class-name sets and the enter/leave derivation rules.

use std::fmt;

use smallvec::SmallVec;

use crate::props::TransitionProps;

/// Ordered, duplicate-free set of class names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassList {
    names: SmallVec<[String; 4]>,
}

impl ClassList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a space-separated class string. Extra whitespace and repeated
    /// names are ignored.
    pub fn parse(source: &str) -> Self {
        let mut list = Self::new();
        for name in source.split_whitespace() {
            list.insert(name);
        }
        list
    }

    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_owned());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|entry| entry == name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    pub fn union(&self, other: &ClassList) -> ClassList {
        let mut merged = self.clone();
        for name in other.iter() {
            merged.insert(name);
        }
        merged
    }
}

impl From<&str> for ClassList {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names.join(" "))
    }
}

/// The three class sets driving one direction of a transition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhaseClasses {
    /// Present for the whole activation; carries the transition properties.
    pub base: ClassList,
    /// Starting style, removed after the first commit.
    pub from: ClassList,
    /// Target style, applied once `from` has been committed.
    pub to: ClassList,
}

impl PhaseClasses {
    pub fn new(base: ClassList, from: ClassList, to: ClassList) -> Self {
        Self { base, from, to }
    }

    /// True when the phase would not touch the class list at all.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.from.is_empty() && self.to.is_empty()
    }
}

/// Resolved enter and leave class sets for a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransitionClasses {
    pub enter: PhaseClasses,
    pub leave: PhaseClasses,
}

impl TransitionClasses {
    /// Resolves the class sets from props.
    ///
    /// Unset leave fields mirror enter: `leave` defaults to `enter`,
    /// `leave_from` to `enter_to` and `leave_to` to `enter_from`. Each field
    /// defaults independently, and an explicitly empty string counts as set.
    pub fn derive(props: &TransitionProps) -> Self {
        let enter = PhaseClasses::new(
            ClassList::parse(&props.enter),
            ClassList::parse(&props.enter_from),
            ClassList::parse(&props.enter_to),
        );
        let or_default = |value: &Option<String>, fallback: &ClassList| {
            value
                .as_deref()
                .map(ClassList::parse)
                .unwrap_or_else(|| fallback.clone())
        };
        let leave = PhaseClasses::new(
            or_default(&props.leave, &enter.base),
            or_default(&props.leave_from, &enter.to),
            or_default(&props.leave_to, &enter.from),
        );
        Self { enter, leave }
    }
}

#[cfg(test)]
#[path = "tests/class_list_tests.rs"]
mod tests;
