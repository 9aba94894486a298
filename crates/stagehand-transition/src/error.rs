use std::fmt;

use stagehand_core::{ElementId, TreeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    Tree(TreeError),
    /// The content element already has a parent.
    ContentAlreadyWrapped { id: ElementId },
    /// `shown` was left unset but no coordinator was supplied.
    MissingCoordinator,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::Tree(err) => write!(f, "render tree: {err}"),
            TransitionError::ContentAlreadyWrapped { id } => {
                write!(f, "content element {id} is already attached elsewhere")
            }
            TransitionError::MissingCoordinator => {
                write!(f, "descendant transition requires an ancestor coordinator")
            }
        }
    }
}

impl std::error::Error for TransitionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransitionError::Tree(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeError> for TransitionError {
    fn from(err: TreeError) -> Self {
        TransitionError::Tree(err)
    }
}
