use std::time::Duration;

/// Inputs of a [`TransitionNode`](crate::TransitionNode).
///
/// Built with chained setters:
///
/// ```
/// use stagehand_transition::TransitionProps;
///
/// let props = TransitionProps::new()
///     .shown(false)
///     .unmount(true)
///     .enter("transition-opacity duration-300")
///     .enter_from("opacity-0")
///     .enter_to("opacity-100");
/// assert_eq!(props.leave, None);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionProps {
    /// `None` puts the node in descendant mode: its state follows the
    /// coordinator it was constructed with.
    pub shown: Option<bool>,
    /// Animate the very first activation.
    pub appear: bool,
    /// Detach the content element while hidden instead of hiding the wrapper.
    pub unmount: bool,
    pub enter: String,
    pub enter_from: String,
    pub enter_to: String,
    /// `None` means unset and derives from the enter side.
    pub leave: Option<String>,
    pub leave_from: Option<String>,
    pub leave_to: Option<String>,
    /// Forces a transition-end wait to resolve after this much frame time.
    pub transition_timeout: Option<Duration>,
}

impl TransitionProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(mut self, shown: bool) -> Self {
        self.shown = Some(shown);
        self
    }

    pub fn appear(mut self, appear: bool) -> Self {
        self.appear = appear;
        self
    }

    pub fn unmount(mut self, unmount: bool) -> Self {
        self.unmount = unmount;
        self
    }

    pub fn enter(mut self, classes: &str) -> Self {
        self.enter = classes.to_owned();
        self
    }

    pub fn enter_from(mut self, classes: &str) -> Self {
        self.enter_from = classes.to_owned();
        self
    }

    pub fn enter_to(mut self, classes: &str) -> Self {
        self.enter_to = classes.to_owned();
        self
    }

    pub fn leave(mut self, classes: &str) -> Self {
        self.leave = Some(classes.to_owned());
        self
    }

    pub fn leave_from(mut self, classes: &str) -> Self {
        self.leave_from = Some(classes.to_owned());
        self
    }

    pub fn leave_to(mut self, classes: &str) -> Self {
        self.leave_to = Some(classes.to_owned());
        self
    }

    pub fn transition_timeout(mut self, timeout: Duration) -> Self {
        self.transition_timeout = Some(timeout);
        self
    }
}
