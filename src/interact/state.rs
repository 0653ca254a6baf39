/// Pointer/navigation lifecycle of one rendered district.
///
/// `Idle ⇄ Hovering` on pointer enter/leave; `click` moves to `Clicked`
/// and, after the navigation delay, to `Navigating`. Clicks during
/// `Clicked` or `Navigating` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Hovering,
    Clicked,
    Navigating,
}

impl InteractionState {
    pub fn to_str(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Hovering => "hovering",
            InteractionState::Clicked => "clicked",
            InteractionState::Navigating => "navigating",
        }
    }

    /// Hover styling and tooltips are suppressed once a click landed.
    pub fn accepts_hover(&self) -> bool {
        matches!(self, InteractionState::Idle | InteractionState::Hovering)
    }
}
