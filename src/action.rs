use crate::app::Mode;

/// User actions that can be triggered by commands or UI events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Switch the active conversation mode
    SwitchMode(Mode),
    /// Acquire a location: None = auto-detect, Some = manual address lookup
    Locate { query: Option<String> },
    /// Set the nearby-search distance range in km
    SetRange { min: u32, max: u32 },
    /// Show (None) or set (Some) the persisted API key
    ApiKey { value: Option<String> },
    /// Clear the chat
    ClearChat,
    /// Show help message
    Help,
    /// Quit application
    Quit,
}
