//! Controller configuration.

/// Configuration for the [`crate::App`] state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Attribution for locally sent lines. `None` uses the display name.
    pub self_label: Option<String>,
}

impl AppConfig {
    /// Configuration with a fixed attribution for locally sent lines.
    pub fn with_self_label(label: impl Into<String>) -> Self {
        Self { self_label: Some(label.into()) }
    }
}
