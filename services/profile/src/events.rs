//! UI notifications emitted by the profile editor

use serde::Serialize;

/// Name of the event fired after a successful save
pub const UPDATED_EVENT: &str = "updated";
/// Name of the event carrying a user-facing dialog
pub const DIALOG_EVENT: &str = "dialog";

/// Severity of a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogType {
    Success,
    Info,
    Warning,
    Error,
}

/// Dialog payload consumed by the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dialog {
    #[serde(rename = "type")]
    pub kind: DialogType,
    pub title: String,
    pub description: String,
}

impl Dialog {
    /// The dialog shown after a completed task
    pub fn task_completed() -> Self {
        Self {
            kind: DialogType::Success,
            title: "Done!".to_string(),
            description: "Task completed successfully.".to_string(),
        }
    }
}

/// Fire-and-forget UI event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "params", rename_all = "lowercase")]
pub enum UiEvent {
    Updated,
    Dialog(Dialog),
}

impl UiEvent {
    /// Event name as dispatched to the UI
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Updated => UPDATED_EVENT,
            UiEvent::Dialog(_) => DIALOG_EVENT,
        }
    }
}
