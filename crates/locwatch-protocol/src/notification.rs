use std::fmt;

use serde::{Deserialize, Serialize};

/// Intent of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Info => write!(f, "info"),
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Warning => write!(f, "warning"),
        }
    }
}

/// Navigation offered alongside a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAction {
    /// Jump to the code locations overview.
    OpenLocations,
}

impl ViewAction {
    pub fn label(&self) -> &'static str {
        "View"
    }

    pub fn path(&self) -> &'static str {
        match self {
            ViewAction::OpenLocations => "/locations",
        }
    }
}

/// A transient, fire-and-forget message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
    /// Entity the notification is about, when exactly one is involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_action: Option<ViewAction>,
}

impl Notification {
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            subject: None,
            view_action: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, text)
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attach the "View" action unless the user is already on the overview.
    pub fn with_view_action(mut self, already_viewing_overview: bool) -> Self {
        self.view_action = (!already_viewing_overview).then_some(ViewAction::OpenLocations);
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if let Some(action) = self.view_action {
            write!(f, " [{} {}]", action.label(), action.path())?;
        }
        Ok(())
    }
}

/// What the presentation layer shows next to the navigation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusIndicator {
    Spinner { content: String },
    Warning { content: String },
}

impl StatusIndicator {
    pub fn content(&self) -> &str {
        match self {
            StatusIndicator::Spinner { content } | StatusIndicator::Warning { content } => content,
        }
    }
}
