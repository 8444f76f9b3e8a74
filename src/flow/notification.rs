use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CurveSide, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failure,
}

impl NotificationKind {
    pub fn emoji(&self, curve: CurveSide) -> &'static str {
        match (self, curve) {
            (NotificationKind::Success, CurveSide::LeftCurve) => "\u{1f680}", // rocket
            (NotificationKind::Success, CurveSide::RightCurve) => "\u{1f634}", // sleeping face
            (NotificationKind::Failure, _) => "\u{1f480}",                    // skull
        }
    }

    pub fn title(&self, curve: CurveSide) -> &'static str {
        match (self, curve) {
            (NotificationKind::Success, CurveSide::LeftCurve) => "WAGMI DETECTED",
            (NotificationKind::Success, CurveSide::RightCurve) => "NGMI MOMENT",
            (NotificationKind::Failure, _) => "RUGGED SER",
        }
    }
}

/// Payload handed to a [`Notifier`](super::Notifier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub icon: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    /// Classified error for failures
    pub error: Option<ErrorKind>,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn success(curve: CurveSide, message: impl Into<String>) -> Self {
        Self::build(NotificationKind::Success, curve, message.into(), None)
    }

    pub fn failure(curve: CurveSide, error: ErrorKind) -> Self {
        let message = error.to_string();
        Self::build(NotificationKind::Failure, curve, message, Some(error))
    }

    fn build(
        kind: NotificationKind,
        curve: CurveSide,
        message: String,
        error: Option<ErrorKind>,
    ) -> Self {
        Self {
            kind,
            icon: kind.emoji(curve).to_string(),
            title: kind.title(curve).to_string(),
            message,
            link: None,
            error,
            timestamp: Utc::now(),
        }
    }

    /// Add a link to the notification
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    pub fn is_success(&self) -> bool {
        self.kind == NotificationKind::Success
    }

    /// Single-line text rendering for plain-text sinks
    pub fn format_text(&self) -> String {
        let mut text = format!("{} {}: {}", self.icon, self.title, self.message);
        if let Some(link) = &self.link {
            text.push_str(" (");
            text.push_str(link);
            text.push(')');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_title_follows_curve() {
        let left = Notification::success(CurveSide::LeftCurve, "Bought");
        let right = Notification::success(CurveSide::RightCurve, "Bought");
        assert_eq!(left.title, "WAGMI DETECTED");
        assert_eq!(right.title, "NGMI MOMENT");
        assert!(left.is_success());
    }

    #[test]
    fn test_failure_carries_error() {
        let n = Notification::failure(CurveSide::RightCurve, ErrorKind::Rejected);
        assert_eq!(n.title, "RUGGED SER");
        assert_eq!(n.message, "Transaction rejected");
        assert_eq!(n.error, Some(ErrorKind::Rejected));
    }

    #[test]
    fn test_format_text_with_link() {
        let n = Notification::success(CurveSide::LeftCurve, "Sold 1 DEGEN")
            .with_link(Some("https://explorer/tx/0x1".to_string()));
        let text = n.format_text();
        assert!(text.contains("WAGMI DETECTED: Sold 1 DEGEN"));
        assert!(text.ends_with("(https://explorer/tx/0x1)"));
    }
}
