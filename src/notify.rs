//! Transient toast notifications.
//!
//! Nothing here is persisted: a notification lives until its duration elapses
//! or it is dismissed, and expired entries are pruned whenever the center is read.

use std::time::{Duration, Instant};

use nanoid::nanoid;

use crate::render::escape_html;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            NotificationKind::Success => "fas fa-check-circle",
            NotificationKind::Error => "fas fa-exclamation-triangle",
            NotificationKind::Warning => "fas fa-exclamation-circle",
            NotificationKind::Info => "fas fa-info-circle",
        }
    }

    /// Bootstrap alert class. There is no `alert-error`.
    fn alert_class(self) -> &'static str {
        match self {
            NotificationKind::Error => "danger",
            other => other.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub duration: Duration,
    pub created_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Notification {
        Notification {
            id: nanoid!(10),
            message: message.into(),
            kind,
            duration: DEFAULT_DURATION,
            created_at: Instant::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Notification {
        Self::new(message, NotificationKind::Success)
    }

    pub fn error(message: impl Into<String>) -> Notification {
        Self::new(message, NotificationKind::Error)
    }

    pub fn warning(message: impl Into<String>) -> Notification {
        Self::new(message, NotificationKind::Warning)
    }

    pub fn info(message: impl Into<String>) -> Notification {
        Self::new(message, NotificationKind::Info)
    }

    pub fn with_duration(mut self, duration: Duration) -> Notification {
        self.duration = duration;
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.duration
    }

    pub fn render(&self) -> String {
        format!(
            r#"<div class="notification alert alert-{class} alert-dismissible fade show" id="toast-{id}" role="alert"><i class="{icon}"></i> {message}<button type="button" class="btn-close" data-bs-dismiss="alert"></button></div>"#,
            class = self.kind.alert_class(),
            id = self.id,
            icon = self.kind.icon(),
            message = escape_html(&self.message),
        )
    }
}

#[derive(Debug, Default)]
pub struct NotificationCenter {
    active: Vec<Notification>,
    /// Every notification ever pushed, in order. Used by the CLI summary and tests.
    log: Vec<(NotificationKind, String)>,
}

impl NotificationCenter {
    pub fn new() -> NotificationCenter {
        NotificationCenter::default()
    }

    pub fn push(&mut self, notification: Notification) {
        log::debug!(
            "notification [{}] {}",
            notification.kind.as_str(),
            notification.message
        );
        self.log
            .push((notification.kind, notification.message.clone()));
        self.active.push(notification);
    }

    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        self.active.len() != before
    }

    pub fn prune(&mut self, now: Instant) {
        self.active.retain(|n| !n.is_expired(now));
    }

    pub fn active(&mut self) -> &[Notification] {
        self.prune(Instant::now());
        &self.active
    }

    pub fn history(&self) -> &[(NotificationKind, String)] {
        &self.log
    }

    pub fn render(&mut self) -> String {
        self.active()
            .iter()
            .map(Notification::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_notifications_are_pruned() {
        let mut center = NotificationCenter::new();
        center.push(Notification::info("short").with_duration(Duration::from_millis(10)));
        center.push(Notification::info("long").with_duration(Duration::from_secs(60)));

        center.prune(Instant::now() + Duration::from_millis(20));

        assert_eq!(center.active.len(), 1);
        assert_eq!(center.active[0].message, "long");
        assert_eq!(center.history().len(), 2);
    }

    #[test]
    fn error_kind_uses_danger_alert_and_escapes_message() {
        let html = Notification::error("<script>").render();
        assert!(html.contains("alert-danger"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn dismiss_removes_by_id() {
        let mut center = NotificationCenter::new();
        let n = Notification::warning("bye");
        let id = n.id.clone();
        center.push(n);
        assert!(center.dismiss(&id));
        assert!(!center.dismiss(&id));
    }
}
