use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// Default lifetime of a notification.
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(4);

/// Upper bound on queued notifications; older ones are dropped first.
const MAX_QUEUED: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Transient message shown after save / delete attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365));
        now.signed_duration_since(self.created_at) >= ttl
    }
}

#[derive(Debug, Clone)]
pub struct Notifications {
    items: VecDeque<Notification>,
    ttl: Duration,
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.push_at(level, message, Utc::now());
    }

    pub fn push_at(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) {
        if self.items.len() == MAX_QUEUED {
            self.items.pop_front();
        }
        self.items.push_back(Notification {
            level,
            message: message.into(),
            created_at,
        });
    }

    /// Drops expired notifications and returns the ones still visible.
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        let ttl = self.ttl;
        self.items.retain(|n| !n.is_expired(now, ttl));
        self.items.iter().cloned().collect()
    }

    /// Most recent notification regardless of expiry.
    pub fn latest(&self) -> Option<&Notification> {
        self.items.back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_expire_after_ttl() {
        let mut notes = Notifications::new(Duration::from_secs(4));
        let start = Utc::now();
        notes.push_at(NotificationLevel::Success, "Saved", start);
        notes.push_at(
            NotificationLevel::Info,
            "Nothing to save",
            start + chrono::Duration::seconds(3),
        );

        assert_eq!(notes.active(start + chrono::Duration::seconds(2)).len(), 2);
        let left = notes.active(start + chrono::Duration::seconds(5));
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].message, "Nothing to save");
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut notes = Notifications::default();
        for i in 0..(MAX_QUEUED + 5) {
            notes.push(NotificationLevel::Info, format!("note {i}"));
        }
        let now = Utc::now();
        let active = notes.active(now);
        assert_eq!(active.len(), MAX_QUEUED);
        assert_eq!(active[0].message, "note 5");
    }
}
