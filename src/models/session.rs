use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a user session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The ID of the user this session belongs to.
    pub user_id: Uuid,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Starts a session for `user_id` lasting `duration_days`.
    pub fn start(user_id: Uuid, duration_days: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            created_at: now,
            expires_at: now + chrono::Duration::days(duration_days),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
