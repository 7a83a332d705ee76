//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Login session, identified by an opaque token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session token
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session for `user_id` that lives for `lifetime`.
    pub fn new(id: String, user_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}
