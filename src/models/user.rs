//! User model
//!
//! Users are readers by default. Staff users may write posts and enter the
//! admin area; superusers are staff created through `create-superuser` or as
//! the first registered account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address, may be empty
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Allowed into the admin area and allowed to author posts
    pub is_staff: bool,
    /// Staff account with every permission
    pub is_superuser: bool,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    /// Registration timestamp
    pub date_joined: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, non-staff user. The password must already be hashed.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: now,
            updated_at: now,
        }
    }

    /// Whether the user may be set as a post's author
    pub fn can_author_posts(&self) -> bool {
        self.is_active && self.is_staff
    }

    /// Whether the user may use the admin API
    pub fn can_access_admin(&self) -> bool {
        self.is_active && self.is_staff
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl CreateUserInput {
    /// A regular, non-staff account
    pub fn new(username: String, email: String, password: String) -> Self {
        Self {
            username,
            email,
            password,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Promote the account to a staff superuser
    pub fn superuser(mut self) -> Self {
        self.is_staff = true;
        self.is_superuser = true;
        self
    }
}
