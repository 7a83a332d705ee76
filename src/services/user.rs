//! User service
//!
//! Registration, login and logout, session validation, superuser creation
//! and expired-session cleanup. Self-registered accounts are always readers;
//! staff accounts come from `create_superuser` (the `create-superuser` binary).

use crate::db::repositories::{is_unique_violation, SessionRepository, UserRepository};
use crate::models::{CreateUserInput, ListParams, PagedResult, Session, User};
use crate::services::password::{hash_password, validate_password, verify_password};
use anyhow::Context;
use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 14;

/// Maximum username length, in characters
const USERNAME_MAX_LEN: usize = 150;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials or inactive account
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a reader account. Staff flags in `input` are ignored.
    pub async fn register(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.create_user(CreateUserInput {
            is_staff: false,
            is_superuser: false,
            ..input
        })
        .await
    }

    /// Create a staff superuser regardless of existing accounts
    pub async fn create_superuser(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        self.create_user(input.superuser()).await
    }

    async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        validate_username(&username)?;
        if !email.is_empty() && !email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        validate_password(&input.password).map_err(UserServiceError::ValidationError)?;

        if self
            .user_repo
            .get_by_username(&username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                username
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let mut user = User::new(username, email, password_hash);
        user.is_staff = input.is_staff;
        user.is_superuser = input.is_superuser;

        let created = match self.user_repo.create(&user).await {
            Ok(created) => created,
            Err(e) if is_unique_violation(&e) => {
                return Err(UserServiceError::UserExists(format!(
                    "Username '{}' is already taken",
                    user.username
                )))
            }
            Err(e) => return Err(e.context("Failed to create user").into()),
        };

        tracing::info!(
            "Created user {} ({}), staff: {}",
            created.username,
            created.id,
            created.is_staff
        );
        Ok(created)
    }

    /// Check credentials and open a session. `login` is a username or email.
    pub async fn login(&self, login: &str, password: &str) -> Result<(Session, User), UserServiceError> {
        let invalid = || UserServiceError::AuthenticationError("Invalid username or password".to_string());

        let user = self
            .find_user_by_username_or_email(login.trim())
            .await?
            .ok_or_else(invalid)?;

        let valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            tracing::debug!("Failed login for {}", user.username);
            return Err(invalid());
        }

        if !user.is_active {
            return Err(UserServiceError::AuthenticationError(
                "This account is inactive".to_string(),
            ));
        }

        let session = Session::new(
            Uuid::new_v4().to_string(),
            user.id,
            Duration::days(self.session_expiration_days),
        );
        let session = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok((session, user))
    }

    /// Invalidate a session token
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// User behind a live session token. Expired sessions are deleted and
    /// inactive users are rejected.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user.filter(|u| u.is_active))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")
            .map_err(Into::into)
    }

    pub async fn count(&self) -> Result<i64, UserServiceError> {
        self.user_repo
            .count()
            .await
            .context("Failed to count users")
            .map_err(Into::into)
    }

    /// Users by username, optionally filtered on the staff flag
    pub async fn list(
        &self,
        staff: Option<bool>,
        params: &ListParams,
    ) -> Result<PagedResult<User>, UserServiceError> {
        let (users, total) = self
            .user_repo
            .list(staff, params.page as i64, params.per_page as i64)
            .await
            .context("Failed to list users")?;
        Ok(PagedResult::new(users, total, params))
    }

    /// Remove expired sessions, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        if removed > 0 {
            tracing::info!("Removed {} expired session(s)", removed);
        }
        Ok(removed)
    }

    async fn find_user_by_username_or_email(&self, login: &str) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(login)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }
        if !login.contains('@') {
            return Ok(None);
        }
        self.user_repo
            .get_by_email(login)
            .await
            .context("Failed to get user by email")
            .map_err(Into::into)
    }
}

fn validate_username(username: &str) -> Result<(), UserServiceError> {
    if username.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(UserServiceError::ValidationError(format!(
            "Username must be at most {} characters",
            USERNAME_MAX_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(UserServiceError::ValidationError(
            "Username may contain only letters, digits and @/./+/-/_".to_string(),
        ));
    }
    Ok(())
}
