//! User service
//!
//! Sign-up, login/logout, session validation and profile editing.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, UpdateProfileInput, User};
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::services::validation::{
    check_required, is_valid_email, is_valid_username, FieldErrors, MAX_USERNAME_LENGTH,
};
use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Invalid form input
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("User not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Sign-up form
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Login form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    /// Create a new user service with custom session expiration
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

    pub fn session_expiration_days(&self) -> i64 {
        self.session_expiration_days
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` for a malformed or taken username, a malformed
    ///   email, or a short password
    /// - `InternalError` for database errors
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        let mut errors = FieldErrors::new();
        self.validate_username(&mut errors, &input.username, None).await?;
        validate_email(&mut errors, &input.email);
        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    MIN_PASSWORD_LENGTH
                ),
            );
        }
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(
            input.username.trim().to_string(),
            input.email.trim().to_string(),
            password_hash,
        );

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(user_id = created.id, username = %created.username, "User registered");
        Ok(created)
    }

    /// Check credentials and open a session
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if the username is unknown or the password wrong
    /// - `InternalError` for database errors
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let invalid =
            || UserServiceError::AuthenticationError("Invalid username or password".to_string());

        let user = self
            .user_repo
            .get_by_username(input.username.trim())
            .await
            .context("Failed to get user by username")?
            .ok_or_else(invalid)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            return Err(invalid());
        }

        let session = self.start_session(user.id).await?;
        self.user_repo
            .touch_last_login(user.id, session.created_at)
            .await
            .context("Failed to update last login")?;

        Ok(session)
    }

    /// Open a session for an already authenticated user
    pub async fn start_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::new(user_id, self.session_expiration_days);
        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(created)
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// The user owning a live session.
    ///
    /// Unknown tokens give `None`; expired sessions are deleted and also
    /// give `None`.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
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

        Ok(user)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }

    /// Get user by username, failing with `NotFound`
    pub async fn get_by_username(&self, username: &str) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
            .ok_or_else(|| UserServiceError::NotFound(username.to_string()))
    }

    /// Change the username, email and names of `user_id`
    pub async fn update_profile(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(user_id.to_string()))?;

        let mut errors = FieldErrors::new();
        self.validate_username(&mut errors, &input.username, Some(user_id))
            .await?;
        validate_email(&mut errors, &input.email);
        for (field, value) in [("first_name", &input.first_name), ("last_name", &input.last_name)] {
            if value.chars().count() > MAX_USERNAME_LENGTH {
                errors.add(
                    field,
                    format!(
                        "Ensure this value has at most {} characters.",
                        MAX_USERNAME_LENGTH
                    ),
                );
            }
        }
        errors.into_result().map_err(UserServiceError::ValidationError)?;

        user.username = input.username.trim().to_string();
        user.email = input.email.trim().to_string();
        user.first_name = input.first_name.trim().to_string();
        user.last_name = input.last_name.trim().to_string();

        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;
        Ok(updated)
    }

    /// Delete all expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    /// Format and uniqueness of a username. `current_user` may keep its own name.
    async fn validate_username(
        &self,
        errors: &mut FieldErrors,
        username: &str,
        current_user: Option<i64>,
    ) -> Result<(), UserServiceError> {
        let username = username.trim();
        check_required(errors, "username", username, Some(MAX_USERNAME_LENGTH));
        if errors.has("username") {
            return Ok(());
        }
        if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
            return Ok(());
        }

        let existing = self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?;
        if existing.is_some_and(|u| Some(u.id) != current_user) {
            errors.add("username", "A user with that username already exists.");
        }
        Ok(())
    }
}

fn validate_email(errors: &mut FieldErrors, email: &str) {
    let email = email.trim();
    if !email.is_empty() && !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
}
