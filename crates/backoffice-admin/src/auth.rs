//! Authentication and site permissions.
//!
//! [`UserStore`] keeps accounts with Argon2 password hashes; hashing and
//! verification run on `tokio::task::spawn_blocking` so they never block the
//! async runtime. [`SessionStore`] maps opaque bearer tokens to usernames.
//! Each admin site decides access with a [`PermissionFn`] predicate over the
//! current [`UserContext`].

use std::collections::HashMap;
use std::sync::Arc;

use backoffice_core::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The authenticated user as seen by permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct UserContext {
    /// Login name.
    pub username: String,
    /// Whether the account may log in at all.
    pub is_active: bool,
    /// Whether the user may use the primary admin site.
    pub is_staff: bool,
    /// Whether the user has every permission.
    pub is_superuser: bool,
}

impl UserContext {
    /// Creates an active, non-staff user context.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Sets the active flag.
    #[must_use]
    pub const fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Sets the staff flag.
    #[must_use]
    pub const fn staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    /// Sets the superuser flag.
    #[must_use]
    pub const fn superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }
}

/// Decides whether a user may use an admin site.
pub type PermissionFn = Arc<dyn Fn(&UserContext) -> bool + Send + Sync>;

/// Default predicate of the primary admin site.
pub const fn staff_required(user: &UserContext) -> bool {
    user.is_active && user.is_staff
}

/// Predicate that admits every active user.
pub const fn active_required(user: &UserContext) -> bool {
    user.is_active
}

/// Hashes a password with Argon2 off the async runtime.
pub async fn hash_password(password: &str) -> AdminResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
        use argon2::Argon2;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AdminError::Internal(format!("Argon2 hash error: {e}")))?;
        Ok(hash.to_string())
    })
    .await
    .map_err(|e| AdminError::Internal(format!("Task join error: {e}")))?
}

/// Verifies a password against an Argon2 hash off the async runtime.
pub async fn verify_password(password: &str, hash: &str) -> AdminResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};
        use argon2::Argon2;

        let parsed = PasswordHash::new(&hash)
            .map_err(|e| AdminError::Internal(format!("Invalid hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AdminError::Internal(format!("Task join error: {e}")))?
}

#[derive(Debug, Clone)]
struct StoredUser {
    context: UserContext,
    password_hash: String,
}

/// Why a login attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// Unknown username or wrong password.
    InvalidCredentials,
    /// Correct credentials for an inactive account.
    Inactive,
}

/// Accounts shared by all admin sites. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    users: Arc<RwLock<HashMap<String, StoredUser>>>,
}

impl UserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an account with the given flags and password.
    ///
    /// Fails with [`AdminError::Conflict`] if the username is taken.
    pub async fn create_user(&self, user: UserContext, password: &str) -> AdminResult<UserContext> {
        if user.username.trim().is_empty() {
            return Err(AdminError::BadRequest("Username must not be empty.".to_string()));
        }
        let password_hash = hash_password(password).await?;
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(AdminError::Conflict(format!(
                "A user with username '{}' already exists.",
                user.username
            )));
        }
        users.insert(
            user.username.clone(),
            StoredUser {
                context: user.clone(),
                password_hash,
            },
        );
        tracing::info!(username = %user.username, is_staff = user.is_staff, "user created");
        Ok(user)
    }

    /// Returns the current state of an account.
    pub async fn get(&self, username: &str) -> Option<UserContext> {
        self.users.read().await.get(username).map(|u| u.context.clone())
    }

    /// Activates or deactivates an account.
    pub async fn set_active(&self, username: &str, is_active: bool) -> AdminResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(username)
            .ok_or_else(|| AdminError::NotFound(format!("User '{username}' does not exist")))?;
        user.context.is_active = is_active;
        Ok(())
    }

    /// Checks credentials.
    ///
    /// The password is verified before the active flag is looked at, so an
    /// inactive account is only reported as such to its owner.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> AdminResult<Result<UserContext, LoginFailure>> {
        let Some(stored) = self.users.read().await.get(username).cloned() else {
            return Ok(Err(LoginFailure::InvalidCredentials));
        };
        if !verify_password(password, &stored.password_hash).await? {
            return Ok(Err(LoginFailure::InvalidCredentials));
        }
        if !stored.context.is_active {
            return Ok(Err(LoginFailure::Inactive));
        }
        Ok(Ok(stored.context))
    }
}

/// Bearer tokens issued by one admin site.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStore {
    /// Creates an empty session table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token for `username`.
    pub async fn create(&self, username: &str) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), username.to_string());
        token
    }

    /// Returns the username a token was issued to.
    pub async fn username(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Drops a token. Returns `true` if it existed.
    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}
