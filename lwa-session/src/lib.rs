//! # LWA Session
//!
//! `lwa-session` holds the transient per-login state for the lwa "Login with
//! Amazon" flow: the CSRF state token, the access token, and the post-login
//! destination. Values are scoped to one browser session and live only for the
//! duration of a login round-trip.
//!
//! ## Key Components
//!
//! - **[`SessionStore`]**: A trait for session-scoped key-value persistence.
//! - **[`LoginSession`]**: Typed accessors over the transient login keys.
//! - **[`SessionConfig`]**: Cookie settings for the session identifier.
//! - **[`MemoryStore`]**: In-memory backend for development and testing.
//! - **`RedisStore`**: Redis backend, behind the `redis-store` feature.

use std::sync::Arc;

use async_trait::async_trait;
use lwa_core::AuthError;
use serde::{Deserialize, Serialize};

pub mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "redis-store")]
pub mod redis;
#[cfg(feature = "redis-store")]
pub use redis::RedisStore;

/// Session key holding the CSRF state token of the in-flight login attempt.
pub const OAUTH2_STATE_KEY: &str = "oauth2state";
/// Session key holding the access token obtained during the callback.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Session key holding the URL to redirect to after a successful login.
pub const DESTINATION_KEY: &str = "destination";

/// Controls whether a cookie is sent with cross-site requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// The cookie is sent with "safe" cross-site requests (e.g., following a link).
    Lax,
    /// The cookie is only sent for same-site requests.
    Strict,
    /// The cookie is sent with all requests, including cross-site. Requires `Secure`.
    None,
}

/// Configuration for the session identifier cookie.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// The name of the session cookie.
    pub cookie_name: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Whether the cookie should be inaccessible to client-side scripts.
    pub http_only: bool,
    /// The `SameSite` attribute for the cookie.
    pub same_site: SameSite,
    /// The path for which the cookie is valid.
    pub path: String,
    /// The maximum age of the session cookie.
    pub max_age: Option<chrono::Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "lwa_session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            max_age: Some(chrono::Duration::hours(1)),
        }
    }
}

/// Trait for session-scoped key-value persistence.
///
/// Values are plain strings addressed by `(session_id, key)`. A `SameSite=Lax`
/// cookie carries the session id, so the OAuth2 redirect from the provider
/// lands back in the same scope.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Read a value.
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, AuthError>;
    /// Write a value.
    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<(), AuthError>;
    /// Remove a value.
    async fn remove(&self, session_id: &str, key: &str) -> Result<(), AuthError>;
    /// Read a value and remove it in one step.
    ///
    /// Backends should override this with an atomic form where available; the
    /// CSRF state token is consumed through it, which is what makes a replayed
    /// callback observe no state.
    async fn take(&self, session_id: &str, key: &str) -> Result<Option<String>, AuthError> {
        let value = self.get(session_id, key).await?;
        if value.is_some() {
            self.remove(session_id, key).await?;
        }
        Ok(value)
    }
}

/// Typed accessors over one browser session's transient login keys.
///
/// Created at the redirect step, mutated at the callback step, and cleared
/// (all keys removed together) on every failure path and after a successful
/// authentication.
#[derive(Clone)]
pub struct LoginSession {
    store: Arc<dyn SessionStore>,
    session_id: String,
}

impl LoginSession {
    /// Create a view over the given session id.
    pub fn new(store: Arc<dyn SessionStore>, session_id: impl Into<String>) -> Self {
        Self {
            store,
            session_id: session_id.into(),
        }
    }

    /// The session id this view is scoped to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Read the stored CSRF state token.
    pub async fn state(&self) -> Result<Option<String>, AuthError> {
        self.store.get(&self.session_id, OAUTH2_STATE_KEY).await
    }

    /// Store the CSRF state token for the current login attempt.
    pub async fn set_state(&self, state: &str) -> Result<(), AuthError> {
        self.store
            .set(&self.session_id, OAUTH2_STATE_KEY, state)
            .await
    }

    /// Read and remove the stored CSRF state token in one step.
    pub async fn take_state(&self) -> Result<Option<String>, AuthError> {
        self.store.take(&self.session_id, OAUTH2_STATE_KEY).await
    }

    /// Read the stored access token.
    pub async fn access_token(&self) -> Result<Option<String>, AuthError> {
        self.store.get(&self.session_id, ACCESS_TOKEN_KEY).await
    }

    /// Store the access token obtained from the token exchange.
    pub async fn set_access_token(&self, token: &str) -> Result<(), AuthError> {
        self.store
            .set(&self.session_id, ACCESS_TOKEN_KEY, token)
            .await
    }

    /// Read the stored post-login destination.
    pub async fn destination(&self) -> Result<Option<String>, AuthError> {
        self.store.get(&self.session_id, DESTINATION_KEY).await
    }

    /// Store the post-login destination.
    pub async fn set_destination(&self, destination: &str) -> Result<(), AuthError> {
        self.store
            .set(&self.session_id, DESTINATION_KEY, destination)
            .await
    }

    /// Remove all transient login keys together.
    pub async fn clear(&self) -> Result<(), AuthError> {
        for key in [OAUTH2_STATE_KEY, ACCESS_TOKEN_KEY, DESTINATION_KEY] {
            self.store.remove(&self.session_id, key).await?;
        }
        Ok(())
    }
}
