//! # LWA Core
//!
//! `lwa-core` provides the foundational traits and types for the lwa "Login with
//! Amazon" integration. It defines the abstractions the flow crates are built on:
//! the provider client, the local-account boundary, and the provider configuration.
//!
//! ## Key Components
//!
//! - **[`Profile`]**: The Amazon user profile returned by the provider.
//! - **[`OAuthClient`]**: A trait for the provider-side OAuth2 operations.
//! - **[`UserAuthenticator`]**: A trait for resolving a profile to a local account.
//! - **[`ProviderConfig`]**: The persisted provider settings, including scope validation.
//! - **[`AuthError`]**: A comprehensive error type for login-related issues.

#![warn(missing_docs)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Provider configuration, scope validation, and the settings boundary.
pub mod config;

pub use config::{MemorySettings, ProviderConfig, Scope, SettingsStore};

/// Errors that can occur during the Amazon login process.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider is missing its client credentials or is otherwise misconfigured.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The user denied the authorization request on the Amazon consent screen.
    #[error("Login cancelled by the user")]
    Cancelled,
    /// The CSRF state parameter is missing or does not match the stored value.
    #[error("Invalid OAuth2 state")]
    InvalidState,
    /// The authorization code could not be exchanged for an access token.
    #[error("Token exchange failed: {0}")]
    Exchange(String),
    /// The Amazon profile could not be fetched or was unusable.
    #[error("Profile fetch failed: {0}")]
    ProfileFetch(String),
    /// A scope outside the allowed set was submitted.
    #[error("Invalid scope: {0}")]
    InvalidScope(String),
    /// An error returned by a provider endpoint.
    #[error("Provider error: {0}")]
    Provider(String),
    /// A network error occurred during communication with the provider.
    #[error("Network error")]
    Network,
    /// An error occurred while reading or writing session data.
    #[error("Session error: {0}")]
    Session(String),
    /// The local account layer rejected or failed to sign in the user.
    #[error("Authentication error: {0}")]
    Authentication(String),
}

/// The Amazon user profile for an authenticated user.
///
/// Mirrors the JSON shape of the Login with Amazon profile endpoint
/// (`user_id`, `name`, `email`, `postal_code`); `name` and `email` are only
/// populated when the corresponding scopes were granted. `extra_data` holds the
/// raw results of any configured extra API calls, in call order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// The unique Amazon identifier for this user.
    pub user_id: String,
    /// The user's display name, empty when the `profile` scope was not granted.
    #[serde(default)]
    pub name: String,
    /// The user's email address, empty when the `profile` scope was not granted.
    #[serde(default)]
    pub email: String,
    /// The user's postal code, present only with the `postal_code` scope.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Raw results of the configured extra API calls, preserving call order.
    #[serde(default)]
    pub extra_data: Vec<serde_json::Value>,
}

/// The tokens returned by the Amazon token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    /// The access token used for API requests.
    pub access_token: String,
    /// The type of token (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Seconds until the access token expires.
    pub expires_in: Option<u64>,
    /// The refresh token used to obtain new access tokens.
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Handle to the local account resolved for an authenticated profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUser {
    /// The local user identifier.
    pub id: String,
    /// Whether the account was created during this login.
    pub created: bool,
}

/// Trait for the provider-side OAuth2 operations.
///
/// Implementations talk to the provider's authorization, token, and profile
/// endpoints. The flow layer drives these four operations and owns all state
/// handling; implementations are stateless request makers.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Build the absolute authorization URL carrying the CSRF state and scopes.
    fn authorization_url(&self, state: &str, scopes: &[Scope]) -> String;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AuthError>;

    /// Fetch the user profile with the given access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, AuthError>;

    /// Perform an authenticated GET against an arbitrary provider endpoint.
    async fn authenticated_get(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<serde_json::Value, AuthError>;
}

/// Trait for resolving an Amazon profile to a local user account.
///
/// This is the boundary to the host application's account storage. The flow
/// layer consults [`exists`](UserAuthenticator::exists) before enriching a
/// first-time profile with extra API data, then hands the finished profile to
/// [`authenticate`](UserAuthenticator::authenticate) exactly once.
#[async_trait]
pub trait UserAuthenticator: Send + Sync {
    /// Whether a local account already exists for the given Amazon user id.
    async fn exists(&self, external_id: &str) -> Result<bool, AuthError>;

    /// Find or create the local account for the profile and sign the user in.
    async fn authenticate(
        &self,
        profile: Profile,
        access_token: &str,
    ) -> Result<LocalUser, AuthError>;
}
