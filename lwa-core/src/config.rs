use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// A data scope that can be requested from Login with Amazon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Name, email address, and user id (`profile`).
    Profile,
    /// User id only (`profile:user_id`).
    ProfileUserId,
    /// Postal code of the primary shipping address (`postal_code`).
    PostalCode,
}

impl Scope {
    /// The scope token as it appears in the authorization request.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Profile => "profile",
            Scope::ProfileUserId => "profile:user_id",
            Scope::PostalCode => "postal_code",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(Scope::Profile),
            "profile:user_id" => Ok(Scope::ProfileUserId),
            "postal_code" => Ok(Scope::PostalCode),
            other => Err(AuthError::InvalidScope(other.to_string())),
        }
    }
}

/// The persisted provider settings.
///
/// `scopes` is stored as a space-separated string and `api_calls` as a
/// newline-separated list of endpoint URLs; the typed accessors parse them.
/// An empty `client_id` or `client_secret` marks the provider as unconfigured
/// and every login attempt fails closed before contacting Amazon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// The OAuth2 client id issued by Amazon.
    pub client_id: String,
    /// The OAuth2 client secret issued by Amazon.
    pub client_secret: String,
    /// The callback URL registered as an allowed return URL for the app.
    pub redirect_uri: String,
    /// Requested scopes, space-separated.
    pub scopes: String,
    /// Extra API endpoints to call after a first-time login, one per line.
    pub api_calls: String,
    /// Optional outbound proxy URL for all provider requests.
    pub proxy_url: Option<String>,
}

impl ProviderConfig {
    /// Whether the provider is configured: both client credentials non-empty.
    pub fn validate(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Validate the scope string against the fixed allow-list.
    ///
    /// The string is split on spaces; empty tokens are tolerated, any other
    /// token outside {`profile`, `profile:user_id`, `postal_code`} rejects the
    /// whole configuration with [`AuthError::InvalidScope`].
    pub fn validate_scopes(&self) -> Result<(), AuthError> {
        for token in self.scopes.split(' ') {
            if token.is_empty() {
                continue;
            }
            token.parse::<Scope>()?;
        }
        Ok(())
    }

    /// The configured scopes, in order, skipping empty and unknown tokens.
    pub fn scopes(&self) -> Vec<Scope> {
        self.scopes
            .split(' ')
            .filter_map(|token| token.parse().ok())
            .collect()
    }

    /// The configured extra API endpoints, in order, skipping blank lines.
    pub fn api_calls(&self) -> Vec<String> {
        self.api_calls
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns the configuration with surrounding whitespace stripped from the
    /// client credentials, as submitted values commonly carry it.
    pub fn trimmed(mut self) -> Self {
        self.client_id = self.client_id.trim().to_string();
        self.client_secret = self.client_secret.trim().to_string();
        self
    }
}

/// Boundary for loading and persisting the provider configuration.
///
/// Implementations must reject a configuration whose scope string fails
/// [`ProviderConfig::validate_scopes`]; loading never validates, so a login
/// attempt sees exactly what the backend holds.
#[async_trait]
pub trait SettingsStore: Send + Sync + 'static {
    /// Load the current provider configuration.
    async fn load(&self) -> Result<ProviderConfig, AuthError>;
    /// Persist a new provider configuration.
    async fn save(&self, config: ProviderConfig) -> Result<(), AuthError>;
}

/// An in-memory implementation of [`SettingsStore`].
///
/// **Note**: This store is not persistent and will be cleared when the
/// application restarts. It is primarily intended for development and testing.
#[derive(Default)]
pub struct MemorySettings {
    config: std::sync::Mutex<ProviderConfig>,
}

impl MemorySettings {
    /// Create a new store holding an empty (unconfigured) provider config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given configuration.
    pub fn with_config(config: ProviderConfig) -> Self {
        Self {
            config: std::sync::Mutex::new(config),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn load(&self) -> Result<ProviderConfig, AuthError> {
        Ok(self.config.lock().unwrap().clone())
    }

    async fn save(&self, config: ProviderConfig) -> Result<(), AuthError> {
        let config = config.trimmed();
        config.validate_scopes()?;
        *self.config.lock().unwrap() = config;
        Ok(())
    }
}
