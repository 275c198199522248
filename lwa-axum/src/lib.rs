use std::sync::Arc;

use axum::extract::FromRef;
use lwa_client::{AmazonClient, Endpoints};
use lwa_core::{AuthError, MemorySettings, SettingsStore, UserAuthenticator};
use lwa_flow::AuthFlowCoordinator;
use lwa_session::MemoryStore;
pub use tower_cookies::cookie::SameSite;
pub use tower_cookies::Cookie;

pub mod helpers;

pub use helpers::*;

/// The assembled Login with Amazon service for an axum host.
///
/// Holds the persisted provider settings, the transient login-session backend,
/// and the host's account layer. Handlers reach it through [`FromRef`], so it
/// can live inside any application state.
#[derive(Clone)]
pub struct AmazonAuth {
    /// Persisted provider settings (credentials, scopes, extra API calls).
    pub settings: Arc<dyn SettingsStore>,
    /// Backend for the transient per-login session keys.
    pub session_store: Arc<dyn SessionStore>,
    /// Configuration for the session id cookie.
    pub session_config: SessionConfig,
    /// The host application's account layer.
    pub users: Arc<dyn UserAuthenticator>,
    /// Redirect targets of the host application.
    pub pages: Pages,
    /// Provider endpoint overrides (useful for testing and staging).
    pub endpoints: Option<Endpoints>,
}

impl AmazonAuth {
    /// Create a new [`AmazonAuthBuilder`] around the host's account layer.
    pub fn builder(users: Arc<dyn UserAuthenticator>) -> AmazonAuthBuilder {
        AmazonAuthBuilder {
            settings: None,
            session_store: None,
            session_config: SessionConfig::default(),
            users,
            pages: Pages::default(),
            endpoints: None,
        }
    }

    /// Assemble the login coordinator for one request.
    ///
    /// Settings are loaded fresh on every call, so an admin update takes
    /// effect on the next request. The client build fails closed while the
    /// credentials are incomplete.
    pub async fn coordinator(&self) -> Result<AuthFlowCoordinator<AmazonClient>, AuthError> {
        let config = self.settings.load().await?;
        let mut client = AmazonClient::from_config(&config)?;
        if let Some(endpoints) = &self.endpoints {
            client = client.with_endpoints(endpoints.clone());
        }
        Ok(AuthFlowCoordinator::new(config, client, self.users.clone()))
    }
}

/// A builder for configuring and creating an [`AmazonAuth`] instance.
pub struct AmazonAuthBuilder {
    settings: Option<Arc<dyn SettingsStore>>,
    session_store: Option<Arc<dyn SessionStore>>,
    session_config: SessionConfig,
    users: Arc<dyn UserAuthenticator>,
    pages: Pages,
    endpoints: Option<Endpoints>,
}

impl AmazonAuthBuilder {
    /// Set the settings backend.
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the session store.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Set the session cookie configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Set the host application's redirect targets.
    pub fn pages(mut self, pages: Pages) -> Self {
        self.pages = pages;
        self
    }

    /// Override the provider endpoints (useful for testing and staging).
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Build the [`AmazonAuth`] instance.
    ///
    /// Unset backends fall back to the in-memory implementations; a service
    /// with empty settings serves requests but fails every login closed until
    /// credentials are saved.
    pub fn build(self) -> AmazonAuth {
        AmazonAuth {
            settings: self
                .settings
                .unwrap_or_else(|| Arc::new(MemorySettings::new())),
            session_store: self
                .session_store
                .unwrap_or_else(|| Arc::new(MemoryStore::default())),
            session_config: self.session_config,
            users: self.users,
            pages: self.pages,
            endpoints: self.endpoints,
        }
    }
}

#[derive(Clone)]
pub struct AmazonAuthState {
    pub amazon_auth: AmazonAuth,
}

impl From<AmazonAuth> for AmazonAuthState {
    fn from(amazon_auth: AmazonAuth) -> Self {
        Self { amazon_auth }
    }
}

impl FromRef<AmazonAuthState> for AmazonAuth {
    fn from_ref(state: &AmazonAuthState) -> Self {
        state.amazon_auth.clone()
    }
}

pub trait AmazonAuthRouterExt {
    fn axum_router<S>(&self) -> axum::Router<S>
    where
        S: Clone + Send + Sync + 'static,
        AmazonAuth: FromRef<S>;
}

impl AmazonAuthRouterExt for AmazonAuth {
    fn axum_router<S>(&self) -> axum::Router<S>
    where
        S: Clone + Send + Sync + 'static,
        AmazonAuth: FromRef<S>,
    {
        use axum::routing::get;
        axum::Router::new()
            .route(LOGIN_PATH, get(helpers::login_handler::<S>))
            .route(CALLBACK_PATH, get(helpers::callback_handler::<S>))
    }
}
