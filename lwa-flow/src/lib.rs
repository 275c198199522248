//! # LWA Flow
//!
//! `lwa-flow` orchestrates the two-step "Login with Amazon" login sequence:
//! redirect the browser to Amazon with a fresh CSRF state, then resolve the
//! provider callback into a local user. It owns all transient state handling
//! and the success/failure decisions; the provider HTTP calls and the local
//! account storage sit behind the `lwa-core` traits.
//!
//! ## Key Components
//!
//! - **[`AuthFlowCoordinator`]**: Drives `begin_login` and `handle_callback`.
//! - **[`CallbackQuery`]**: The query parameters Amazon sends to the callback.
//! - **[`RedirectDirective`]** / **[`Authenticated`]**: The two outcomes.

#![warn(missing_docs)]

use std::sync::Arc;

use lwa_core::{AuthError, OAuthClient, ProviderConfig, UserAuthenticator};
use lwa_session::LoginSession;
use serde::Deserialize;

/// The query parameters of the provider callback request.
///
/// All fields are optional on the wire; the coordinator decides what a missing
/// value means. Doubles as the `Query` extractor type for web adapters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    /// The authorization code to exchange for an access token.
    pub code: Option<String>,
    /// The CSRF state token echoed back by the provider.
    pub state: Option<String>,
    /// A provider error code, e.g. `access_denied` when the user pressed Deny.
    pub error: Option<String>,
}

/// Directive to redirect the browser to the provider's authorization URL.
#[derive(Debug, Clone)]
pub struct RedirectDirective {
    /// The absolute URL to redirect to.
    pub url: String,
}

/// A successfully completed login.
#[derive(Debug)]
pub struct Authenticated {
    /// The resolved local user.
    pub user: lwa_core::LocalUser,
    /// The stored post-login destination, when one was requested.
    pub destination: Option<String>,
}

/// Orchestrates the redirect/callback login sequence for one provider client.
///
/// The configuration is loaded once per request by the caller and passed in by
/// value; the coordinator never reaches into ambient settings. Both operations
/// are terminal for the session's transient state: every callback, successful
/// or not, leaves the login keys cleared, so a retry starts from
/// [`begin_login`](AuthFlowCoordinator::begin_login).
pub struct AuthFlowCoordinator<C: OAuthClient> {
    config: ProviderConfig,
    client: C,
    users: Arc<dyn UserAuthenticator>,
}

impl<C: OAuthClient> AuthFlowCoordinator<C> {
    /// Create a coordinator from the per-request configuration and collaborators.
    pub fn new(config: ProviderConfig, client: C, users: Arc<dyn UserAuthenticator>) -> Self {
        Self {
            config,
            client,
            users,
        }
    }

    /// Start a login attempt: store a fresh CSRF state (and the optional
    /// destination) in the session and return the authorization redirect.
    ///
    /// Fails closed with [`AuthError::Configuration`] when the client
    /// credentials are missing, without storing any state.
    pub async fn begin_login(
        &self,
        session: &LoginSession,
        destination: Option<&str>,
    ) -> Result<RedirectDirective, AuthError> {
        if !self.config.validate() {
            return Err(AuthError::Configuration(
                "client ID and client secret are required".to_string(),
            ));
        }

        let state = uuid::Uuid::new_v4().to_string();
        let url = self.client.authorization_url(&state, &self.config.scopes());
        tracing::debug!(scopes = %self.config.scopes, "redirecting to the provider authorization page");

        session.set_state(&state).await?;
        if let Some(destination) = destination.filter(|d| !d.is_empty()) {
            session.set_destination(destination).await?;
        }

        Ok(RedirectDirective { url })
    }

    /// Resolve the provider callback into an authenticated local user.
    ///
    /// Runs the callback steps in order: user cancellation, CSRF state check,
    /// code-for-token exchange, profile fetch, extra-data enrichment for
    /// first-time users, then delegation to the [`UserAuthenticator`]. The
    /// transient session keys are cleared before returning, on success and on
    /// every failure.
    pub async fn handle_callback(
        &self,
        session: &LoginSession,
        query: &CallbackQuery,
    ) -> Result<Authenticated, AuthError> {
        let outcome = self.run_callback(session, query).await;
        if let Err(e) = session.clear().await {
            tracing::warn!(error = %e, "failed to clear login session");
        }
        outcome
    }

    async fn run_callback(
        &self,
        session: &LoginSession,
        query: &CallbackQuery,
    ) -> Result<Authenticated, AuthError> {
        if query.error.as_deref() == Some("access_denied") {
            return Err(AuthError::Cancelled);
        }

        // The stored state is consumed here; a replayed callback finds nothing.
        let expected_state = session.take_state().await?;
        let received_state = query.state.as_deref().unwrap_or_default();
        if received_state.is_empty() || expected_state.as_deref() != Some(received_state) {
            return Err(AuthError::InvalidState);
        }

        let code = query.code.as_deref().unwrap_or_default();
        if code.is_empty() {
            return Err(AuthError::Exchange(
                "authorization code missing from callback".to_string(),
            ));
        }

        let token = self
            .client
            .exchange_code(code)
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;
        session.set_access_token(&token.access_token).await?;

        let mut profile = self
            .client
            .fetch_profile(&token.access_token)
            .await
            .map_err(|e| AuthError::ProfileFetch(e.to_string()))?;
        if profile.user_id.is_empty() {
            return Err(AuthError::ProfileFetch(
                "provider returned a profile without a user id".to_string(),
            ));
        }

        if !self.users.exists(&profile.user_id).await? {
            profile.extra_data = self.fetch_extra_data(&token.access_token).await;
        }

        let destination = session.destination().await?;
        let user = self
            .users
            .authenticate(profile, &token.access_token)
            .await?;
        tracing::debug!(user = %user.id, created = user.created, "callback resolved a local user");

        Ok(Authenticated { user, destination })
    }

    /// Fetch the configured extra endpoints in order. A failing call is logged
    /// and skipped; enrichment never aborts the login.
    async fn fetch_extra_data(&self, access_token: &str) -> Vec<serde_json::Value> {
        let mut extra_data = Vec::new();
        for endpoint in self.config.api_calls() {
            match self.client.authenticated_get(&endpoint, access_token).await {
                Ok(value) => extra_data.push(value),
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "skipping extra data endpoint");
                }
            }
        }
        extra_data
    }
}
