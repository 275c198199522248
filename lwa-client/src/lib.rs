use std::time::Duration;

use async_trait::async_trait;
use lwa_core::{AuthError, OAuthClient, OAuthToken, Profile, ProviderConfig, Scope};
use serde::Deserialize;

const AUTHORIZATION_URL: &str = "https://www.amazon.com/ap/oa";
const TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";
const PROFILE_URL: &str = "https://api.amazon.com/user/profile";

// Login with Amazon specifies no client-side timeouts; these bound every call.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The three provider endpoints, overridable for tests and staging.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub authorization_url: String,
    pub token_url: String,
    pub profile_url: String,
}

pub struct AmazonClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http_client: reqwest::Client,
    authorization_url: String,
    token_url: String,
    profile_url: String,
}

impl AmazonClient {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http_client: reqwest::Client::new(),
            authorization_url: AUTHORIZATION_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            profile_url: PROFILE_URL.to_string(),
        }
    }

    /// Build a client from the persisted provider settings.
    ///
    /// Fails closed when the client credentials are missing, without contacting
    /// the provider. A configured proxy is merged into the HTTP client next to
    /// the credentials and timeouts rather than replacing them.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, AuthError> {
        if !config.validate() {
            tracing::error!("Define the client ID and client secret in the provider settings.");
            return Err(AuthError::Configuration(
                "client ID and client secret are required".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT);

        if let Some(proxy_url) = config.proxy_url.as_deref().filter(|url| !url.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| AuthError::Configuration(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let http_client = builder
            .build()
            .map_err(|e| AuthError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let mut client = Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_uri.clone(),
        );
        client.http_client = http_client;
        Ok(client)
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.authorization_url = endpoints.authorization_url;
        self.token_url = endpoints.token_url;
        self.profile_url = endpoints.profile_url;
        self
    }
}

#[derive(Deserialize)]
struct OAuthErrorBody {
    error: String,
    error_description: Option<String>,
}

impl OAuthErrorBody {
    fn describe(self) -> String {
        match self.error_description {
            Some(description) => format!("{} ({})", self.error, description),
            None => self.error,
        }
    }
}

#[async_trait]
impl OAuthClient for AmazonClient {
    fn authorization_url(&self, state: &str, scopes: &[Scope]) -> String {
        let scope_param = if scopes.is_empty() {
            Scope::Profile.as_str().to_string()
        } else {
            scopes
                .iter()
                .map(Scope::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        };

        format!(
            "{}?client_id={}&scope={}&response_type=code&redirect_uri={}&state={}",
            self.authorization_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&scope_param),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AuthError> {
        let response = self
            .http_client
            .post(&self.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|_| AuthError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OAuthErrorBody>(&body)
                .map(OAuthErrorBody::describe)
                .unwrap_or(body);
            return Err(AuthError::Provider(format!(
                "Token endpoint returned {}: {}",
                status, detail
            )));
        }

        let token = response
            .json::<OAuthToken>()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(AuthError::Provider(
                "Token response contained an empty access token".to_string(),
            ));
        }

        Ok(token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, AuthError> {
        let response = self
            .http_client
            .get(&self.profile_url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|_| AuthError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "Profile endpoint returned {}",
                status
            )));
        }

        response
            .json::<Profile>()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse profile response: {}", e)))
    }

    async fn authenticated_get(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<serde_json::Value, AuthError> {
        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|_| AuthError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "{} returned {}",
                url, status
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse response from {}: {}", url, e)))
    }
}
