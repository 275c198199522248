use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use lwa::axum::{take_flash, AmazonAuth, AmazonAuthRouterExt, AmazonAuthState, SessionConfig};
use lwa::{AuthError, LocalUser, MemorySettings, Profile, ProviderConfig, UserAuthenticator};
use tower_cookies::{CookieManagerLayer, Cookies};

/// Resolves every Amazon account to a local user without persistence.
struct AcceptAll;

#[async_trait]
impl UserAuthenticator for AcceptAll {
    async fn exists(&self, _external_id: &str) -> Result<bool, AuthError> {
        Ok(false)
    }

    async fn authenticate(
        &self,
        profile: Profile,
        _access_token: &str,
    ) -> Result<LocalUser, AuthError> {
        Ok(LocalUser {
            id: profile.user_id,
            created: true,
        })
    }
}

#[tokio::main]
async fn main() {
    let client_id = std::env::var("LWA_CLIENT_ID").unwrap_or_else(|_| "dummy_id".to_string());
    let client_secret =
        std::env::var("LWA_CLIENT_SECRET").unwrap_or_else(|_| "dummy_secret".to_string());

    let settings = Arc::new(MemorySettings::with_config(ProviderConfig {
        client_id,
        client_secret,
        redirect_uri: "http://localhost:3000/user/login/amazon/callback".to_string(),
        scopes: "profile".to_string(),
        ..Default::default()
    }));

    let amazon_auth = AmazonAuth::builder(Arc::new(AcceptAll))
        .settings(settings)
        .session_config(SessionConfig {
            secure: false, // For local dev
            ..Default::default()
        })
        .build();

    let app = Router::new()
        .route("/", get(index))
        .route("/user/login", get(login_page))
        .merge(amazon_auth.axum_router())
        .layer(CookieManagerLayer::new())
        .with_state(AmazonAuthState::from(amazon_auth));

    println!("Lwa demo running on http://localhost:3000");
    println!("This demo uses the 'lwa' crate instead of individual sub-crates.");

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn index() -> impl IntoResponse {
    Html(r#"<h1>Lwa Demo</h1><p><a href="/user/login/amazon">Login with Amazon</a></p>"#)
}

async fn login_page(cookies: Cookies) -> impl IntoResponse {
    Html(take_flash(&cookies).unwrap_or_else(|| "Please log in.".to_string()))
}
