//! # Axum Login Example
//!
//! This example wires the Login with Amazon routes into an axum application
//! with a small in-memory account layer.
//!
//! To run this example, set the following environment variables in a `.env`
//! file:
//! - `LWA_CLIENT_ID`
//! - `LWA_CLIENT_SECRET`
//! - `LWA_REDIRECT_URI` (defaults to `http://localhost:3000/user/login/amazon/callback`)
//! - `LWA_SCOPES` (defaults to `profile`)
//! - `LWA_API_CALLS` (optional, newline-separated endpoint URLs)
//! - `LWA_PROXY_URL` (optional, outbound proxy for provider requests)
//! - `REDIS_URL` (optional, enables the Redis session store)

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use lwa_axum::{
    default_redirect_uri, take_flash, AmazonAuth, AmazonAuthRouterExt, AmazonAuthState,
    SessionConfig, SessionStore,
};
use lwa_core::{AuthError, LocalUser, MemorySettings, Profile, ProviderConfig, UserAuthenticator};
use tower_cookies::{CookieManagerLayer, Cookies};

/// The account layer of the host application. A real host backs this with its
/// user database; the demo keeps a map of external id to local id.
#[derive(Default)]
struct DemoUsers {
    accounts: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl UserAuthenticator for DemoUsers {
    async fn exists(&self, external_id: &str) -> Result<bool, AuthError> {
        Ok(self.accounts.lock().unwrap().contains_key(external_id))
    }

    async fn authenticate(
        &self,
        profile: Profile,
        _access_token: &str,
    ) -> Result<LocalUser, AuthError> {
        let mut accounts = self.accounts.lock().unwrap();
        let created = !accounts.contains_key(&profile.user_id);
        let next_id = format!("user-{}", accounts.len() + 1);
        let id = accounts
            .entry(profile.user_id.clone())
            .or_insert(next_id)
            .clone();
        tracing::info!(user = %id, name = %profile.name, created, "amazon login");
        Ok(LocalUser { id, created })
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lwa_flow=debug".into()),
        )
        .init();

    let config = ProviderConfig {
        client_id: std::env::var("LWA_CLIENT_ID").unwrap_or_default(),
        client_secret: std::env::var("LWA_CLIENT_SECRET").unwrap_or_default(),
        redirect_uri: std::env::var("LWA_REDIRECT_URI")
            .unwrap_or_else(|_| default_redirect_uri("http://localhost:3000")),
        scopes: std::env::var("LWA_SCOPES").unwrap_or_else(|_| "profile".to_string()),
        api_calls: std::env::var("LWA_API_CALLS").unwrap_or_default(),
        proxy_url: std::env::var("LWA_PROXY_URL").ok(),
    };
    let settings = Arc::new(MemorySettings::with_config(config));

    // Session Store
    let session_store: Arc<dyn SessionStore> = if let Ok(redis_url) = std::env::var("REDIS_URL") {
        println!("Using RedisStore at {}", redis_url);
        Arc::new(lwa_session::RedisStore::new(&redis_url, "lwa".into()).unwrap())
    } else {
        println!("Using MemoryStore");
        Arc::new(lwa_session::MemoryStore::default())
    };

    let amazon_auth = AmazonAuth::builder(Arc::new(DemoUsers::default()))
        .settings(settings)
        .session_store(session_store)
        .session_config(SessionConfig {
            secure: false, // For local dev
            ..Default::default()
        })
        .build();

    let app = Router::new()
        .route("/", get(index))
        .route("/user/login", get(login_page))
        .route("/account", get(account))
        .merge(amazon_auth.axum_router())
        .layer(CookieManagerLayer::new())
        .with_state(AmazonAuthState::from(amazon_auth));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("🚀 Login with Amazon demo running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}

async fn index() -> impl IntoResponse {
    Html(
        r#"
        <h1>Login with Amazon demo</h1>
        <ul>
            <li><a href="/user/login/amazon">Login with Amazon</a></li>
            <li><a href="/user/login/amazon?destination=/account">Login and continue to /account</a></li>
        </ul>
    "#,
    )
}

/// The generic login page failed attempts are sent back to.
async fn login_page(cookies: Cookies) -> impl IntoResponse {
    let notice = take_flash(&cookies)
        .map(|message| format!("<p style=\"color:red\">{}</p>", message))
        .unwrap_or_default();
    Html(format!(
        "<h1>Login</h1>{}<p><a href=\"/user/login/amazon\">Login with Amazon</a></p>",
        notice
    ))
}

async fn account() -> impl IntoResponse {
    Html("<h1>Account</h1><p>You arrived here through the destination parameter.</p>")
}
