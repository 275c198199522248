pub use lwa_session::{LoginSession, SessionConfig, SessionStore};
use axum::{
    extract::{FromRef, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use lwa_core::AuthError;
use lwa_flow::CallbackQuery;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

use crate::AmazonAuth;

/// Path serving the redirect to Amazon.
pub const LOGIN_PATH: &str = "/user/login/amazon";
/// Path Amazon sends the browser back to after the consent screen.
pub const CALLBACK_PATH: &str = "/user/login/amazon/callback";
/// Cookie carrying the one-shot error message for the login page.
pub const FLASH_COOKIE_NAME: &str = "lwa_flash";

#[derive(serde::Deserialize)]
pub struct LoginParams {
    pub destination: Option<String>,
}

/// Redirect targets of the host application.
#[derive(Clone, Debug)]
pub struct Pages {
    /// Where failed attempts land, with a flash message set.
    pub login: String,
    /// Fallback after a successful login without a stored destination.
    pub home: String,
}

impl Default for Pages {
    fn default() -> Self {
        Self {
            login: "/user/login".to_string(),
            home: "/".to_string(),
        }
    }
}

/// The callback route appended to a host base URL.
pub fn default_redirect_uri(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), CALLBACK_PATH)
}

pub fn to_cookie_same_site(ss: lwa_session::SameSite) -> SameSite {
    match ss {
        lwa_session::SameSite::Lax => SameSite::Lax,
        lwa_session::SameSite::Strict => SameSite::Strict,
        lwa_session::SameSite::None => SameSite::None,
    }
}

pub fn create_session_cookie<'a>(config: &SessionConfig, value: String) -> Cookie<'a> {
    let mut cookie = Cookie::new(config.cookie_name.clone(), value);
    cookie.set_path(config.path.clone());
    cookie.set_secure(config.secure);
    cookie.set_http_only(config.http_only);
    cookie.set_same_site(to_cookie_same_site(config.same_site));
    if let Some(max_age) = config.max_age {
        cookie.set_max_age(Some(tower_cookies::cookie::time::Duration::seconds(
            max_age.num_seconds(),
        )));
    }
    cookie
}

/// Returns the browser's session id, issuing a fresh cookie when the request
/// does not carry one yet.
pub fn ensure_session_cookie(config: &SessionConfig, cookies: &Cookies) -> String {
    if let Some(cookie) = cookies.get(&config.cookie_name) {
        return cookie.value().to_string();
    }
    let session_id = uuid::Uuid::new_v4().to_string();
    cookies.add(create_session_cookie(config, session_id.clone()));
    session_id
}

pub fn set_flash(config: &SessionConfig, cookies: &Cookies, message: &str) {
    let mut cookie = Cookie::new(FLASH_COOKIE_NAME, urlencoding::encode(message).into_owned());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config.secure);
    cookie.set_max_age(Some(tower_cookies::cookie::time::Duration::minutes(5)));
    cookies.add(cookie);
}

/// Read and clear the flash message left by a failed login attempt.
///
/// The host's login page calls this to render the error notice.
pub fn take_flash(cookies: &Cookies) -> Option<String> {
    let value = cookies.get(FLASH_COOKIE_NAME)?.value().to_string();
    let mut removal = Cookie::new(FLASH_COOKIE_NAME, "");
    removal.set_path("/");
    cookies.remove(removal);
    urlencoding::decode(&value).map(|message| message.into_owned()).ok()
}

/// A `302 Found` redirect.
///
/// `axum::response::Redirect` answers with `303 See Other`; the routes here
/// answer `302` like the module they replace.
pub fn redirect_found(url: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response()
}

/// The flash text shown to the user for a failed attempt.
///
/// Details stay in the logs; the browser only ever sees these fixed texts.
pub fn user_message(error: &AuthError) -> &'static str {
    match error {
        AuthError::Configuration(_) => {
            "Amazon login is not configured properly. Contact the site administrator."
        }
        AuthError::InvalidState => "Amazon login failed. Invalid OAuth2 state.",
        AuthError::Exchange(_) => "Amazon login failed. Contact the site administrator.",
        AuthError::ProfileFetch(_) => {
            "Amazon login failed, could not load the Amazon profile. Contact the site administrator."
        }
        _ => "You could not be authenticated.",
    }
}

pub fn fail_redirect(
    pages: &Pages,
    config: &SessionConfig,
    cookies: &Cookies,
    error: &AuthError,
) -> Response {
    tracing::warn!(error = %error, "Amazon login attempt failed");
    set_flash(config, cookies, user_message(error));
    redirect_found(&pages.login)
}

async fn clear_session(session: &LoginSession) {
    if let Err(e) = session.clear().await {
        tracing::warn!(error = %e, "failed to clear login session");
    }
}

/// Accepts only site-local destinations: an absolute path that is not
/// protocol-relative and carries no control characters.
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.chars().any(char::is_control)
}

pub async fn login_handler<S>(
    State(state): State<S>,
    Query(params): Query<LoginParams>,
    cookies: Cookies,
) -> impl IntoResponse
where
    S: Clone + Send + Sync + 'static,
    AmazonAuth: FromRef<S>,
{
    let auth = AmazonAuth::from_ref(&state);
    let session_id = ensure_session_cookie(&auth.session_config, &cookies);
    let session = LoginSession::new(auth.session_store.clone(), session_id);

    let coordinator = match auth.coordinator().await {
        Ok(coordinator) => coordinator,
        Err(e) => return fail_redirect(&auth.pages, &auth.session_config, &cookies, &e),
    };

    let destination = params.destination.as_deref().filter(|d| is_local_path(d));
    match coordinator.begin_login(&session, destination).await {
        Ok(directive) => redirect_found(&directive.url),
        Err(e) => fail_redirect(&auth.pages, &auth.session_config, &cookies, &e),
    }
}

pub async fn callback_handler<S>(
    State(state): State<S>,
    Query(query): Query<CallbackQuery>,
    cookies: Cookies,
) -> impl IntoResponse
where
    S: Clone + Send + Sync + 'static,
    AmazonAuth: FromRef<S>,
{
    let auth = AmazonAuth::from_ref(&state);
    let session_id = ensure_session_cookie(&auth.session_config, &cookies);
    let session = LoginSession::new(auth.session_store.clone(), session_id);

    // The user declining consent outranks every other callback problem,
    // including an unconfigured provider.
    if query.error.as_deref() == Some("access_denied") {
        clear_session(&session).await;
        return fail_redirect(
            &auth.pages,
            &auth.session_config,
            &cookies,
            &AuthError::Cancelled,
        );
    }

    let coordinator = match auth.coordinator().await {
        Ok(coordinator) => coordinator,
        Err(e) => {
            // The transient keys never survive a failed callback, this exit included.
            clear_session(&session).await;
            return fail_redirect(&auth.pages, &auth.session_config, &cookies, &e);
        }
    };

    match coordinator.handle_callback(&session, &query).await {
        Ok(outcome) => {
            let destination = outcome
                .destination
                .filter(|d| is_local_path(d))
                .unwrap_or_else(|| auth.pages.home.clone());
            redirect_found(&destination)
        }
        Err(e) => fail_redirect(&auth.pages, &auth.session_config, &cookies, &e),
    }
}
