use lwa_client::{AmazonClient, Endpoints};
use lwa_core::{AuthError, OAuthClient, ProviderConfig, Scope};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> AmazonClient {
    AmazonClient::new(
        "test_client_id".to_string(),
        "test_client_secret".to_string(),
        format!("{}/callback", server.uri()),
    )
    .with_endpoints(Endpoints {
        authorization_url: format!("{}/ap/oa", server.uri()),
        token_url: format!("{}/auth/o2/token", server.uri()),
        profile_url: format!("{}/user/profile", server.uri()),
    })
}

#[tokio::test]
async fn test_amazon_oauth_flow() {
    // Start a mock server
    let server = MockServer::start().await;

    // Mock the Amazon token endpoint
    Mock::given(method("POST"))
        .and(path("/auth/o2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=test_code"))
        .and(body_string_contains("client_id=test_client_id"))
        .and(body_string_contains("client_secret=test_client_secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("content-type", "application/json")
                .set_body_json(serde_json::json!({
                    "access_token": "test_access_token",
                    "token_type": "bearer",
                    "expires_in": 3600,
                    "refresh_token": "test_refresh_token"
                })),
        )
        .mount(&server)
        .await;

    // Mock the Amazon profile endpoint
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .and(header("Authorization", "Bearer test_access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("content-type", "application/json")
                .set_body_json(serde_json::json!({
                    "user_id": "amzn1.account.AEXAMPLE",
                    "name": "Test User",
                    "email": "test@example.com",
                    "postal_code": "98052"
                })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);

    // Simulate the authorization URL generation
    let authorize_url =
        client.authorization_url("test_state", &[Scope::Profile, Scope::PostalCode]);
    assert!(authorize_url.starts_with(&format!("{}/ap/oa", server.uri())));
    assert!(authorize_url.contains("state=test_state"));
    assert!(authorize_url.contains("scope=profile%20postal_code"));
    assert!(authorize_url.contains("response_type=code"));

    let token = client
        .exchange_code("test_code")
        .await
        .expect("Failed to exchange code");

    assert_eq!(token.access_token, "test_access_token");
    assert_eq!(token.expires_in, Some(3600));
    assert_eq!(token.refresh_token, Some("test_refresh_token".to_string()));

    let profile = client
        .fetch_profile(&token.access_token)
        .await
        .expect("Failed to fetch profile");

    assert_eq!(profile.user_id, "amzn1.account.AEXAMPLE");
    assert_eq!(profile.name, "Test User");
    assert_eq!(profile.email, "test@example.com");
    assert_eq!(profile.postal_code, Some("98052".to_string()));
    assert!(profile.extra_data.is_empty());
}

#[tokio::test]
async fn authorization_url_defaults_to_profile_scope() {
    let client = AmazonClient::new(
        "test_client_id".to_string(),
        "test_client_secret".to_string(),
        "https://example.com/callback".to_string(),
    );

    let authorize_url = client.authorization_url("test_state", &[]);
    assert!(authorize_url.starts_with("https://www.amazon.com/ap/oa?"));
    assert!(authorize_url.contains("scope=profile&"));
    assert!(authorize_url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Fcallback"));
}

#[tokio::test]
async fn exchange_surfaces_provider_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/o2/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .append_header("content-type", "application/json")
                .set_body_json(serde_json::json!({
                    "error": "invalid_grant",
                    "error_description": "The request has an invalid grant parameter"
                })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.exchange_code("expired_code").await.unwrap_err();

    match err {
        AuthError::Provider(message) => {
            assert!(message.contains("invalid_grant"));
            assert!(message.contains("invalid grant parameter"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn exchange_rejects_empty_access_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/o2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("content-type", "application/json")
                .set_body_json(serde_json::json!({
                    "access_token": "",
                    "token_type": "bearer"
                })),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.exchange_code("test_code").await.unwrap_err();

    match err {
        AuthError::Provider(message) => assert!(message.contains("empty access token")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn profile_fetch_reports_http_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.fetch_profile("stale_token").await.unwrap_err();

    match err {
        AuthError::Provider(message) => assert!(message.contains("401")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn authenticated_get_returns_raw_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/extra"))
        .and(header("Authorization", "Bearer test_access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("content-type", "application/json")
                .set_body_json(serde_json::json!({ "postal_code": "98052" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server);

    let value = client
        .authenticated_get(&format!("{}/extra", server.uri()), "test_access_token")
        .await
        .expect("Failed to fetch extra data");
    assert_eq!(value["postal_code"], "98052");

    let err = client
        .authenticated_get(&format!("{}/broken", server.uri()), "test_access_token")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Provider(_)));
}

#[tokio::test]
async fn from_config_fails_closed_without_credentials() {
    let err = AmazonClient::from_config(&ProviderConfig::default())
        .err()
        .expect("missing credentials must fail closed");
    assert!(matches!(err, AuthError::Configuration(_)));

    let config = ProviderConfig {
        client_id: "test_client_id".to_string(),
        client_secret: "test_client_secret".to_string(),
        redirect_uri: "https://example.com/callback".to_string(),
        ..Default::default()
    };
    let client = AmazonClient::from_config(&config).expect("valid config");
    let authorize_url = client.authorization_url("test_state", &[Scope::Profile]);
    assert!(authorize_url.starts_with("https://www.amazon.com/ap/oa?"));
}

#[tokio::test]
async fn from_config_rejects_malformed_proxy() {
    let config = ProviderConfig {
        client_id: "test_client_id".to_string(),
        client_secret: "test_client_secret".to_string(),
        proxy_url: Some("not a proxy url".to_string()),
        ..Default::default()
    };

    let err = AmazonClient::from_config(&config)
        .err()
        .expect("a malformed proxy must fail closed");
    assert!(matches!(err, AuthError::Configuration(_)));
}
