use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use authgate::api;
use authgate::api::auth::AUTHORIZED_USER_HEADER;
use authgate::config::Config;
use authgate::token::{Claims, ISSUER, TokenCodec};

const JWT_KEY: &str = "integration-test-signing-key-0123456789";
const ADMIN_PASSWORD: &str = "admin-test-password";

async fn spawn_app() -> Router {
    let config = Config {
        pg_dsn: "sqlite::memory:".to_string(),
        jwt_key: JWT_KEY.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    };
    config.validate().expect("valid test config");

    let state = api::create_app_state(&config)
        .await
        .expect("Failed to create app state");
    api::router(state)
}

fn form_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_login_and_validate_roundtrip() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(form_request(
            "/login",
            format!("username=admin&password={ADMIN_PASSWORD}"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    let token = body["token"].as_str().expect("token in response");

    let response = app
        .oneshot(form_request("/validate", format!("token={token}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let subject = response
        .headers()
        .get(AUTHORIZED_USER_HEADER)
        .expect("subject header")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(subject.len(), 32);
    assert!(subject.chars().all(|c| c.is_ascii_hexdigit()));

    let body = body_json(response.into_body()).await;
    assert_eq!(body["detail"], "Token is valid");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app().await;

    // Wrong password and unknown user get byte-identical responses
    for body in [
        "username=admin&password=wrong".to_string(),
        format!("username=ghost&password={ADMIN_PASSWORD}"),
    ] {
        let response = app
            .clone()
            .oneshot(form_request("/login", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["detail"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_validate_rejects_garbage() {
    let app = spawn_app().await;

    let response = app
        .oneshot(form_request("/validate", "token=not.a.token".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["detail"], "Token is invalid");
}

#[tokio::test]
async fn test_validate_rejects_foreign_signature() {
    let app = spawn_app().await;

    let foreign = TokenCodec::new("some-other-signing-key-0123456789abcdef");
    let token = foreign.issue(uuid::Uuid::new_v4()).unwrap();

    let response = app
        .oneshot(form_request("/validate", format!("token={token}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["detail"], "Token is invalid");
}

#[tokio::test]
async fn test_validate_rejects_expired_token() {
    let app = spawn_app().await;

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: uuid::Uuid::new_v4().simple().to_string(),
        exp: now - 3600,
        iat: now - 7200,
        jti: uuid::Uuid::new_v4().simple().to_string(),
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_KEY.as_bytes()),
    )
    .unwrap();

    let response = app
        .oneshot(form_request("/validate", format!("token={token}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["detail"], "Token has expired");
}
