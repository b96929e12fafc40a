use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use storefront_api::app::{self, AppServices};
use storefront_api::config::{AppConfig, Argon2Settings};
use storefront_auth::UserId;
use storefront_infra::{InMemoryUserStore, OutboxNotifier};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    outbox: Arc<OutboxNotifier>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_ttl(ChronoDuration::minutes(10)).await
    }

    async fn spawn_with_ttl(session_ttl: ChronoDuration) -> Self {
        let config = AppConfig {
            jwt_secret: JWT_SECRET.to_string(),
            session_ttl,
            argon2: Argon2Settings {
                m_cost: 1024,
                t_cost: 1,
                p_cost: 1,
            },
            ..AppConfig::default()
        };

        // Same router as prod, in-memory store, outbox instead of mail.
        let outbox = Arc::new(OutboxNotifier::new());
        let services = AppServices::new(&config, Arc::new(InMemoryUserStore::new()), outbox.clone())
            .expect("failed to wire services");
        let app = app::router(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            outbox,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: &str, role: &str, iat: i64, exp: i64) -> String {
    let claims = json!({
        "sub": sub,
        "email": "minted@example.com",
        "role": role,
        "iat": iat,
        "exp": exp,
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_valid(role: &str) -> String {
    let now = Utc::now().timestamp();
    mint_jwt(JWT_SECRET, &UserId::new().to_string(), role, now, now + 600)
}

async fn signup(client: &reqwest::Client, srv: &TestServer, name: &str, email: &str, password: &str) -> serde_json::Value {
    let res = client
        .post(srv.url("/auth"))
        .json(&json!({ "name": name, "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn login(client: &reqwest::Client, srv: &TestServer, email: &str, password: &str) -> reqwest::Response {
    client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap()
}

async fn login_token(client: &reqwest::Client, srv: &TestServer, email: &str, password: &str) -> String {
    let res = login(client, srv, email, password).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn error_code(res: reqwest::Response) -> String {
    let body: serde_json::Value = res.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn signup_never_exposes_password_hash() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let body = signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "User");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("passwordHash").is_none());
    assert!(!body.to_string().contains("argon2"));
}

#[tokio::test]
async fn login_sets_cookie_and_both_carriers_are_accepted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;

    let res = login(&client, &srv, "alice@example.com", "pw1").await;
    assert_eq!(res.status(), StatusCode::OK);

    let set_cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Secure"));
    assert!(set_cookie.contains("Max-Age=600"));

    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert!(set_cookie.starts_with(&format!("token={token};")));

    let via_cookie = client
        .get(srv.url("/auth/check"))
        .header(reqwest::header::COOKIE, format!("token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(via_cookie.status(), StatusCode::OK);
    let check: serde_json::Value = via_cookie.json().await.unwrap();
    assert_eq!(check["loggedIn"], true);
    assert_eq!(check["user"]["email"], "alice@example.com");
    assert_eq!(check["user"]["role"], "User");

    let via_bearer = client
        .get(srv.url("/auth/check"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(via_bearer.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;

    let res = client
        .post(srv.url("/auth"))
        .json(&json!({ "name": "Other", "email": "alice@example.com", "password": "pw2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(error_code(res).await, "conflict");
}

#[tokio::test]
async fn invalid_signup_input_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth"))
        .json(&json!({ "name": "Alice", "email": "not-an-email", "password": "pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "validation_error");
}

#[tokio::test]
async fn unknown_email_and_wrong_password_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;

    let wrong_pw = login(&client, &srv, "alice@example.com", "nope").await;
    let unknown = login(&client, &srv, "nobody@example.com", "pw1").await;

    assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

    let a: serde_json::Value = wrong_pw.json().await.unwrap();
    let b: serde_json::Value = unknown.json().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a["error"], "invalid_credentials");
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/auth/check")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "unauthenticated");
}

#[tokio::test]
async fn foreign_and_expired_tokens_are_told_apart() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let now = Utc::now().timestamp();
    let sub = UserId::new().to_string();

    let forged = mint_jwt("some-other-secret", &sub, "Admin", now, now + 600);
    let res = client.get(srv.url("/auth/check")).bearer_auth(forged).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_token");

    let expired = mint_jwt(JWT_SECRET, &sub, "Admin", now - 600, now - 60);
    let res = client.get(srv.url("/auth/check")).bearer_auth(expired).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "token_expired");

    let res = client
        .get(srv.url("/auth/check"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(error_code(res).await, "invalid_token");
}

#[tokio::test]
async fn cookie_takes_precedence_over_bearer() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/auth/check"))
        .header(reqwest::header::COOKIE, "token=garbage")
        .bearer_auth(mint_valid("User"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_token");
}

#[tokio::test]
async fn roles_are_exact_per_route() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/user")).bearer_auth(mint_valid("User")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "forbidden");

    let res = client.get(srv.url("/auth/admin")).bearer_auth(mint_valid("Staff")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(srv.url("/user")).bearer_auth(mint_valid("Admin")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn users_read_only_their_own_profile() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let alice = signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;
    let bob = signup(&client, &srv, "Bob", "bob@example.com", "pw2").await;
    let token = login_token(&client, &srv, "alice@example.com", "pw1").await;

    let own = client
        .get(srv.url(&format!("/user/{}", alice["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(own.status(), StatusCode::OK);

    let other = client
        .get(srv.url(&format!("/user/{}", bob["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_promotes_and_deletes_users() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_valid("Admin");
    let alice = signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;
    let id = alice["id"].as_str().unwrap();

    let res = client
        .put(srv.url(&format!("/user/{id}")))
        .bearer_auth(&admin)
        .json(&json!({ "role": "Staff" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let staff: serde_json::Value = client
        .get(srv.url("/user/staff"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(staff.as_array().unwrap().len(), 1);
    assert_eq!(staff[0]["id"], id);

    // A token issued after promotion carries the new role.
    let token = login_token(&client, &srv, "alice@example.com", "pw1").await;
    let check: serde_json::Value = client
        .get(srv.url("/auth/check"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(check["user"]["role"], "Staff");

    let res = client
        .delete(srv.url(&format!("/user/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(srv.url(&format!("/user/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_session_then_fresh_login() {
    let srv = TestServer::spawn_with_ttl(ChronoDuration::seconds(1)).await;
    let client = reqwest::Client::new();
    signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;
    let first = login_token(&client, &srv, "alice@example.com", "pw1").await;

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    let res = client.get(srv.url("/auth/check")).bearer_auth(&first).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "token_expired");

    let second = login_token(&client, &srv, "alice@example.com", "pw1").await;
    assert_ne!(first, second);
    let res = client.get(srv.url("/auth/check")).bearer_auth(&second).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn forgot_and_reset_password_flow() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;

    let unknown: serde_json::Value = client
        .post(srv.url("/auth/forgot-password"))
        .json(&json!({ "email": "nobody@example.com" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = client
        .post(srv.url("/auth/forgot-password"))
        .json(&json!({ "email": "alice@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let known: serde_json::Value = res.json().await.unwrap();
    assert_eq!(known, unknown);

    let sent = srv.outbox.sent();
    assert_eq!(sent.len(), 1);
    let token = srv.outbox.latest_for("alice@example.com").unwrap();

    let res = client
        .post(srv.url(&format!("/auth/reset-password/{token}")))
        .json(&json!({ "password": "pw2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url(&format!("/auth/reset-password/{token}")))
        .json(&json!({ "password": "pw3" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "invalid_or_expired_token");

    assert_eq!(login(&client, &srv, "alice@example.com", "pw1").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(login(&client, &srv, "alice@example.com", "pw2").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;
    let token = login_token(&client, &srv, "alice@example.com", "pw1").await;

    let res = client
        .post(srv.url("/auth/change-password"))
        .bearer_auth(&token)
        .json(&json!({ "oldPassword": "wrong", "newPassword": "pw2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "password_mismatch");
    assert_eq!(login(&client, &srv, "alice@example.com", "pw1").await.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/auth/change-password"))
        .bearer_auth(&token)
        .json(&json!({ "oldPassword": "pw1", "newPassword": "pw2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Outstanding sessions are not revoked by a password change.
    let res = client.get(srv.url("/auth/check")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_clears_cookie_but_token_stays_valid() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    signup(&client, &srv, "Alice", "alice@example.com", "pw1").await;
    let token = login_token(&client, &srv, "alice@example.com", "pw1").await;

    let res = client
        .post(srv.url("/auth/logout"))
        .header(reqwest::header::COOKIE, format!("token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let set_cookie = res.headers().get(reqwest::header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("token=;"));
    assert!(set_cookie.contains("Max-Age=0"));

    let res = client.get(srv.url("/auth/check")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
