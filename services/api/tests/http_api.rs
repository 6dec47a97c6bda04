//! Drives the full router over the in-memory backend and a stub GitHub.

use std::sync::{Arc, Mutex};

use api_lib::adapters::MemoryTodoStore;
use api_lib::config::Config;
use api_lib::web::{self, AppState};
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use todo_core::ports::{Clock, GitHubOAuthService, PortResult};
use todo_core::{AuthService, CredentialStore, GitHubEmail, GitHubUser, TodoService};
use tower::ServiceExt; // for `oneshot`

struct StubGitHub;

#[async_trait]
impl GitHubOAuthService for StubGitHub {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://github.com/login/oauth/authorize?scope=user%3Aemail&state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> PortResult<String> {
        Ok(format!("gho_{}", code))
    }

    async fn fetch_user(&self, _access_token: &str) -> PortResult<GitHubUser> {
        Ok(GitHubUser {
            id: 1,
            login: "octocat".to_string(),
            email: Some("octocat@github.test".to_string()),
            ..Default::default()
        })
    }

    async fn fetch_emails(&self, _access_token: &str) -> PortResult<Vec<GitHubEmail>> {
        Ok(Vec::new())
    }
}

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn config() -> Arc<Config> {
    let config = Config::from_lookup(|key| match key {
        "LOGIN_REDIRECT" => Some("/dashboard".to_string()),
        _ => None,
    })
    .unwrap();
    Arc::new(config)
}

fn app() -> Router {
    let state = AppState::new(config(), Arc::new(MemoryTodoStore::new()), Arc::new(StubGitHub));
    web::router(Arc::new(state))
}

/// A router whose auth service reads a hand-driven clock, plus its credential store.
fn app_with_clock() -> (Router, Arc<CredentialStore>, Arc<ManualClock>) {
    let credentials = Arc::new(CredentialStore::new());
    let clock = Arc::new(ManualClock(Mutex::new(Utc::now())));
    let state = AppState {
        config: config(),
        todos: TodoService::new(Arc::new(MemoryTodoStore::new())),
        auth: AuthService::with_clock(credentials.clone(), Arc::new(StubGitHub), clock.clone()),
    };
    (web::router(Arc::new(state)), credentials, clock)
}

/// Starts a GitHub login and returns the state handed to the browser.
async fn begin_github_login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/auth/github", None))
        .await
        .unwrap();
    set_cookies(&resp)
        .into_iter()
        .find_map(|c| {
            c.strip_prefix("oauth_state=")
                .and_then(|rest| rest.split(';').next())
                .map(str::to_string)
        })
        .unwrap()
}

fn github_callback(query: &str, state: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/auth/github/callback?{}", query))
        .header(header::COOKIE, format!("oauth_state={}", state))
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("auth_token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("auth_token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn read_json(response: Response<Body>) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

async fn register_and_login(app: &Router, email: &str) -> (String, String) {
    let creds = json!({"email": email, "password": "pw123"});
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", None, creds.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = read_json(resp).await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/login", None, creds))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let session = read_json(resp).await;
    (
        user["id"].as_str().unwrap().to_string(),
        session["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_public() {
    let resp = app()
        .oneshot(empty_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn register_login_and_manage_todos() {
    let app = app();
    let creds = json!({"email": "a@x.com", "password": "pw123"});

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/register", None, creds.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = read_json(resp).await;
    assert_eq!(user["email"], "a@x.com");
    assert!(user.get("password_hash").is_none());

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/auth/login", None, creds))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookies(&resp).join("\n");
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    let session = read_json(resp).await;
    assert_eq!(session["user_id"], user["id"]);
    let token = session["token"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/todos",
            Some(&token),
            json!({"title": "Buy milk", "description": "2%"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = read_json(resp).await;
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/todos", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list = read_json(resp).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Buy milk");
    assert_eq!(list[0]["completed"], false);

    let resp = app
        .clone()
        .oneshot(empty_request("PUT", &format!("/todos/{}/complete", id), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let completed = read_json(resp).await;
    assert_eq!(completed["completed"], true);
    assert_ne!(completed["updated_at"], created["updated_at"]);

    let resp = app
        .clone()
        .oneshot(empty_request("PUT", &format!("/todos/{}/incomplete", id), Some(&token)))
        .await
        .unwrap();
    assert_eq!(read_json(resp).await["completed"], false);

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/todos/{}", id), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/todos/{}", id), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register_and_login(&app, "dup@x.com").await;

    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            json!({"email": "dup@x.com", "password": "other"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn bad_logins_look_the_same() {
    let app = app();
    register_and_login(&app, "user@example.com").await;

    let wrong = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({"email": "user@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    let missing = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            json!({"email": "nosuchuser@example.com", "password": "x"}),
        ))
        .await
        .unwrap();

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(wrong).await, read_json(missing).await);
}

#[tokio::test]
async fn todos_require_a_session() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/todos", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(empty_request("GET", "/todos", Some("forged-token")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&resp)[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let app = app();
    let (user_id, token) = register_and_login(&app, "bearer@x.com").await;

    let request = Request::builder()
        .uri("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_json(resp).await["id"], user_id.as_str());
}

#[tokio::test]
async fn users_cannot_reach_each_others_todos() {
    let app = app();
    let (_, alice) = register_and_login(&app, "alice@x.com").await;
    let (_, bob) = register_and_login(&app, "bob@x.com").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/todos", Some(&alice), json!({"title": "Alice's"})))
        .await
        .unwrap();
    let id = read_json(resp).await["id"].as_str().unwrap().to_string();

    for (method, uri) in [
        ("GET", format!("/todos/{}", id)),
        ("PUT", format!("/todos/{}/complete", id)),
        ("DELETE", format!("/todos/{}", id)),
    ] {
        let resp = app
            .clone()
            .oneshot(empty_request(method, &uri, Some(&bob)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
    }

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/todos/{}", id),
            Some(&bob),
            json!({"title": "Bob's now"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .oneshot(empty_request("GET", &format!("/todos/{}", id), Some(&alice)))
        .await
        .unwrap();
    let todo = read_json(resp).await;
    assert_eq!(todo["title"], "Alice's");
    assert_eq!(todo["completed"], false);
}

#[tokio::test]
async fn malformed_ids_and_titles_are_bad_requests() {
    let app = app();
    let (_, token) = register_and_login(&app, "v@x.com").await;

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/todos/not-a-uuid", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(json_request("POST", "/todos", Some(&token), json!({"title": ""})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_clears_cookie_and_session() {
    let app = app();
    let (_, token) = register_and_login(&app, "out@x.com").await;

    let resp = app
        .clone()
        .oneshot(empty_request("POST", "/auth/logout", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(set_cookies(&resp)[0].contains("Max-Age=0"));

    // a second logout still clears the cookie
    let resp = app
        .clone()
        .oneshot(empty_request("POST", "/auth/logout", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(set_cookies(&resp)[0].contains("Max-Age=0"));

    let resp = app
        .oneshot(empty_request("GET", "/todos", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn github_round_trip_logs_in_once() {
    let app = app();

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/auth/github", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();
    let state_cookie = set_cookies(&resp)
        .into_iter()
        .find(|c| c.starts_with("oauth_state="))
        .unwrap();
    let state = state_cookie
        .trim_start_matches("oauth_state=")
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(location.ends_with(&format!("state={}", state)));

    let callback = |cookie_state: &str| {
        Request::builder()
            .uri(format!("/auth/github/callback?code=abc&state={}", state))
            .header(header::COOKIE, format!("oauth_state={}", cookie_state))
            .body(Body::empty())
            .unwrap()
    };

    // cookie and query disagree
    let resp = app.clone().oneshot(callback("tampered")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.clone().oneshot(callback(&state)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[header::LOCATION], "/dashboard");
    let cookies = set_cookies(&resp);
    assert!(cookies.iter().any(|c| c.starts_with("oauth_state=;")));
    let auth_cookie = cookies
        .iter()
        .find(|c| c.starts_with("auth_token="))
        .unwrap();
    let token = auth_cookie
        .trim_start_matches("auth_token=")
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let resp = app
        .clone()
        .oneshot(empty_request("GET", "/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(read_json(resp).await["email"], "octocat@github.test");

    // the state was consumed by the first callback
    let resp = app.oneshot(callback(&state)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn refused_or_codeless_callbacks_burn_the_state() {
    let (app, credentials, _) = app_with_clock();

    for query in ["error=access_denied", ""] {
        let state = begin_github_login(&app).await;
        let query = format!("{}&state={}", query, state);
        let resp = app
            .clone()
            .oneshot(github_callback(&query, &state))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", query);
        assert_eq!(credentials.state_count().await, 0, "{}", query);

        let replay = format!("code=abc&state={}", state);
        let resp = app
            .clone()
            .oneshot(github_callback(&replay, &state))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", query);
    }
}

#[tokio::test]
async fn expired_session_is_dropped_on_next_request() {
    let (app, credentials, clock) = app_with_clock();
    let (_, token) = register_and_login(&app, "late@x.com").await;
    assert_eq!(credentials.session_count().await, 1);

    clock.advance(Duration::hours(24) + Duration::seconds(1));
    let resp = app
        .oneshot(empty_request("GET", "/todos", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&resp)[0].contains("Max-Age=0"));
    assert_eq!(credentials.session_count().await, 0);
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let app = app();
    let (_, token) = register_and_login(&app, "fields@x.com").await;

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/todos", Some(&token), json!({"description": "x"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("title"));

    let resp = app
        .oneshot(json_request("POST", "/auth/register", None, json!({"password": "pw"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(read_json(resp).await["error"]
        .as_str()
        .unwrap()
        .contains("email"));
}
