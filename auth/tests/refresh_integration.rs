//! Integration tests for the token refresh middleware.
//!
//! The next executor is a scripted `MockExecutor`; protected routes accept only
//! the token the refresh endpoint hands out.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use estate_api_auth::{RefreshConfig, RefreshPhase, SessionHooks, TokenRefresh, TokenRefreshLayer};
use estate_api_core::{
    codes, ApiRequest, ApiResponse, ErrorKind, Layer, Method, RequestExecutor, StatusCode,
};
use estate_api_testing::{init_tracing, respond, MockExecutor};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const REFRESH: &str = "/auth/refresh-token";
const FRESH_TOKEN: &str = "new123";

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Default, Clone)]
struct HookLog {
    refreshed: Arc<Mutex<Vec<String>>>,
    auth_errors: Arc<AtomicUsize>,
    last_error_code: Arc<Mutex<Option<String>>>,
}

impl HookLog {
    fn hooks(&self) -> SessionHooks {
        let refreshed = Arc::clone(&self.refreshed);
        let auth_errors = Arc::clone(&self.auth_errors);
        let last_error_code = Arc::clone(&self.last_error_code);

        SessionHooks::new()
            .with_on_token_refresh(move |token| refreshed.lock().unwrap().push(token.to_string()))
            .with_on_auth_error(move |error| {
                auth_errors.fetch_add(1, Ordering::SeqCst);
                *last_error_code.lock().unwrap() = error.code().map(str::to_string);
            })
    }

    fn refreshed(&self) -> Vec<String> {
        self.refreshed.lock().unwrap().clone()
    }

    fn auth_errors(&self) -> usize {
        self.auth_errors.load(Ordering::SeqCst)
    }
}

/// Protected route that only accepts the freshly issued token.
fn protect(mock: &MockExecutor, path: &str, delay: Duration) {
    mock.on_delayed(Method::GET, path, delay, |req| {
        if respond::bearer(req) == Some(FRESH_TOKEN) {
            respond::json(req, json!({ "path": req.path }))
        } else {
            respond::unauthorized(req)
        }
    });
}

fn refresh_succeeds(mock: &MockExecutor, delay: Duration) {
    mock.on_delayed(Method::POST, REFRESH, delay, |req| {
        respond::json(
            req,
            json!({
                "message": "Token refreshed",
                "access_token": FRESH_TOKEN,
                "refresh_token": "cookie-only",
            }),
        )
    });
}

fn client(mock: &MockExecutor, log: &HookLog) -> TokenRefresh<MockExecutor> {
    init_tracing();
    TokenRefreshLayer::new(RefreshConfig::default(), log.hooks())
        .with_access_token("stale")
        .layer(mock.clone())
}

// ============================================================================
// Pass-through behavior
// ============================================================================

#[tokio::test]
async fn test_valid_token_is_attached_without_refresh() {
    let mock = MockExecutor::new();
    protect(&mock, "/user/profile", Duration::ZERO);
    let log = HookLog::default();
    let client = client(&mock, &log);
    client.set_access_token(FRESH_TOKEN);

    let response = client.execute(ApiRequest::get("/user/profile")).await.unwrap();

    assert_eq!(response.body, json!({ "path": "/user/profile" }));
    assert_eq!(mock.calls_to(REFRESH), 0);
    assert_eq!(
        mock.authorization_headers("/user/profile"),
        vec![Some("Bearer new123".to_string())]
    );
}

#[tokio::test]
async fn test_missing_token_sends_no_authorization_header() {
    let mock = MockExecutor::new();
    mock.on(Method::GET, "/site-settings/contacts", |req| respond::json(req, json!({})));
    let log = HookLog::default();
    let client = client(&mock, &log);
    client.clear_access_token();

    client.execute(ApiRequest::get("/site-settings/contacts")).await.unwrap();

    assert_eq!(mock.authorization_headers("/site-settings/contacts"), vec![None]);
}

#[tokio::test]
async fn test_public_paths_skip_token_and_refresh() {
    let mock = MockExecutor::new();
    mock.on(Method::POST, "/auth/login", |req| respond::unauthorized(req));
    refresh_succeeds(&mock, Duration::ZERO);
    let log = HookLog::default();
    let client = client(&mock, &log);

    let error = client
        .execute(ApiRequest::post("/auth/login").with_body(json!({ "email": "a@b.c" })))
        .await
        .unwrap_err();

    assert_eq!(error.status(), 401);
    assert_eq!(error.code(), Some(codes::UNKNOWN_ERROR));
    assert_eq!(mock.authorization_headers("/auth/login"), vec![None]);
    assert_eq!(mock.calls_to(REFRESH), 0);
    assert_eq!(log.auth_errors(), 0);
}

#[tokio::test]
async fn test_non_auth_errors_propagate_without_refresh() {
    let mock = MockExecutor::new();
    mock.on(Method::GET, "/items", |req| {
        respond::status(req, StatusCode::INTERNAL_SERVER_ERROR, None)
    });
    let log = HookLog::default();
    let client = client(&mock, &log);

    let error = client.execute(ApiRequest::get("/items")).await.unwrap_err();

    assert_eq!(error.status(), 500);
    assert_eq!(mock.calls_to(REFRESH), 0);
    assert_eq!(mock.calls_to("/items"), 1);
}

#[tokio::test]
async fn test_network_errors_propagate_without_refresh() {
    let mock = MockExecutor::new();
    mock.on(Method::GET, "/items", |req| respond::network_error(req));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let error = client.execute(ApiRequest::get("/items")).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::NetworkUnreachable);
    assert_eq!(mock.calls_to(REFRESH), 0);
}

// ============================================================================
// Refresh and replay
// ============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let mock = MockExecutor::new();
    protect(&mock, "/user/profile", Duration::ZERO);
    refresh_succeeds(&mock, Duration::ZERO);
    let log = HookLog::default();
    let client = client(&mock, &log);

    let response = client.execute(ApiRequest::get("/user/profile")).await.unwrap();

    assert_eq!(response.body, json!({ "path": "/user/profile" }));
    assert_eq!(mock.calls_to(REFRESH), 1);
    assert_eq!(
        mock.authorization_headers("/user/profile"),
        vec![Some("Bearer stale".to_string()), Some("Bearer new123".to_string())]
    );
    assert_eq!(mock.authorization_headers(REFRESH), vec![None]);
    assert_eq!(log.refreshed(), vec![FRESH_TOKEN.to_string()]);
    assert_eq!(log.auth_errors(), 0);
    assert_eq!(client.access_token().as_deref(), Some(FRESH_TOKEN));
    assert_eq!(client.phase(), RefreshPhase::Idle);
}

#[tokio::test]
async fn test_concurrent_failures_share_one_refresh() {
    let mock = MockExecutor::new();
    let paths = ["/a", "/b", "/c", "/d", "/e"];
    for path in paths {
        protect(&mock, path, Duration::from_millis(20));
    }
    refresh_succeeds(&mock, Duration::from_millis(50));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let results = futures::future::join_all(
        paths.iter().map(|path| client.execute(ApiRequest::get(*path))),
    )
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(mock.calls_to(REFRESH), 1);
    for path in paths {
        assert_eq!(
            mock.authorization_headers(path),
            vec![Some("Bearer stale".to_string()), Some("Bearer new123".to_string())],
            "unexpected headers for {path}"
        );
    }
    assert_eq!(log.refreshed(), vec![FRESH_TOKEN.to_string()]);
}

#[tokio::test]
async fn test_requests_issued_during_refresh_wait_for_new_token() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    protect(&mock, "/late", Duration::ZERO);
    refresh_succeeds(&mock, Duration::from_millis(50));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let leader = {
        let client = client.clone();
        tokio::spawn(async move { client.execute(ApiRequest::get("/a")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.phase(), RefreshPhase::Refreshing);

    let late = client.execute(ApiRequest::get("/late")).await.unwrap();

    assert_eq!(late.body, json!({ "path": "/late" }));
    assert!(leader.await.unwrap().is_ok());
    assert_eq!(mock.calls_to(REFRESH), 1);
    assert_eq!(
        mock.authorization_headers("/late"),
        vec![Some("Bearer new123".to_string())]
    );
}

#[tokio::test]
async fn test_dropped_leader_does_not_strand_followers() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    protect(&mock, "/b", Duration::ZERO);
    refresh_succeeds(&mock, Duration::from_millis(50));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        client.execute(ApiRequest::get("/a")),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(client.phase(), RefreshPhase::Refreshing);

    let follower = client.execute(ApiRequest::get("/b")).await.unwrap();

    assert_eq!(follower.body, json!({ "path": "/b" }));
    assert_eq!(mock.calls_to(REFRESH), 1);
    assert_eq!(log.refreshed(), vec![FRESH_TOKEN.to_string()]);
}

#[tokio::test]
async fn test_token_replaced_after_rejection_replays_without_refresh() {
    let mock = MockExecutor::new();
    let log = HookLog::default();
    let client = client(&mock, &log);

    let setter = client.clone();
    mock.on_delayed(Method::GET, "/a", Duration::from_millis(20), move |req| {
        if respond::bearer(req) == Some(FRESH_TOKEN) {
            respond::json(req, json!("ok"))
        } else {
            // The user logs in again while this request is on the wire.
            setter.set_access_token(FRESH_TOKEN);
            respond::unauthorized(req)
        }
    });
    refresh_succeeds(&mock, Duration::ZERO);

    let response = client.execute(ApiRequest::get("/a")).await.unwrap();

    assert_eq!(response.body, json!("ok"));
    assert_eq!(mock.calls_to(REFRESH), 0);
    assert!(log.refreshed().is_empty());
}

// ============================================================================
// Failure paths
// ============================================================================

#[tokio::test]
async fn test_refresh_failure_fans_out_to_all_waiters() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::from_millis(20));
    protect(&mock, "/b", Duration::from_millis(20));
    mock.on_delayed(Method::POST, REFRESH, Duration::from_millis(30), |req| {
        respond::unauthorized(req)
    });
    let log = HookLog::default();
    let client = client(&mock, &log);

    let (a, b) = futures::join!(
        client.execute(ApiRequest::get("/a")),
        client.execute(ApiRequest::get("/b")),
    );

    let (a, b) = (a.unwrap_err(), b.unwrap_err());
    assert_eq!(a, b);
    assert_eq!(a.kind(), ErrorKind::AuthExhausted);
    assert_eq!(a.code(), Some(codes::AUTH_REFRESH_FAILED));
    assert_eq!(a.status(), 401);
    assert_eq!(a.instance(), REFRESH);
    assert_eq!(mock.calls_to(REFRESH), 1);
    assert_eq!(mock.calls_to("/a"), 1);
    assert_eq!(mock.calls_to("/b"), 1);
    assert_eq!(log.auth_errors(), 1);
    assert!(log.refreshed().is_empty());
    assert_eq!(client.phase(), RefreshPhase::Idle);
    assert_eq!(client.access_token().as_deref(), Some("stale"));
}

#[tokio::test]
async fn test_refresh_problem_detail_passes_through() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    let problem = json!({
        "type": "https://api.example.com/problems/accounts-token-expired",
        "title": "Token expired",
        "status": 401,
        "detail": "Refresh token has expired",
        "instance": REFRESH,
        "code": "ACCOUNTS_TOKEN_EXPIRED",
    });
    let body = problem.clone();
    mock.on(Method::POST, REFRESH, move |req| {
        respond::status(req, StatusCode::UNAUTHORIZED, Some(body.clone()))
    });
    let log = HookLog::default();
    let client = client(&mock, &log);

    let error = client.execute(ApiRequest::get("/a")).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::ServerProblem);
    assert_eq!(error.code(), Some("ACCOUNTS_TOKEN_EXPIRED"));
    assert_eq!(error.payload(), Some(&problem));
    assert_eq!(log.auth_errors(), 1);
}

#[tokio::test]
async fn test_malformed_refresh_response_is_auth_failure() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    mock.on(Method::POST, REFRESH, |req| respond::json(req, json!({ "message": "ok" })));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let error = client.execute(ApiRequest::get("/a")).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AuthExhausted);
    assert_eq!(error.code(), Some(codes::AUTH_REFRESH_FAILED));
    assert_eq!(log.auth_errors(), 1);
}

#[tokio::test]
async fn test_second_rejection_is_terminal() {
    let mock = MockExecutor::new();
    mock.on(Method::GET, "/admin", |req| respond::unauthorized(req));
    refresh_succeeds(&mock, Duration::ZERO);
    let log = HookLog::default();
    let client = client(&mock, &log);

    let error = client.execute(ApiRequest::get("/admin")).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AuthExhausted);
    assert_eq!(error.code(), Some(codes::AUTH_RETRY_EXHAUSTED));
    assert_eq!(error.status(), 401);
    assert_eq!(error.instance(), "/admin");
    assert_eq!(mock.calls_to(REFRESH), 1);
    assert_eq!(mock.calls_to("/admin"), 2);
    assert_eq!(log.refreshed(), vec![FRESH_TOKEN.to_string()]);
    assert_eq!(log.auth_errors(), 1);
    assert_eq!(*log.last_error_code.lock().unwrap(), Some(codes::AUTH_RETRY_EXHAUSTED.to_string()));
}

#[tokio::test]
async fn test_zero_retry_budget_never_refreshes() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    refresh_succeeds(&mock, Duration::ZERO);
    let log = HookLog::default();
    let client = TokenRefreshLayer::new(
        RefreshConfig::default().with_max_refresh_attempts(0),
        log.hooks(),
    )
    .with_access_token("stale")
    .layer(mock.clone());

    let error = client.execute(ApiRequest::get("/a")).await.unwrap_err();

    assert_eq!(error.code(), Some(codes::AUTH_RETRY_EXHAUSTED));
    assert_eq!(mock.calls_to(REFRESH), 0);
}

#[tokio::test]
async fn test_later_failure_starts_a_new_refresh() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    refresh_succeeds(&mock, Duration::ZERO);
    let log = HookLog::default();
    let client = client(&mock, &log);

    client.execute(ApiRequest::get("/a")).await.unwrap();
    client.set_access_token("expired-again");
    client.execute(ApiRequest::get("/a")).await.unwrap();

    assert_eq!(mock.calls_to(REFRESH), 2);
    assert_eq!(log.refreshed().len(), 2);
}

// ============================================================================
// Owner token changes during a refresh
// ============================================================================

#[tokio::test]
async fn test_clear_during_refresh_discards_refreshed_token() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    refresh_succeeds(&mock, Duration::from_millis(50));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.execute(ApiRequest::get("/a")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.phase(), RefreshPhase::Refreshing);

    client.clear_access_token();
    let error = pending.await.unwrap().unwrap_err();

    assert_eq!(client.access_token(), None);
    assert!(log.refreshed().is_empty());
    assert_eq!(error.code(), Some(codes::AUTH_RETRY_EXHAUSTED));
    assert_eq!(
        mock.authorization_headers("/a"),
        vec![Some("Bearer stale".to_string()), None]
    );
    assert_eq!(mock.calls_to(REFRESH), 1);
}

#[tokio::test]
async fn test_login_during_refresh_keeps_owner_token() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    mock.on_delayed(Method::POST, REFRESH, Duration::from_millis(50), |req| {
        respond::json(req, json!({ "message": "ok", "access_token": "rotated" }))
    });
    let log = HookLog::default();
    let client = client(&mock, &log);

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.execute(ApiRequest::get("/a")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    client.set_access_token(FRESH_TOKEN);
    let response = pending.await.unwrap().unwrap();

    assert_eq!(response.body, json!({ "path": "/a" }));
    assert_eq!(client.access_token().as_deref(), Some(FRESH_TOKEN));
    assert!(log.refreshed().is_empty());
    assert_eq!(log.auth_errors(), 0);
}

// ============================================================================
// Retry budget across joined refreshes
// ============================================================================

#[tokio::test]
async fn test_request_joining_refresh_is_replayed_once() {
    let mock = MockExecutor::new();
    mock.on(Method::GET, "/a", |req| respond::unauthorized(req));
    mock.on(Method::GET, "/late", |req| respond::unauthorized(req));
    refresh_succeeds(&mock, Duration::from_millis(50));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let leader = {
        let client = client.clone();
        tokio::spawn(async move { client.execute(ApiRequest::get("/a")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let late = client.execute(ApiRequest::get("/late")).await.unwrap_err();
    let leader = leader.await.unwrap().unwrap_err();

    assert_eq!(late.code(), Some(codes::AUTH_RETRY_EXHAUSTED));
    assert_eq!(leader.code(), Some(codes::AUTH_RETRY_EXHAUSTED));
    assert_eq!(mock.calls_to(REFRESH), 1);
    assert_eq!(
        mock.authorization_headers("/late"),
        vec![Some("Bearer new123".to_string())]
    );
    assert_eq!(log.auth_errors(), 1);
}

#[tokio::test]
async fn test_concurrent_exhaustion_fires_auth_error_once() {
    let mock = MockExecutor::new();
    let paths = ["/x", "/y", "/z"];
    for path in paths {
        mock.on_delayed(Method::GET, path, Duration::from_millis(20), |req| {
            respond::unauthorized(req)
        });
    }
    refresh_succeeds(&mock, Duration::from_millis(30));
    let log = HookLog::default();
    let client = client(&mock, &log);

    let results = futures::future::join_all(
        paths.iter().map(|path| client.execute(ApiRequest::get(*path))),
    )
    .await;

    for result in results {
        assert_eq!(result.unwrap_err().code(), Some(codes::AUTH_RETRY_EXHAUSTED));
    }
    assert_eq!(mock.calls_to(REFRESH), 1);
    assert_eq!(log.refreshed(), vec![FRESH_TOKEN.to_string()]);
    assert_eq!(log.auth_errors(), 1);
}

#[tokio::test]
async fn test_empty_refresh_token_reports_response_status() {
    let mock = MockExecutor::new();
    protect(&mock, "/a", Duration::ZERO);
    mock.on(Method::POST, REFRESH, |req| {
        Ok(ApiResponse::new(
            StatusCode::CREATED,
            json!({ "message": "ok", "access_token": "" }),
            req.path.clone(),
        ))
    });
    let log = HookLog::default();
    let client = client(&mock, &log);

    let error = client.execute(ApiRequest::get("/a")).await.unwrap_err();

    assert_eq!(error.code(), Some(codes::AUTH_REFRESH_FAILED));
    assert_eq!(error.status(), 201);
    assert_eq!(error.instance(), REFRESH);
}
