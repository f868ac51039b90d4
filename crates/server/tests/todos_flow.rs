use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use configs::AppConfig;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use server::auth::issue_token;
use server::routes;
use server::startup::build_state;

const SECRET: &str = "test-secret";

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

struct TestApp {
    app: Router,
    data_file: String,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.data_file);
    }
}

async fn build_app() -> anyhow::Result<TestApp> {
    let mut cfg = AppConfig::default();
    cfg.storage.data_file = std::env::temp_dir()
        .join(format!("todos_flow_{}.json", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    cfg.auth.jwt_secret = SECRET.into();
    let state = build_state(&cfg).await?;
    Ok(TestApp { app: routes::build_router(state, cors()), data_file: cfg.storage.data_file })
}

fn bearer(subject: &str) -> String {
    let token = issue_token(SECRET, subject, chrono::Duration::minutes(10)).expect("sign token");
    format!("Bearer {token}")
}

async fn send(app: &Router, method: &str, uri: &str, who: Option<&str>, body: Option<Value>) -> anyhow::Result<(StatusCode, Value)> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(who) = who {
        req = req.header("authorization", bearer(who));
    }
    let req = match body {
        Some(b) => req.header("content-type", "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, value))
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let t = build_app().await?;
    let (status, body) = send(&t.app, "GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn todos_require_bearer_token() -> anyhow::Result<()> {
    let t = build_app().await?;
    let (status, _) = send(&t.app, "GET", "/todos", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .uri("/todos")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())?;
    assert_eq!(t.app.clone().oneshot(req).await?.status(), StatusCode::UNAUTHORIZED);

    let forged = issue_token("other-secret", "p1", chrono::Duration::minutes(10))?;
    let req = Request::builder()
        .uri("/todos")
        .header("authorization", format!("Bearer {forged}"))
        .body(Body::empty())?;
    assert_eq!(t.app.clone().oneshot(req).await?.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn lifecycle_over_http() -> anyhow::Result<()> {
    let t = build_app().await?;

    let (status, created) = send(&t.app, "POST", "/todos", Some("p1"), Some(json!({"title": "A", "body": "B", "tag": "x"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["owner"], "p1");
    assert_eq!(created["completed"], false);
    assert!(created["updated_at"].is_null());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, done) = send(&t.app, "POST", &format!("/todos/{id}/complete"), Some("p1"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["completed"], true);
    assert!(!done["updated_at"].is_null());

    let (status, err) = send(&t.app, "POST", &format!("/todos/{id}/complete"), Some("p1"), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], 1103);

    let (status, _) = send(&t.app, "GET", &format!("/todos/{id}"), Some("p2"), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, removed) = send(&t.app, "DELETE", &format!("/todos/{id}"), Some("p1"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed["id"], id.as_str());

    let (status, err) = send(&t.app, "GET", &format!("/todos/{id}"), Some("p1"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(err["error"].as_str().unwrap().contains(&id));
    Ok(())
}

#[tokio::test]
async fn update_validates_and_keeps_owner() -> anyhow::Result<()> {
    let t = build_app().await?;
    let (_, created) = send(&t.app, "POST", "/todos", Some("p1"), Some(json!({"title": "A", "body": "B"}))).await?;
    assert_eq!(created["tag"], "");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, err) = send(&t.app, "PUT", &format!("/todos/{id}"), Some("p1"), Some(json!({"title": "", "body": "B"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "empty title");

    // extra fields in the body cannot overwrite provenance
    let (status, updated) = send(
        &t.app,
        "PUT",
        &format!("/todos/{id}"),
        Some("p1"),
        Some(json!({"title": "A2", "body": "B2", "tag": "t", "owner": "p2", "id": "hijack"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["owner"], "p1");
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["created_at"], created["created_at"]);
    assert_eq!(updated["title"], "A2");

    let (status, _) = send(&t.app, "PUT", &format!("/todos/{id}"), Some("p2"), Some(json!({"title": "x", "body": "y"}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn list_and_tag_pages_are_caller_scoped() -> anyhow::Result<()> {
    let t = build_app().await?;
    for (who, tag) in [("p1", "x"), ("p1", "y"), ("p2", "x")] {
        let (status, _) = send(&t.app, "POST", "/todos", Some(who), Some(json!({"title": "t", "body": "b", "tag": tag}))).await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, mine) = send(&t.app, "GET", "/todos", Some("p1"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 2);

    // windows of two over the three stored records together cover every p1 "x" record once
    let mut found = 0;
    for (s, e) in [(0, 2), (2, 3)] {
        let (status, page) = send(&t.app, "GET", &format!("/todos/by-tag?tag=x&start={s}&end={e}"), Some("p1"), None).await?;
        assert_eq!(status, StatusCode::OK);
        for r in page.as_array().unwrap() {
            assert_eq!(r["owner"], "p1");
            assert_eq!(r["tag"], "x");
            found += 1;
        }
    }
    assert_eq!(found, 1);

    let (status, err) = send(&t.app, "GET", "/todos/by-tag?tag=x&start=0&end=3", Some("p1"), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], 1203);

    let (status, err) = send(&t.app, "GET", "/todos/by-tag?tag=x&start=0&end=9", Some("p1"), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], 1201);
    Ok(())
}

#[tokio::test]
async fn oversized_payload_is_rejected() -> anyhow::Result<()> {
    let t = build_app().await?;
    let big = "x".repeat(2048);
    let (status, err) = send(&t.app, "POST", "/todos", Some("p1"), Some(json!({"title": "A", "body": big}))).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(err["code"], 1302);

    let (_, mine) = send(&t.app, "GET", "/todos", Some("p1"), None).await?;
    assert!(mine.as_array().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn metrics_are_exposed() -> anyhow::Result<()> {
    let t = build_app().await?;
    send(&t.app, "GET", "/todos/missing", Some("p1"), None).await?;
    let req = Request::builder().uri("/metrics").body(Body::empty())?;
    let resp = t.app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(axum::body::to_bytes(resp.into_body(), usize::MAX).await?.to_vec())?;
    assert!(text.contains("todo_store_operations_total"));
    assert!(text.contains("not_found"));
    Ok(())
}

#[tokio::test]
async fn malformed_requests_get_json_errors() -> anyhow::Result<()> {
    let t = build_app().await?;

    let (status, err) = send(&t.app, "POST", "/todos", Some("p1"), Some(json!({"title": "a"}))).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], 1003);
    assert!(err["error"].as_str().unwrap().contains("body"));

    let (status, err) = send(&t.app, "GET", "/todos/by-tag?tag=x&start=-1&end=1", Some("p1"), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], 1003);
    assert!(err["error"].is_string());

    let (_, mine) = send(&t.app, "GET", "/todos", Some("p1"), None).await?;
    assert!(mine.as_array().unwrap().is_empty());
    Ok(())
}
