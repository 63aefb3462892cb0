use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use rockview::api::{self, AppState};
use rockview::config::Params;

fn app() -> Router {
    api::routes(Arc::new(AppState::new(&Params::default())))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn payload() -> Value {
    json!({
        "dem": [[0.0, 1.0, 2.0], [1.0, 2.0, 3.0], [2.0, 3.0, 4.0]],
        "risk": [[0.7, 0.7, 0.7], [0.7, 0.7, 0.7], [0.7, 0.7, 0.9]]
    })
}

#[tokio::test]
async fn terrain_lifecycle() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/terrain", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "no terrain loaded");

    let (status, body) = call(&app, Method::POST, "/api/terrain", Some(payload())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 3);
    assert_eq!(body["mesh"]["surface"]["vertices"].as_array().unwrap().len(), 9);
    assert_eq!(body["mesh"]["wireframe"]["vertices"].as_array().unwrap().len(), 9);
    assert_eq!(body["summary"]["level"], "High");
    assert_eq!(body["summary"]["tone"], "yellow");
    assert_eq!(body["layers"].as_array().unwrap().len(), 2);
    assert!(body["layers"][0]["data_url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(body["mesh_builds"], 1);

    // Repeated mesh requests reuse the cached geometry.
    call(&app, Method::GET, "/api/mesh", None).await;
    call(&app, Method::GET, "/api/mesh", None).await;
    let (_, info) = call(&app, Method::GET, "/api/terrain", None).await;
    assert_eq!(info["mesh_builds"], 1);
}

#[tokio::test]
async fn invalid_dem_is_unprocessable() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/terrain",
        Some(json!({ "dem": [[1.0, 2.0], [3.0]] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("non-square or malformed grid"));

    let (status, _) = call(&app, Method::POST, "/api/terrain", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn elevation_only_terrain_reports_degraded() {
    let app = app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/terrain",
        Some(json!({ "dem": [[1.0, 2.0], [3.0, 4.0]], "risk": [[0.1]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["summary"].is_null());
    assert_eq!(body["degraded"]["kind"], "mismatched_risk");
    assert_eq!(body["layers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn pick_and_dismiss() {
    let app = app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/pick",
        Some(json!({ "u": 0.0, "v": 0.0, "worldPoint": [0.0, 0.0, 0.0] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    call(&app, Method::POST, "/api/terrain", Some(payload())).await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/pick",
        Some(json!({ "u": 1.0, "v": 0.0, "worldPoint": [250.0, 200.0, 250.0] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pick"]["cellX"], 2);
    assert_eq!(body["pick"]["cellY"], 2);
    assert_eq!(body["popup"]["tone"], "red");

    let (status, _) = call(&app, Method::DELETE, "/api/pick", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn trend_and_status_respond() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/trend", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["samples"].is_array());

    let (status, body) = call(&app, Method::GET, "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["status"]["label"].is_string());
    assert!(body["parameters"].is_array());
}

#[tokio::test]
async fn preloaded_terrain_is_served() {
    let dem = vec![vec![0.0, 1.0], vec![1.0, 2.0]];
    let t = rockview::terrain::load(&dem, None).unwrap();
    let state = AppState::new(&Params::default()).with_terrain(t).unwrap();
    let app = api::routes(Arc::new(state));
    let (status, body) = call(&app, Method::GET, "/api/terrain", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 2);
}
