use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use gotv_core::{Engine, MemoryStore};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

const AUTH: &str = "s3cr3t";

fn app() -> Router {
    let engine = Arc::new(Engine::new(Arc::new(MemoryStore::new()), AUTH.to_string(), 0, 3.0));
    gotv_server::routes::router(engine)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post(app: &Router, path: &str, auth: Option<&str>, body: Vec<u8>) -> StatusCode {
    let mut builder = Request::builder().method("POST").uri(path);
    if let Some(auth) = auth {
        builder = builder.header("X-Origin-Auth", auth);
    }
    let req = builder.body(Body::from(body)).unwrap();
    app.clone().oneshot(req).await.unwrap().status()
}

#[tokio::test]
async fn s1_happy_path() {
    let app = app();

    assert_eq!(
        post(
            &app,
            "/sAAAt1111111111/100/start?tps=128.0&map=de_dust2&protocol=4",
            Some(AUTH),
            vec![0xDE, 0xAD],
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(
        post(&app, "/sAAAt1111111111/100/full?tick=500", Some(AUTH), vec![0xFF, 0x01]).await,
        StatusCode::OK
    );
    assert_eq!(
        post(
            &app,
            "/sAAAt1111111111/100/delta?endtick=600&final=false",
            Some(AUTH),
            vec![0x02, 0x03],
        )
        .await,
        StatusCode::OK
    );

    let req = Request::builder()
        .uri("/sAAAt1111111111/sync")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["tick"], 500);
    assert_eq!(json["signup_fragment"], 100);
    assert_eq!(json["tps"], 128);
    assert_eq!(json["map"], "de_dust2");
    assert_eq!(json["protocol"], 4);
    assert_eq!(json["fragment"], 100);
}

#[tokio::test]
async fn s2_missing_match_resets() {
    let app = app();
    let status = post(&app, "/sBBBt2222222222/50/full?tick=1", Some(AUTH), vec![]).await;
    assert_eq!(status, StatusCode::RESET_CONTENT);
}

#[tokio::test]
async fn s3_bad_auth_rejected() {
    let app = app();
    let status = post(
        &app,
        "/sCCCt3333333333/1/start?tps=64.0&map=de_mirage&protocol=1",
        None,
        vec![],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status = post(
        &app,
        "/sCCCt3333333333/1/start?tps=64.0&map=de_mirage&protocol=1",
        Some("wrong"),
        vec![],
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn s4_sync_before_delta_is_not_found() {
    let app = app();
    post(
        &app,
        "/sDDDt4444444444/1/start?tps=64.0&map=de_mirage&protocol=1",
        Some(AUTH),
        vec![],
    )
    .await;
    post(&app, "/sDDDt4444444444/1/full?tick=10", Some(AUTH), vec![]).await;

    let req = Request::builder()
        .uri("/sDDDt4444444444/sync")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn s5_explicit_fragment_ignores_delay() {
    let engine = Arc::new(Engine::new(Arc::new(MemoryStore::new()), AUTH.to_string(), 8, 3.0));
    let app = gotv_server::routes::router(engine);

    post(
        &app,
        "/sEEEt5555555555/100/start?tps=128.0&map=de_dust2&protocol=4",
        Some(AUTH),
        vec![],
    )
    .await;
    post(&app, "/sEEEt5555555555/100/full?tick=500", Some(AUTH), vec![]).await;
    post(
        &app,
        "/sEEEt5555555555/100/delta?endtick=600&final=false",
        Some(AUTH),
        vec![],
    )
    .await;

    let req = Request::builder()
        .uri("/sEEEt5555555555/sync?fragment=100")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["fragment"], 100);
}

#[tokio::test]
async fn s6_relegation_prefers_newest_token() {
    let app = app();

    post(
        &app,
        "/sFFFt1111111111/1/start?tps=64.0&map=de_mirage&protocol=1&id=m1",
        Some(AUTH),
        vec![],
    )
    .await;
    post(
        &app,
        "/sGGGt2222222222/1/start?tps=64.0&map=de_mirage&protocol=1&id=m1",
        Some(AUTH),
        vec![],
    )
    .await;

    let req = Request::builder()
        .uri("/admin/matches/by-id/m1")
        .header("X-Origin-Auth", AUTH)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token"], "sGGGt2222222222");
}
