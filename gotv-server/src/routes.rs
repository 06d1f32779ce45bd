use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::Router;
use gotv_core::{Engine, EngineError, parse_token};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AdapterError, IngestError};

const AUTH_HEADER: &str = "X-Origin-Auth";

fn check_auth(engine: &Engine, headers: &HeaderMap) -> Result<(), EngineError> {
    let secret = headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(EngineError::InvalidAuth)?;
    if engine.auth(secret) {
        Ok(())
    } else {
        Err(EngineError::InvalidAuth)
    }
}

/// Builds the full router: ingest, serve, and admin route groups sharing one
/// `Arc<Engine>` as axum state.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/:token/:fragment/start", post(ingest_start).get(serve_start))
        .route("/:token/:fragment/full", post(ingest_full).get(serve_full))
        .route("/:token/:fragment/delta", post(ingest_delta).get(serve_delta))
        .route("/:token/sync", get(serve_sync))
        .route("/admin", get(admin_index))
        .route("/admin/matches", get(admin_list_matches))
        .route("/admin/matches/by-id/:id", get(admin_get_by_id))
        .route("/admin/matches/:token", delete(admin_delete))
        .route("/admin/matches/:token/tag", post(admin_tag))
        .route("/admin/matches/:token/save", post(admin_save))
        .route("/admin/load", post(admin_load))
        .route("/admin/tokens/:token/parse", get(admin_parse_token))
        .with_state(engine)
}

// ---- Ingest ----

#[derive(Deserialize)]
struct StartQuery {
    tps: f64,
    map: String,
    protocol: u32,
    id: Option<String>,
}

#[instrument(skip(engine, headers, body))]
async fn ingest_start(
    State(engine): State<Arc<Engine>>,
    Path((token, fragment)): Path<(String, u32)>,
    Query(q): Query<StartQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, IngestError> {
    let result: Result<(), EngineError> = async {
        check_auth(&engine, &headers)?;
        engine
            .on_start(&token, fragment, body.to_vec(), q.tps, q.map, q.protocol, q.id)
            .await
    }
    .await;
    match result {
        Ok(()) => {
            metrics::counter!("gotv_ingest.start.successful").increment(1);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            metrics::counter!("gotv_ingest.start.failure").increment(1);
            Err(IngestError(e))
        }
    }
}

#[derive(Deserialize)]
struct FullQuery {
    tick: u64,
}

#[instrument(skip(engine, headers, body))]
async fn ingest_full(
    State(engine): State<Arc<Engine>>,
    Path((token, fragment)): Path<(String, u32)>,
    Query(q): Query<FullQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, IngestError> {
    let result: Result<(), EngineError> = async {
        check_auth(&engine, &headers)?;
        engine.on_full(&token, fragment, q.tick, body.to_vec()).await
    }
    .await;
    match result {
        Ok(()) => {
            metrics::counter!("gotv_ingest.full.successful").increment(1);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            metrics::counter!("gotv_ingest.full.failure").increment(1);
            Err(IngestError(e))
        }
    }
}

#[derive(Deserialize)]
struct DeltaQuery {
    endtick: u64,
    #[serde(default)]
    r#final: bool,
}

#[instrument(skip(engine, headers, body))]
async fn ingest_delta(
    State(engine): State<Arc<Engine>>,
    Path((token, fragment)): Path<(String, u32)>,
    Query(q): Query<DeltaQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, IngestError> {
    let result: Result<(), EngineError> = async {
        check_auth(&engine, &headers)?;
        engine
            .on_delta(&token, fragment, q.endtick, q.r#final, body.to_vec())
            .await
    }
    .await;
    match result {
        Ok(()) => {
            metrics::counter!("gotv_ingest.delta.successful").increment(1);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            metrics::counter!("gotv_ingest.delta.failure").increment(1);
            Err(IngestError(e))
        }
    }
}

// ---- Serve ----

#[derive(Deserialize)]
struct SyncQuery {
    fragment: Option<u32>,
}

#[instrument(skip(engine))]
async fn serve_sync(
    State(engine): State<Arc<Engine>>,
    Path(token): Path<String>,
    Query(q): Query<SyncQuery>,
) -> Result<impl IntoResponse, AdapterError> {
    match engine.get_sync(&token, q.fragment) {
        Ok(sync) => {
            metrics::counter!("gotv_serve.sync.successful").increment(1);
            Ok(Json(sync))
        }
        Err(e) => {
            metrics::counter!("gotv_serve.sync.failure").increment(1);
            Err(AdapterError(e))
        }
    }
}

#[instrument(skip(engine))]
async fn serve_start(
    State(engine): State<Arc<Engine>>,
    Path((token, fragment)): Path<(String, u32)>,
) -> Result<impl IntoResponse, AdapterError> {
    match engine.get_start(&token, fragment).await {
        Ok(body) => {
            metrics::counter!("gotv_serve.start.successful").increment(1);
            Ok(raw_body(body))
        }
        Err(e) => {
            metrics::counter!("gotv_serve.start.failure").increment(1);
            Err(AdapterError(e))
        }
    }
}

#[instrument(skip(engine))]
async fn serve_full(
    State(engine): State<Arc<Engine>>,
    Path((token, fragment)): Path<(String, u32)>,
) -> Result<impl IntoResponse, AdapterError> {
    match engine.get_full(&token, fragment).await {
        Ok(body) => {
            metrics::counter!("gotv_serve.full.successful").increment(1);
            Ok(raw_body(body))
        }
        Err(e) => {
            metrics::counter!("gotv_serve.full.failure").increment(1);
            Err(AdapterError(e))
        }
    }
}

#[instrument(skip(engine))]
async fn serve_delta(
    State(engine): State<Arc<Engine>>,
    Path((token, fragment)): Path<(String, u32)>,
) -> Result<impl IntoResponse, AdapterError> {
    match engine.get_delta(&token, fragment).await {
        Ok(body) => {
            metrics::counter!("gotv_serve.delta.successful").increment(1);
            Ok(raw_body(body))
        }
        Err(e) => {
            metrics::counter!("gotv_serve.delta.failure").increment(1);
            Err(AdapterError(e))
        }
    }
}

fn raw_body(body: Vec<u8>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/octet-stream")],
        body,
    )
}

// ---- Admin ----

async fn admin_index(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    let matches = engine.list_matches();
    let mut page = format!("gotv-server: {} live match(es)\n\n", matches.len());
    for m in matches {
        page.push_str(&format!(
            "token={} id={:?} latest={} signup_fragment={} map={}\n",
            m.token, m.id, m.latest, m.signup_fragment, m.map
        ));
    }
    Ok((StatusCode::OK, page))
}

async fn admin_list_matches(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    Ok(Json(engine.list_matches()))
}

async fn admin_get_by_id(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    engine
        .get_by_id(&id)
        .map(Json)
        .ok_or_else(|| AdapterError(EngineError::MatchNotFound))
}

async fn admin_delete(
    State(engine): State<Arc<Engine>>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    engine.delete(&token)?;
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
struct TagRequest {
    id: String,
}

async fn admin_tag(
    State(engine): State<Arc<Engine>>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(req): Json<TagRequest>,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    engine.tag_id(&token, &req.id)?;
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
struct PathRequest {
    path: String,
}

#[derive(Serialize)]
struct LoadResponse {
    token: String,
}

async fn admin_save(
    State(engine): State<Arc<Engine>>,
    Path(token): Path<String>,
    headers: HeaderMap,
    Json(req): Json<PathRequest>,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    let blob = engine.save(&token).await?;
    tokio::fs::write(&req.path, blob)
        .await
        .map_err(|e| AdapterError(EngineError::Io(e.to_string())))?;
    Ok(StatusCode::OK)
}

async fn admin_load(
    State(engine): State<Arc<Engine>>,
    headers: HeaderMap,
    Json(req): Json<PathRequest>,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    let bytes = tokio::fs::read(&req.path)
        .await
        .map_err(|e| AdapterError(EngineError::Io(e.to_string())))?;
    let token = engine.load(&bytes).await?;
    Ok(Json(LoadResponse { token }))
}

async fn admin_parse_token(
    State(engine): State<Arc<Engine>>,
    Path(token): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AdapterError> {
    check_auth(&engine, &headers)?;
    match parse_token(&token) {
        Ok(parsed) => {
            let mut body = HashMap::new();
            body.insert("steam_id", parsed.steam_id);
            body.insert("timestamp", parsed.timestamp.to_string());
            Ok((StatusCode::OK, Json(body)).into_response())
        }
        Err(e) => Ok((StatusCode::BAD_REQUEST, e.to_string()).into_response()),
    }
}
