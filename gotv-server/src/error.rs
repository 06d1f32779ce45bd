use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gotv_core::EngineError;

/// Maps the engine's typed failures onto the wire contract's status codes.
/// `match-not-found` is context-sensitive (205 on ingest, 404 on serve/admin
/// reads) so write-path handlers special-case it themselves before falling
/// back to this impl for every other variant.
pub struct AdapterError(pub EngineError);

impl From<EngineError> for AdapterError {
    fn from(e: EngineError) -> Self {
        AdapterError(e)
    }
}

impl IntoResponse for AdapterError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::InvalidAuth => StatusCode::UNAUTHORIZED,
            EngineError::MatchNotFound => StatusCode::NOT_FOUND,
            EngineError::FragmentNotFound => StatusCode::NOT_FOUND,
            EngineError::InvalidToken(_) => StatusCode::BAD_REQUEST,
            EngineError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

/// Ingest-path wrapper: `match-not-found` becomes 205 Reset Content, a
/// signal to the origin to re-send its `start` fragment.
pub struct IngestError(pub EngineError);

impl From<EngineError> for IngestError {
    fn from(e: EngineError) -> Self {
        IngestError(e)
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        match self.0 {
            EngineError::MatchNotFound => (StatusCode::RESET_CONTENT, "match not found").into_response(),
            other => AdapterError(other).into_response(),
        }
    }
}
