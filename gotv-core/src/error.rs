use thiserror::Error;

/// Typed failure modes returned by the engine to its adapter.
///
/// The engine never recovers from these locally; callers (the HTTP adapter,
/// admin tooling) map each variant to a status code or CLI exit path.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid authentication")]
    InvalidAuth,
    #[error("match not found")]
    MatchNotFound,
    #[error("fragment not found")]
    FragmentNotFound,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("backing store error: {0}")]
    Io(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            EngineError::FragmentNotFound
        } else {
            EngineError::Io(e.to_string())
        }
    }
}
