use thiserror::Error;

/// Error taxonomy for the analysis core.
///
/// `InvalidInput` and `Division` are caller errors raised by the pure
/// computation layers; the remaining variants describe data-retrieval
/// outcomes and are produced by the fetchers.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no data in requested range: {0}")]
    EmptyResult(String),

    #[error("ticker not found: {0}")]
    NotFound(String),

    #[error("upstream source '{upstream}' unavailable: {reason}")]
    UpstreamUnavailable { upstream: &'static str, reason: String },

    #[error("zero denominator in {0}")]
    Division(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
