use thiserror::Error;

/// Failure of a single source attempt.
///
/// Every client call classifies its own failure so the caller never has
/// to sniff error internals: `Transport` means the source could not be
/// reached at all and is the circuit-breaker signal for the mirror
/// registry; `Data` means the source answered but the payload was
/// unusable for this call (bad status, parse failure, missing field,
/// empty item list) and must never penalize a mirror.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unusable response: {0}")]
    Data(String),
}

impl SourceError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

/// Error returned across the public resolver boundary.
///
/// Source-level failures never escape; they either advance the cascade
/// or aggregate into `Exhausted`.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input could not be classified, or the operation has no
    /// capable source.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Every source in the cascade failed.
    #[error("all sources exhausted for {operation}")]
    Exhausted { operation: String },
}
