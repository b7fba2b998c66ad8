use thiserror::Error;

/// Backend or transport failure on one of the prediction API calls.
///
/// `Display` is the short message shown to the user: the backend's `error`
/// field when it sent one, otherwise the generic message for the operation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("{context}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Setup(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select both teams")]
    MissingTeam,
    #[error("Please select different teams")]
    IdenticalTeams,
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// A persisted slot that could not be read back. Always recovered as a cache miss.
#[derive(Debug, Error)]
pub enum CacheReadError {
    #[error("slot {key} unreadable: {message}")]
    Io { key: &'static str, message: String },
    #[error("slot {key} holds malformed json: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
