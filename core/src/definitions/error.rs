use thiserror::Error;

/// Why a definition refresh did not publish a new table.
///
/// None of these are fatal: the previously published table stays current.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("refresh cancelled")]
    Cancelled,

    #[error("failed to read definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed definition payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("definition payload contained no usable entries")]
    EmptyTable,
}
