use crate::storage::StorageError;
use thiserror::Error;

/// Failures raised while clearing authentication data.
#[derive(Debug, Error)]
pub enum LogoutError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("custom clear failed: {0}")]
    CustomClear(#[source] anyhow::Error),
}

/// Failures while reading the `next` target out of the current URL.
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("invalid url: {0}")]
    Parse(#[from] url::ParseError),
    #[error("malformed percent-encoding in {0:?}")]
    Decode(String),
}
