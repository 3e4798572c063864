//! Capabilities of the host the logout flow runs in.
//!
//! A storage area that the host does not provide is simply absent from the
//! [`Environment`]; clearing it becomes a no-op.

use std::{sync::Arc, time::Duration};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage access denied: {0}")]
    AccessDenied(String),
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("unexpected storage error: {0}")]
    Unexpected(String),
}

/// A key-value area such as `localStorage` or `sessionStorage`.
pub trait KeyValueStorage: Send + Sync {
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

/// The cookie header of the current document.
///
/// Cookies cannot be removed directly, only overwritten with an expired
/// directive through [`CookieDocument::set_cookie`].
pub trait CookieDocument: Send + Sync {
    /// `name=value` pairs separated by `; `.
    fn cookie(&self) -> String;

    fn set_cookie(&self, directive: &str) -> Result<(), StorageError>;
}

pub trait Navigator: Send + Sync {
    /// The full URL of the current page.
    fn href(&self) -> String;

    /// Navigates to `url` once `delay` has elapsed. There is no way to
    /// observe or cancel the navigation afterwards.
    fn navigate(&self, url: &str, delay: Duration);
}

#[derive(Clone)]
pub struct Environment {
    pub local_storage: Option<Arc<dyn KeyValueStorage>>,
    pub session_storage: Option<Arc<dyn KeyValueStorage>>,
    pub document: Option<Arc<dyn CookieDocument>>,
    pub navigator: Arc<dyn Navigator>,
}

impl Environment {
    /// An environment with no storage at all.
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            local_storage: None,
            session_storage: None,
            document: None,
            navigator,
        }
    }

    pub fn with_local_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.local_storage = Some(storage);
        self
    }

    pub fn with_session_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.session_storage = Some(storage);
        self
    }

    pub fn with_document(mut self, document: Arc<dyn CookieDocument>) -> Self {
        self.document = Some(document);
        self
    }
}
