//! Hooks into the logout flow: the custom-clear callback and lifecycle
//! observers.

use crate::error::LogoutError;
use async_trait::async_trait;
use std::future::Future;

/// Clears storage the built-in strategies don't know about, e.g. an
/// in-memory store or an embedded database.
#[async_trait]
pub trait CustomClear: Send + Sync {
    async fn clear(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> CustomClear for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn clear(&self) -> anyhow::Result<()> {
        (self)().await
    }
}

/// Lifecycle events of a logout flow. Every method defaults to a no-op.
pub trait LogoutObserver: Send + Sync {
    fn on_logout_start(&self) {}

    fn on_logout_complete(&self) {}

    /// Called before the navigation to `url` is scheduled.
    fn on_redirect(&self, _url: &str) {}

    fn on_error(&self, _error: &LogoutError) {}
}

/// Reports each lifecycle event through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl LogoutObserver for TracingObserver {
    fn on_logout_start(&self) {
        tracing::info!("logout started");
    }

    fn on_logout_complete(&self) {
        tracing::info!("logout complete");
    }

    fn on_redirect(&self, url: &str) {
        tracing::info!(%url, "redirecting");
    }

    fn on_error(&self, error: &LogoutError) {
        tracing::warn!(%error, "logout failed");
    }
}
