use crate::{handler, ConfigOverrides, LogoutSettings, TracingObserver};
use axum::{
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Per-process state shared by every logout request. Each request builds
/// its own handler from these overrides.
#[derive(Clone)]
pub struct LogoutState {
    pub public_origin: String,
    pub overrides: ConfigOverrides,
}

impl From<LogoutSettings> for LogoutState {
    fn from(settings: LogoutSettings) -> Self {
        let public_origin = settings.public_origin.trim_end_matches('/').to_string();
        let mut overrides = settings.into_overrides();
        overrides.observer = Some(Some(Arc::new(TracingObserver)));

        Self {
            public_origin,
            overrides,
        }
    }
}

pub fn app(state: LogoutState) -> Router {
    Router::new()
        .route("/logout", get(handler::logout))
        .fallback(handler::fallback)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .on_request(|request: &Request<_>, _span: &Span| {
                    tracing::info!(method = %request.method(), uri = %request.uri(), "request");
                })
                .on_response(|response: &Response, latency: Duration, _span: &Span| {
                    tracing::info!(status = %response.status(), ?latency, "response");
                }),
        )
}

pub async fn start_server(settings: LogoutSettings) -> anyhow::Result<()> {
    let addr = settings.bind_address;
    let app = app(LogoutState::from(settings));

    tracing::debug!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
