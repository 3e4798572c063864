use super::HtmlTemplate;
use crate::{
    memory::{MemoryCookieDocument, RecordingNavigator},
    server::LogoutState,
    Environment, LogoutHandler,
};
use askama::Template;
use axum::{
    extract::{OriginalUri, State, TypedHeader},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use std::{sync::Arc, time::Duration};
use tracing::instrument;

#[derive(Template)]
#[template(path = "redirect.html")]
struct RedirectTemplate {
    url: String,
    seconds: u64,
}

#[instrument(skip(state, cookies))]
pub async fn logout(
    State(state): State<LogoutState>,
    OriginalUri(uri): OriginalUri,
    cookies: Option<TypedHeader<headers::Cookie>>,
) -> Response {
    let document = Arc::new(match &cookies {
        Some(TypedHeader(cookies)) => MemoryCookieDocument::from_pairs(cookies.iter()),
        None => MemoryCookieDocument::new(),
    });
    let navigator = Arc::new(RecordingNavigator::new(format!(
        "{}{}",
        state.public_origin, uri
    )));
    // No web storage on the server side, only the request cookies.
    let env = Environment::new(navigator.clone()).with_document(document.clone());

    let mut handler = LogoutHandler::new(env);
    handler.init(state.overrides.clone());
    handler.execute().await;

    let mut response_headers = HeaderMap::new();
    for directive in document.written() {
        match HeaderValue::from_str(&directive) {
            Ok(value) => {
                response_headers.append(SET_COOKIE, value);
            }
            Err(error) => tracing::warn!(%error, %directive, "skipping cookie directive"),
        }
    }

    let Some((url, delay)) = navigator.last() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "logout did not navigate").into_response();
    };

    tracing::debug!(%url, ?delay, "logout response");

    if delay.is_zero() && HeaderValue::from_str(&url).is_ok() {
        (response_headers, Redirect::to(&url)).into_response()
    } else {
        let template = RedirectTemplate {
            url,
            seconds: whole_seconds(delay),
        };
        (response_headers, HtmlTemplate(template)).into_response()
    }
}

#[instrument(skip(state, cookies))]
pub async fn fallback(
    state: State<LogoutState>,
    original_uri: OriginalUri,
    cookies: Option<TypedHeader<headers::Cookie>>,
) -> Response {
    if is_logout_path(&original_uri.0) {
        logout(state, original_uri, cookies).await
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

fn is_logout_path(uri: &Uri) -> bool {
    uri.path().starts_with("/logout")
}

fn whole_seconds(delay: Duration) -> u64 {
    delay
        .as_secs()
        .saturating_add(u64::from(delay.subsec_nanos() > 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{server, ConfigOverrides, StorageStrategy};
    use axum::{
        body::Body,
        http::{header::COOKIE, Request},
    };
    use tower::ServiceExt;

    fn state(delay: Duration) -> LogoutState {
        LogoutState {
            public_origin: "https://auth.example.com".to_string(),
            overrides: ConfigOverrides {
                default_redirect_url: Some("https://login.example.com".to_string()),
                storage_strategy: Some(StorageStrategy::Cookie),
                clear_all_cookies: Some(true),
                redirect_delay: Some(delay),
                ..Default::default()
            },
        }
    }

    async fn get(state: LogoutState, uri: &str, cookie: Option<&str>) -> Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        server::app(state)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn redirects_to_next_and_expires_cookies() {
        let response = get(
            state(Duration::ZERO),
            "/logout?next=https%3A%2F%2Fapp.example.com&next=https%3A%2F%2Fdocs.example.com",
            Some("sid=1; csrf=2"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "https://app.example.com?next=https%3A%2F%2Fdocs.example.com"
        );

        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("sid=; expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(cookies[1].starts_with("csrf=; expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    }

    #[tokio::test]
    async fn accepts_next_without_question_mark() {
        let response = get(
            state(Duration::ZERO),
            "/logout&next=https%3A%2F%2Fapp.example.com",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "https://app.example.com");
    }

    #[tokio::test]
    async fn falls_back_to_default() {
        let response = get(state(Duration::ZERO), "/logout", None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "https://login.example.com");
    }

    #[tokio::test]
    async fn delayed_redirect_renders_page() {
        let response = get(
            state(Duration::from_millis(500)),
            "/logout?next=https%3A%2F%2Fapp.example.com",
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/html"));
    }

    #[tokio::test]
    async fn accepts_nested_logout_path() {
        let response = get(
            state(Duration::ZERO),
            "/logout/&next=https%3A%2F%2Fapp.example.com",
            Some("sid=1"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "https://app.example.com");
        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 1);
    }

    #[tokio::test]
    async fn repeated_cookie_expired_once() {
        let response = get(state(Duration::ZERO), "/logout", Some("sid=1; sid=2")).await;

        assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 1);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let response = get(state(Duration::ZERO), "/login", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rounds_delay_up() {
        assert_eq!(whole_seconds(Duration::ZERO), 0);
        assert_eq!(whole_seconds(Duration::from_millis(500)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(2000)), 2);
        assert_eq!(whole_seconds(Duration::from_millis(2001)), 3);
        assert_eq!(
            whole_seconds(Duration::from_millis(u64::MAX)),
            u64::MAX / 1000 + 1
        );
        assert_eq!(whole_seconds(Duration::MAX), u64::MAX);
    }
}
