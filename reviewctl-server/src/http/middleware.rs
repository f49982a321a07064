//! Request timeout middleware
//!
//! Answers a slow request with the usual error envelope instead of an
//! empty body.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;

/// Run the rest of the stack, giving up after `limit`.
pub async fn request_timeout(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, limit_ms = limit.as_millis() as u64, "request timed out");
            ApiError::Timeout { limit }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    fn app(limit: Duration) -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(middleware::from_fn_with_state(limit, request_timeout))
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_gets_error_envelope() {
        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(15)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "REQUEST_TIMEOUT");
        assert_eq!(body["error"]["message"], "request exceeded 15s");
    }

    #[tokio::test(start_paused = true)]
    async fn fast_request_passes_through() {
        let request = Request::builder().uri("/fast").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(15)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"done");
    }
}
