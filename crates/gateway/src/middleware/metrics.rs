//! Per-request metrics recording
//!
//! Labels use the matched route pattern, not the raw path, so
//! cardinality stays bounded regardless of ids in the URL.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use signet_common::metrics::RequestMetrics;

pub async fn track_metrics(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().to_string();

    let tracker = RequestMetrics::start(&method, &endpoint);
    let response = next.run(request).await;
    tracker.finish(response.status().as_u16());

    response
}
