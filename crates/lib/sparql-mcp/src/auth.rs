//! API-key guard for the streamable HTTP transport.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Query parameter accepted in place of the header.
pub const API_KEY_QUERY_PARAM: &str = "api_key";

#[derive(Clone)]
struct ApiKey(Arc<str>);

#[derive(Debug, Default, Deserialize)]
struct ApiKeyQuery {
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// Wraps the routes of `router` so every request must present `api_key`.
/// `None` leaves the router open.
pub fn protect(router: Router, api_key: Option<String>) -> Router {
    match api_key.filter(|key| !key.trim().is_empty()) {
        Some(key) => router.route_layer(middleware::from_fn_with_state(
            ApiKey(Arc::from(key)),
            require_api_key,
        )),
        None => router,
    }
}

async fn require_api_key(
    State(expected): State<ApiKey>,
    query: Option<Query<ApiKeyQuery>>,
    request: Request,
    next: Next,
) -> Response {
    let from_header = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let from_query = query.as_ref().and_then(|Query(query)| query.api_key.as_deref());

    if from_header.or(from_query) == Some(&*expected.0) {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "rejected request with missing or invalid API key");
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Unauthorized - Invalid API key",
        }),
    )
        .into_response()
}
