use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::server::server::AppState;
use crate::signing::SignError;
use crate::sources::FetchError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/access_token/{secret}", get(get_access_token))
        .route("/js_ticket/{secret}", get(get_js_ticket))
        .route("/js_sdk/signature", get(get_signature))
}

/// Shared-secret gate: checked before any cache or upstream work.
fn secret_matches(state: &AppState, presented: &str) -> bool {
    !presented.is_empty() && presented == state.settings.server_secret
}

async fn get_access_token(State(state): State<AppState>, Path(secret): Path<String>) -> Response {
    if !secret_matches(&state, &secret) {
        return forbidden("bad token");
    }
    match state.access_tokens.fetch().await {
        Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
        Err(e) => fetch_error_response(e),
    }
}

async fn get_js_ticket(State(state): State<AppState>, Path(secret): Path<String>) -> Response {
    if !secret_matches(&state, &secret) {
        return forbidden("bad token");
    }
    match state.tickets.fetch().await {
        Ok(ticket) => (StatusCode::OK, Json(json!({ "token": ticket }))).into_response(),
        Err(e) => fetch_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct SignatureQuery {
    url: String,
}

async fn get_signature(
    State(state): State<AppState>,
    Query(query): Query<SignatureQuery>,
) -> Response {
    match state.signer.sign(&query.url).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e @ (SignError::BadUrl | SignError::ForbiddenDomain)) => forbidden(&e.to_string()),
        Err(SignError::Fetch(e)) => fetch_error_response(e),
    }
}

/// Dependency failures propagate unchanged: the provider's own error
/// envelope is returned verbatim, transport failures map to 502.
fn fetch_error_response(e: FetchError) -> Response {
    match e {
        FetchError::Provider(provider) => {
            (StatusCode::NOT_FOUND, Json(provider)).into_response()
        }
        FetchError::Decode(e) => {
            warn!(error = %e, "discarding unrecognized provider response");
            (StatusCode::NOT_FOUND, Json(json!({ "detail": "unrecognized provider response" })))
                .into_response()
        }
        FetchError::Transport(e) => {
            error!(error = %e, "upstream transport failure");
            (StatusCode::BAD_GATEWAY, Json(json!({ "detail": "upstream unavailable" })))
                .into_response()
        }
    }
}

fn forbidden(detail: &str) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "detail": detail }))).into_response()
}
