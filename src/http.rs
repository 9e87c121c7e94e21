//! HTTP/JSON transport: a thin axum front over the three
//! core operations. Argument marshaling and error-to-status mapping only —
//! no business logic lives here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::engine::Engine;
use crate::error::AppError;
use crate::policy::Policy;
use crate::trace::TraceSink;

const PRINCIPAL_HEADER: &str = "x-emulator-principal";

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub sink: Arc<dyn TraceSink>,
    pub trace_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct TestPermissionsRequest {
    permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TestPermissionsResponse {
    permissions: Vec<String>,
}

/// `{resource}:{verb}` is Google's custom-method URL convention; axum has no
/// native support for a literal suffix after a wildcard path segment, so the
/// whole tail is captured and the verb is stripped off here.
fn resource_for(rest: &str, verb: &str) -> Result<String, AppError> {
    let suffix = format!(":{verb}");
    rest.strip_suffix(suffix.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::invalid_argument("invalid_method_suffix", format!("expected path to end with '{suffix}'")))
}

fn error_response(err: &AppError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(serde_json::json!({"status": "error", "code": err.code_str(), "message": err.message()}))).into_response()
}

fn principal_from(headers: &HeaderMap) -> String {
    headers.get(PRINCIPAL_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("").to_string()
}

async fn get_iam_policy(State(state): State<AppState>, Path(rest): Path<String>) -> Response {
    match resource_for(&rest, "getIamPolicy") {
        Ok(resource) => (StatusCode::OK, Json(state.engine.get_policy(&resource))).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn set_iam_policy(State(state): State<AppState>, Path(rest): Path<String>, Json(policy): Json<Policy>) -> Response {
    let resource = match resource_for(&rest, "setIamPolicy") {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    match state.engine.set_policy(&resource, policy) {
        Ok(stored) => (StatusCode::OK, Json(stored)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn test_iam_permissions(State(state): State<AppState>, Path(rest): Path<String>, headers: HeaderMap, Json(body): Json<TestPermissionsRequest>) -> Response {
    let resource = match resource_for(&rest, "testIamPermissions") {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    let principal = principal_from(&headers);
    match state.engine.test_permissions(&resource, &principal, &body.permissions, state.trace_enabled, state.sink.as_ref()) {
        Ok(allowed) => (StatusCode::OK, Json(TestPermissionsResponse { permissions: allowed })).into_response(),
        Err(e) => error_response(&e),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/v1/{*rest}", get(get_iam_policy).put(set_iam_policy).post(test_iam_permissions)).with_state(state)
}
