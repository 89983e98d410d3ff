use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use database::graph::NodeId;
use querying::QueryError;
use serde::{Deserialize, Serialize};
use slice_manager::SliceError;
use tracing::error;
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug, Clone, PartialEq)]
#[ts(export, export_to = "api.ts")]
pub struct StatusResponse {
    pub status: String,
    /// Human-readable detail, e.g. the offending query token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct NodeIdPathRequest {
    pub id: String,
}

/// Optional project-relative path prefix filter
#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct PathPrefixQueryRequest {
    pub path: Option<String>,
}

pub fn create_error_response(status: &str) -> StatusResponse {
    StatusResponse {
        status: status.to_string(),
        detail: None,
    }
}

pub fn error_response(code: StatusCode, status: &str, detail: Option<String>) -> Response {
    (
        code,
        Json(StatusResponse {
            status: status.to_string(),
            detail,
        }),
    )
        .into_response()
}

pub fn bad_request(status: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, status, None)
}

pub fn parse_node_id(raw: &str) -> Result<NodeId, Response> {
    raw.trim().parse().map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_node_id",
            Some(format!("'{raw}' is not a node id")),
        )
    })
}

/// Empty or whitespace-only parameters count as absent
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn query_error_response(e: &QueryError) -> Response {
    match e {
        QueryError::InvalidQuery { .. } => {
            error_response(StatusCode::BAD_REQUEST, "invalid_query", Some(e.to_string()))
        }
        QueryError::NodeNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "node_not_found", Some(e.to_string()))
        }
        QueryError::NotFound { kind, .. } => error_response(
            StatusCode::NOT_FOUND,
            &format!("{}_not_found", kind.to_lowercase()),
            Some(e.to_string()),
        ),
    }
}

pub fn slice_error_response(e: &SliceError) -> Response {
    match e {
        SliceError::InvalidRequest(_) => {
            error_response(StatusCode::BAD_REQUEST, "invalid_request", Some(e.to_string()))
        }
        SliceError::UnknownNode(_) => {
            error_response(StatusCode::BAD_REQUEST, "unknown_node", Some(e.to_string()))
        }
        SliceError::NotFound(_) => {
            error_response(StatusCode::NOT_FOUND, "slice_not_found", Some(e.to_string()))
        }
        SliceError::Repository(_) => {
            error!("Slice repository failure: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "repository_error",
                Some(e.to_string()),
            )
        }
    }
}
