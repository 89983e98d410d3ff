use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{
    PathPrefixQueryRequest, StatusResponse, bad_request, non_empty, query_error_response,
};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use querying::complexity::FileComplexity;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct ProjectComplexityResponses {
    #[serde(rename = "200")]
    pub ok: Vec<FileComplexity>,
}

pub struct ProjectComplexityEndpointConfig;

impl EndpointConfigTypes for ProjectComplexityEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = PathPrefixQueryRequest;
    type Response = ProjectComplexityResponses;
}

define_endpoint! {
    ProjectComplexityEndpoint,
    ProjectComplexityEndpointDef,
    Get,
    "/analysis/complexity",
    ts_path_type = "\"/api/analysis/complexity\"",
    config = ProjectComplexityEndpointConfig
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct FileComplexityResponses {
    #[serde(rename = "200")]
    pub ok: Option<FileComplexity>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct FileComplexityEndpointConfig;

impl EndpointConfigTypes for FileComplexityEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = PathPrefixQueryRequest;
    type Response = FileComplexityResponses;
}

define_endpoint! {
    FileComplexityEndpoint,
    FileComplexityEndpointDef,
    Get,
    "/analysis/complexity/file",
    ts_path_type = "\"/api/analysis/complexity/file\"",
    config = FileComplexityEndpointConfig
}

/// Complexity of every file under the optional path prefix, most complex first
pub async fn project_complexity_handler(
    State(state): State<AppState>,
    Query(query_params): Query<PathPrefixQueryRequest>,
) -> Json<Vec<FileComplexity>> {
    Json(
        state
            .querying
            .project_complexity(non_empty(query_params.path.as_deref())),
    )
}

pub async fn file_complexity_handler(
    State(state): State<AppState>,
    Query(query_params): Query<PathPrefixQueryRequest>,
) -> Response {
    let Some(path) = non_empty(query_params.path.as_deref()) else {
        return bad_request("empty_path");
    };

    match state.querying.file_complexity(path) {
        Ok(complexity) => (StatusCode::OK, Json(complexity)).into_response(),
        Err(e) => query_error_response(&e),
    }
}
