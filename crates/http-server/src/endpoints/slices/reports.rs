use super::crud::SlicePathRequest;
use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, slice_error_response};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use slice_manager::SliceStatistics;
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SliceFilesResponses {
    #[serde(rename = "200")]
    pub ok: Option<Vec<String>>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct SliceFilesEndpointConfig;

impl EndpointConfigTypes for SliceFilesEndpointConfig {
    type PathRequest = SlicePathRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = SliceFilesResponses;
}

define_endpoint! {
    SliceFilesEndpoint,
    SliceFilesEndpointDef,
    Get,
    "/slices/{id}/files",
    ts_path_type = "`/api/slices/${string}/files`",
    config = SliceFilesEndpointConfig
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SliceStatisticsResponses {
    #[serde(rename = "200")]
    pub ok: Option<SliceStatistics>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct SliceStatisticsEndpointConfig;

impl EndpointConfigTypes for SliceStatisticsEndpointConfig {
    type PathRequest = SlicePathRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = SliceStatisticsResponses;
}

define_endpoint! {
    SliceStatisticsEndpoint,
    SliceStatisticsEndpointDef,
    Get,
    "/slices/{id}/statistics",
    ts_path_type = "`/api/slices/${string}/statistics`",
    config = SliceStatisticsEndpointConfig
}

/// Sorted distinct files of the slice's resolvable members
pub async fn slice_files_handler(
    State(state): State<AppState>,
    Path(path_params): Path<SlicePathRequest>,
) -> Response {
    match state.slices.files(&path_params.id) {
        Ok(files) => (StatusCode::OK, Json(files)).into_response(),
        Err(e) => slice_error_response(&e),
    }
}

pub async fn slice_statistics_handler(
    State(state): State<AppState>,
    Path(path_params): Path<SlicePathRequest>,
) -> Response {
    match state.slices.statistics(&path_params.id) {
        Ok(statistics) => (StatusCode::OK, Json(statistics)).into_response(),
        Err(e) => slice_error_response(&e),
    }
}
