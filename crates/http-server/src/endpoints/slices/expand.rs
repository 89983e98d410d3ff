use super::crud::SlicePathRequest;
use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, slice_error_response};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use slice_manager::{ExpandOptions, FeatureSlice};
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SliceExpandResponses {
    #[serde(rename = "200")]
    pub ok: Option<FeatureSlice>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
    #[serde(rename = "500")]
    pub internal_server_error: Option<StatusResponse>,
}

pub struct SliceExpandEndpointConfig;

impl EndpointConfigTypes for SliceExpandEndpointConfig {
    type PathRequest = SlicePathRequest;
    type BodyRequest = ExpandOptions;
    type QueryRequest = EmptyRequest;
    type Response = SliceExpandResponses;
}

define_endpoint! {
    SliceExpandEndpoint,
    SliceExpandEndpointDef,
    Post,
    "/slices/{id}/expand",
    ts_path_type = "`/api/slices/${string}/expand`",
    config = SliceExpandEndpointConfig
}

/// Grow a slice over call and inheritance edges.
///
/// Omitted option fields take their defaults: one round with every edge family.
pub async fn slice_expand_handler(
    State(state): State<AppState>,
    Path(path_params): Path<SlicePathRequest>,
    Json(options): Json<ExpandOptions>,
) -> Response {
    match state.slices.expand(&path_params.id, options) {
        Ok(slice) => (StatusCode::OK, Json(slice)).into_response(),
        Err(e) => slice_error_response(&e),
    }
}
