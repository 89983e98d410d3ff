use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, slice_error_response};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use slice_manager::{CreateSliceRequest, FeatureSlice, UpdateSliceRequest};
use ts_rs::TS;

#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SlicePathRequest {
    pub id: String,
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SliceListResponses {
    #[serde(rename = "200")]
    pub ok: Option<Vec<FeatureSlice>>,
    #[serde(rename = "201")]
    pub created: Option<FeatureSlice>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "500")]
    pub internal_server_error: Option<StatusResponse>,
}

pub struct SliceListEndpointConfig;

impl EndpointConfigTypes for SliceListEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = CreateSliceRequest;
    type QueryRequest = EmptyRequest;
    type Response = SliceListResponses;
}

// GET lists, POST creates
define_endpoint! {
    SliceListEndpoint,
    SliceListEndpointDef,
    Post,
    "/slices",
    ts_path_type = "\"/api/slices\"",
    config = SliceListEndpointConfig
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SliceResponses {
    #[serde(rename = "200")]
    pub ok: Option<FeatureSlice>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
    #[serde(rename = "500")]
    pub internal_server_error: Option<StatusResponse>,
}

pub struct SliceEndpointConfig;

impl EndpointConfigTypes for SliceEndpointConfig {
    type PathRequest = SlicePathRequest;
    type BodyRequest = UpdateSliceRequest;
    type QueryRequest = EmptyRequest;
    type Response = SliceResponses;
}

// GET reads, PUT updates, DELETE removes
define_endpoint! {
    SliceEndpoint,
    SliceEndpointDef,
    Put,
    "/slices/{id}",
    ts_path_type = "`/api/slices/${string}`",
    config = SliceEndpointConfig
}

pub async fn slice_list_handler(State(state): State<AppState>) -> Response {
    match state.slices.list() {
        Ok(slices) => (StatusCode::OK, Json(slices)).into_response(),
        Err(e) => slice_error_response(&e),
    }
}

pub async fn slice_create_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateSliceRequest>,
) -> Response {
    match state.slices.create(body) {
        Ok(slice) => (StatusCode::CREATED, Json(slice)).into_response(),
        Err(e) => slice_error_response(&e),
    }
}

pub async fn slice_get_handler(
    State(state): State<AppState>,
    Path(path_params): Path<SlicePathRequest>,
) -> Response {
    match state.slices.get(&path_params.id) {
        Ok(slice) => (StatusCode::OK, Json(slice)).into_response(),
        Err(e) => slice_error_response(&e),
    }
}

pub async fn slice_update_handler(
    State(state): State<AppState>,
    Path(path_params): Path<SlicePathRequest>,
    Json(body): Json<UpdateSliceRequest>,
) -> Response {
    match state.slices.update(&path_params.id, body) {
        Ok(slice) => (StatusCode::OK, Json(slice)).into_response(),
        Err(e) => slice_error_response(&e),
    }
}

pub async fn slice_delete_handler(
    State(state): State<AppState>,
    Path(path_params): Path<SlicePathRequest>,
) -> Response {
    match state.slices.delete(&path_params.id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => slice_error_response(&e),
    }
}
