use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{PathPrefixQueryRequest, non_empty};
use axum::extract::{Query, State};
use axum::response::Json;
use querying::state_machine::StateMachineInfo;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct StateMachinesResponses {
    #[serde(rename = "200")]
    pub ok: Vec<StateMachineInfo>,
}

pub struct StateMachinesEndpointConfig;

impl EndpointConfigTypes for StateMachinesEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = PathPrefixQueryRequest;
    type Response = StateMachinesResponses;
}

define_endpoint! {
    StateMachinesEndpoint,
    StateMachinesEndpointDef,
    Get,
    "/state-machines",
    ts_path_type = "\"/api/state-machines\"",
    config = StateMachinesEndpointConfig
}

pub async fn state_machines_handler(
    State(state): State<AppState>,
    Query(query_params): Query<PathPrefixQueryRequest>,
) -> Json<Vec<StateMachineInfo>> {
    let machines = state
        .querying
        .state_machines(non_empty(query_params.path.as_deref()));
    debug!("Found {} state machines", machines.len());
    Json(machines)
}
