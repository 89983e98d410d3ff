use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct ServerInfoResponse {
    pub port: u16,
    pub project_path: String,
    #[ts(type = "number")]
    pub generation: u64,
    #[ts(type = "string")]
    pub built_at: DateTime<Utc>,
    pub node_count: usize,
    pub relationship_count: usize,
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct InfoResponses {
    #[serde(rename = "200")]
    pub ok: ServerInfoResponse,
}

pub struct InfoEndpointConfig;

impl EndpointConfigTypes for InfoEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = InfoResponses;
}

define_endpoint! {
    InfoEndpoint,
    InfoEndpointDef,
    Get,
    "/info",
    ts_path_type = "\"/api/info\"",
    config = InfoEndpointConfig
}

/// Handler for the info endpoint
/// Returns the port and a summary of the graph generation currently served
pub async fn info_handler(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    let graph = state.querying.snapshot();
    Json(ServerInfoResponse {
        port: state.port,
        project_path: state.project_root.display().to_string(),
        generation: graph.generation(),
        built_at: graph.built_at(),
        node_count: graph.store().node_count(),
        relationship_count: graph.store().relationship_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{shop_app_state, test_server};

    #[tokio::test]
    async fn test_info_describes_current_generation() {
        let (state, project) = shop_app_state();
        let server = test_server(&state);

        let response = server.get("/api/info").await;

        response.assert_status_ok();
        let info: ServerInfoResponse = response.json();
        assert_eq!(info.generation, 1);
        assert_eq!(info.project_path, project.path().display().to_string());
        assert_eq!(info.node_count, state.querying.snapshot().store().node_count());
        assert!(info.relationship_count > 0);
    }
}
