use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, error_response};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use indexer::stats::BuildStatistics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct RebuildResponses {
    #[serde(rename = "200")]
    pub ok: Option<BuildStatistics>,
    #[serde(rename = "409")]
    pub conflict: Option<StatusResponse>,
    #[serde(rename = "500")]
    pub internal_server_error: Option<StatusResponse>,
}

pub struct RebuildEndpointConfig;

impl EndpointConfigTypes for RebuildEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = RebuildResponses;
}

define_endpoint! {
    RebuildEndpoint,
    RebuildEndpointDef,
    Post,
    "/knowledge-graph/rebuild",
    ts_path_type = "\"/api/knowledge-graph/rebuild\"",
    config = RebuildEndpointConfig
}

/// Re-index the served project and swap the new graph in.
///
/// Reads keep being answered from the previous snapshot while the build runs.
pub async fn rebuild_handler(State(state): State<AppState>) -> Response {
    let Ok(guard) = Arc::clone(&state.rebuild_lock).try_lock_owned() else {
        warn!("Rejected rebuild request, another rebuild is running");
        return error_response(StatusCode::CONFLICT, "rebuild_in_progress", None);
    };

    let executor = Arc::clone(&state.executor);
    let project_root = Arc::clone(&state.project_root);
    let handle = Arc::clone(state.querying.graph_handle());

    info!("Rebuilding knowledge graph for {}", project_root.display());
    let outcome = tokio::task::spawn_blocking(move || {
        let _guard = guard;
        executor.rebuild(&project_root, &handle)
    })
    .await;

    match outcome {
        Ok(Ok(statistics)) => {
            info!(
                "Installed graph generation {} with {} nodes",
                statistics.generation, statistics.node_count
            );
            (StatusCode::OK, Json(statistics)).into_response()
        }
        Ok(Err(e)) => {
            error!("Rebuild failed: {e:#}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "rebuild_failed",
                Some(e.to_string()),
            )
        }
        Err(e) => {
            error!("Rebuild task panicked: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "rebuild_failed", None)
        }
    }
}
