pub mod contract;
pub mod endpoints;

#[cfg(test)]
pub mod testing;

use crate::{
    contract::EndpointContract,
    endpoints::{
        analysis::{
            callers::{AnalysisCallersEndpoint, analysis_callers_handler},
            complexity::{
                FileComplexityEndpoint, ProjectComplexityEndpoint, file_complexity_handler,
                project_complexity_handler,
            },
            dead_code::{DeadCodeEndpoint, dead_code_handler},
        },
        flow_graph::{
            FlowAnalyzeEndpoint, FlowComponentEndpoint, FlowTraceEndpoint, flow_analyze_handler,
            flow_component_handler, flow_trace_handler,
        },
        info::{InfoEndpoint, info_handler},
        knowledge_graph::{
            call_chain::{CallChainEndpoint, call_chain_handler},
            calls::{CalleesEndpoint, CallersEndpoint, callees_handler, callers_handler},
            inheritance::{
                HierarchyEndpoint, InheritsEndpoint, SubclassesEndpoint, hierarchy_handler,
                inherits_handler, subclasses_handler,
            },
            node::{NodeEndpoint, node_handler},
            query::{QueryEndpoint, query_handler},
            rebuild::{RebuildEndpoint, rebuild_handler},
            search::{SearchEndpoint, search_handler},
        },
        slices::{
            crud::{
                SliceEndpoint, SliceListEndpoint, slice_create_handler,
                slice_delete_handler, slice_get_handler, slice_list_handler,
                slice_update_handler,
            },
            expand::{SliceExpandEndpoint, slice_expand_handler},
            reports::{
                SliceFilesEndpoint, SliceStatisticsEndpoint, slice_files_handler,
                slice_statistics_handler,
            },
        },
        state_machines::{StateMachinesEndpoint, state_machines_handler},
    },
};

use anyhow::Result;
use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use database::graph::{GraphHandle, KnowledgeGraph};
use indexer::execution::{config::IndexingConfigBuilder, executor::IndexingExecutor};
use indexer::parsing::parser::JsonTreeParser;
use indexer::stats::BuildStatistics;
use querying::QueryingService;
use querying::layers::LayerRules;
use slice_manager::{DataDirectory, JsonFileRepository, SliceManager, SliceRepository};
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub querying: QueryingService,
    pub slices: Arc<SliceManager>,
    pub executor: Arc<IndexingExecutor>,
    /// Project the rebuild endpoint re-indexes
    pub project_root: Arc<PathBuf>,
    /// Held for the whole duration of a rebuild
    pub rebuild_lock: Arc<Mutex<()>>,
    pub port: u16,
}

impl AppState {
    pub fn new(
        graph: Arc<GraphHandle>,
        layer_rules: LayerRules,
        repository: Arc<dyn SliceRepository>,
        executor: IndexingExecutor,
        project_root: PathBuf,
        port: u16,
    ) -> Self {
        Self {
            querying: QueryingService::new(Arc::clone(&graph), layer_rules),
            slices: Arc::new(SliceManager::new(repository, graph)),
            executor: Arc::new(executor),
            project_root: Arc::new(project_root),
            rebuild_lock: Arc::new(Mutex::new(())),
            port,
        }
    }

    /// Index `project_root` and serve it with slices persisted under `data_directory`.
    ///
    /// Layer rules come from the project's `ckg.toml` when present.
    pub fn for_project(
        project_root: PathBuf,
        data_directory: &DataDirectory,
        threads: usize,
        port: u16,
    ) -> Result<(Self, BuildStatistics)> {
        let repository = JsonFileRepository::new(&data_directory.slices_dir)?;
        let executor = IndexingExecutor::new(
            Arc::new(JsonTreeParser::new()),
            IndexingConfigBuilder::build(threads),
        );
        let state = Self::new(
            Arc::new(GraphHandle::new(KnowledgeGraph::empty())),
            LayerRules::load(&project_root),
            Arc::new(repository),
            executor,
            project_root,
            port,
        );
        let statistics = state
            .executor
            .rebuild(&state.project_root, state.querying.graph_handle())?;
        Ok((state, statistics))
    }
}

/// Every endpoint, relative to the `/api` prefix
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route(InfoEndpoint::PATH, get(info_handler))
        .route(NodeEndpoint::PATH, get(node_handler))
        .route(CalleesEndpoint::PATH, get(callees_handler))
        .route(CallersEndpoint::PATH, get(callers_handler))
        .route(InheritsEndpoint::PATH, get(inherits_handler))
        .route(SubclassesEndpoint::PATH, get(subclasses_handler))
        .route(HierarchyEndpoint::PATH, get(hierarchy_handler))
        .route(CallChainEndpoint::PATH, get(call_chain_handler))
        .route(QueryEndpoint::PATH, get(query_handler))
        .route(SearchEndpoint::PATH, get(search_handler))
        .route(RebuildEndpoint::PATH, post(rebuild_handler))
        .route(AnalysisCallersEndpoint::PATH, get(analysis_callers_handler))
        .route(ProjectComplexityEndpoint::PATH, get(project_complexity_handler))
        .route(FileComplexityEndpoint::PATH, get(file_complexity_handler))
        .route(DeadCodeEndpoint::PATH, get(dead_code_handler))
        .route(StateMachinesEndpoint::PATH, get(state_machines_handler))
        .route(
            SliceListEndpoint::PATH,
            get(slice_list_handler).post(slice_create_handler),
        )
        .route(
            SliceEndpoint::PATH,
            get(slice_get_handler)
                .put(slice_update_handler)
                .delete(slice_delete_handler),
        )
        .route(SliceExpandEndpoint::PATH, post(slice_expand_handler))
        .route(SliceFilesEndpoint::PATH, get(slice_files_handler))
        .route(SliceStatisticsEndpoint::PATH, get(slice_statistics_handler))
        .route(FlowAnalyzeEndpoint::PATH, get(flow_analyze_handler))
        .route(FlowTraceEndpoint::PATH, get(flow_trace_handler))
        .route(FlowComponentEndpoint::PATH, get(flow_component_handler))
        .with_state(state)
}

pub fn app(state: AppState) -> Router {
    Router::new().nest("/api", api_router(state))
}

pub async fn run(state: AppState) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.port));
    let cors_layer = CorsLayer::new().allow_origin(tower_http::cors::AllowOrigin::predicate(
        |origin: &HeaderValue, _| {
            if let Ok(origin_str) = origin.to_str() {
                if let Ok(uri) = origin_str.parse::<http::Uri>() {
                    return uri.host() == Some("localhost");
                }
            }
            false
        },
    ));

    let app = app(state).layer(ServiceBuilder::new().layer(cors_layer));

    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let result = server.await;

    tracing::info!("HTTP server shut down gracefully");

    result.map_err(Into::into)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

// 'c' -> 0x63, 'k' -> 0x6b => 0x636b => 25451
pub const PREFERRED_PORT: u16 = 25451;

pub fn find_unused_port() -> Result<u16> {
    match TcpListener::bind(("127.0.0.1", PREFERRED_PORT)) {
        Ok(listener) => Ok(listener.local_addr()?.port()),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            tracing::info!(
                "Preferred port {} is busy, finding a random unused port",
                PREFERRED_PORT
            );
            let listener = TcpListener::bind("127.0.0.1:0")?;
            let port = listener.local_addr()?.port();
            Ok(port)
        }
        Err(e) => {
            tracing::error!("Error finding unused port: {e}");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use serde_json::json;
    use slice_manager::FeatureSlice;
    use ::testing::TestProject;

    #[tokio::test]
    async fn test_slices_survive_a_server_restart() {
        let project = TestProject::shop();
        let data_dir = tempfile::tempdir().unwrap();
        let data_directory = DataDirectory::new(data_dir.path().to_path_buf()).unwrap();

        let (state, statistics) =
            AppState::for_project(project.path().to_path_buf(), &data_directory, 1, 0).unwrap();
        assert_eq!(statistics.generation, 1);
        assert_eq!(statistics.files_processed, 5);

        let server = TestServer::new(app(state)).unwrap();
        let created: FeatureSlice = server
            .post("/api/slices")
            .json(&json!({ "name": "kept" }))
            .await
            .json();

        let (restarted, _) =
            AppState::for_project(project.path().to_path_buf(), &data_directory, 1, 0).unwrap();
        let server = TestServer::new(app(restarted)).unwrap();
        let slices: Vec<FeatureSlice> = server.get("/api/slices").await.json();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].id, created.id);
    }
}
