use crate::{AppState, app};
use axum_test::TestServer;
use database::graph::{GraphHandle, KnowledgeGraph, NodeId};
use indexer::execution::{config::IndexingConfigBuilder, executor::IndexingExecutor};
use indexer::parsing::parser::JsonTreeParser;
use querying::layers::LayerRules;
use slice_manager::InMemoryRepository;
use std::path::PathBuf;
use std::sync::Arc;
use testing::TestProject;

fn executor() -> IndexingExecutor {
    IndexingExecutor::new(Arc::new(JsonTreeParser::new()), IndexingConfigBuilder::build(2))
}

/// State serving `graph` directly; its rebuild endpoint points at `project_root`
pub fn build_app_state(graph: KnowledgeGraph, project_root: PathBuf) -> AppState {
    AppState::new(
        Arc::new(GraphHandle::new(graph)),
        LayerRules::default(),
        Arc::new(InMemoryRepository::new()),
        executor(),
        project_root,
        0,
    )
}

/// State over the indexed [`TestProject::shop`] project.
/// The caller keeps the project alive for the duration of the test.
pub fn shop_app_state() -> (AppState, TestProject) {
    let project = TestProject::shop();
    let state = build_app_state(KnowledgeGraph::empty(), project.path().to_path_buf());
    state
        .executor
        .rebuild(project.path(), state.querying.graph_handle())
        .unwrap();
    (state, project)
}

pub fn test_server(state: &AppState) -> TestServer {
    TestServer::new(app(state.clone())).unwrap()
}

pub fn node_id(state: &AppState, key: &str) -> NodeId {
    state
        .querying
        .snapshot()
        .store()
        .find_by_key(key)
        .unwrap_or_else(|| panic!("no node with key {key}"))
        .id
}
