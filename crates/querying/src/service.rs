use crate::calls::{self, CallerInfo, DEFAULT_CHAIN_DEPTH, MAX_CHAIN_DEPTH};
use crate::complexity::{self, FileComplexity};
use crate::dead_code::{self, DeadCodeEntry};
use crate::errors::{QueryError, Result};
use crate::flow_graph::{self, DEFAULT_TRACE_DEPTH, FlowGraph};
use crate::hierarchy::{self, TypeHierarchy};
use crate::layers::LayerRules;
use crate::query;
use crate::state_machine::{self, StateMachineInfo};
use crate::types::{NodeWithRelationships, QueryResult, node_order};
use database::graph::{CodeNode, GraphHandle, KnowledgeGraph, NodeId};
use std::sync::Arc;

/// Read-side entry point over the current knowledge graph snapshot.
///
/// Every call pins one snapshot for its whole duration, so a rebuild swapping the
/// graph mid-request never mixes generations in one answer.
#[derive(Clone)]
pub struct QueryingService {
    graph: Arc<GraphHandle>,
    layer_rules: Arc<LayerRules>,
}

fn owned(nodes: Vec<&CodeNode>) -> Vec<CodeNode> {
    nodes.into_iter().cloned().collect()
}

impl QueryingService {
    pub fn new(graph: Arc<GraphHandle>, layer_rules: LayerRules) -> Self {
        Self {
            graph,
            layer_rules: Arc::new(layer_rules),
        }
    }

    pub fn snapshot(&self) -> Arc<KnowledgeGraph> {
        self.graph.current()
    }

    pub fn graph_handle(&self) -> &Arc<GraphHandle> {
        &self.graph
    }

    pub fn layer_rules(&self) -> &LayerRules {
        &self.layer_rules
    }

    pub fn node(&self, id: NodeId) -> Result<NodeWithRelationships> {
        hierarchy::node_with_relationships(self.snapshot().store(), id)
    }

    /// Distinct callees, ordered by name
    pub fn callees(&self, id: NodeId) -> Result<Vec<CodeNode>> {
        let graph = self.snapshot();
        let groups = calls::callees(graph.store(), id)?;
        Ok(groups.into_iter().map(|g| g.node.clone()).collect())
    }

    /// Distinct callers, ordered by name
    pub fn callers(&self, id: NodeId) -> Result<Vec<CodeNode>> {
        let graph = self.snapshot();
        let groups = calls::callers(graph.store(), id)?;
        Ok(groups.into_iter().map(|g| g.node.clone()).collect())
    }

    pub fn supertypes(&self, id: NodeId) -> Result<Vec<CodeNode>> {
        let graph = self.snapshot();
        hierarchy::supertypes(graph.store(), id).map(owned)
    }

    pub fn subtypes(&self, id: NodeId) -> Result<Vec<CodeNode>> {
        let graph = self.snapshot();
        hierarchy::subtypes(graph.store(), id).map(owned)
    }

    pub fn hierarchy(&self, id: NodeId) -> Result<TypeHierarchy> {
        hierarchy::hierarchy(self.snapshot().store(), id)
    }

    pub fn call_chain(
        &self,
        source: NodeId,
        target: NodeId,
        max_depth: Option<usize>,
    ) -> Result<Vec<Vec<NodeId>>> {
        let max_depth = max_depth.unwrap_or(DEFAULT_CHAIN_DEPTH);
        if !(1..=MAX_CHAIN_DEPTH).contains(&max_depth) {
            return Err(QueryError::invalid(
                format!("maxDepth={max_depth}"),
                format!("maxDepth must be between 1 and {MAX_CHAIN_DEPTH}"),
            ));
        }
        calls::find_call_chain(self.snapshot().store(), source, target, max_depth)
    }

    pub fn query(&self, query: &str) -> Result<QueryResult> {
        query::execute_query(self.snapshot().store(), query)
    }

    /// Case-insensitive substring search over node names
    pub fn search(&self, name: &str) -> Vec<CodeNode> {
        let graph = self.snapshot();
        let mut nodes = graph.store().find_by_name(name);
        nodes.sort_by(|a, b| node_order(a, b));
        owned(nodes)
    }

    pub fn caller_info(
        &self,
        method: &str,
        class_name: Option<&str>,
        file_path: Option<&str>,
    ) -> Result<Vec<CallerInfo>> {
        calls::caller_info(self.snapshot().store(), method, class_name, file_path)
    }

    pub fn project_complexity(&self, path_prefix: Option<&str>) -> Vec<FileComplexity> {
        complexity::project_complexity(&self.snapshot(), path_prefix)
    }

    pub fn file_complexity(&self, file_path: &str) -> Result<FileComplexity> {
        complexity::file_complexity(&self.snapshot(), file_path)
    }

    pub fn dead_code(&self, path_prefix: Option<&str>) -> Vec<DeadCodeEntry> {
        dead_code::find_dead_code(&self.snapshot(), path_prefix)
    }

    pub fn state_machines(&self, path_prefix: Option<&str>) -> Vec<StateMachineInfo> {
        state_machine::extract_state_machines(&self.snapshot(), path_prefix)
    }

    pub fn flow_graph(&self) -> FlowGraph {
        flow_graph::analyze(&self.snapshot(), &self.layer_rules)
    }

    pub fn trace_flow(&self, from: &str, depth: Option<usize>) -> Result<FlowGraph> {
        flow_graph::trace(
            &self.snapshot(),
            &self.layer_rules,
            from,
            depth.unwrap_or(DEFAULT_TRACE_DEPTH),
        )
    }

    pub fn flow_component(&self, name: &str) -> Result<FlowGraph> {
        flow_graph::component(&self.snapshot(), &self.layer_rules, name)
    }
}
