//! Type-level flow graphs: classes, interfaces, components and free functions tagged
//! with an architectural layer, connected by lifted CALLS and by inheritance.

use crate::errors::{QueryError, Result};
use crate::layers::{Layer, LayerRules};
use database::graph::{CodeNode, GraphStore, KnowledgeGraph, NodeId, NodeType, RelationshipType};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use ts_rs::TS;

pub const DEFAULT_TRACE_DEPTH: usize = 3;
pub const MAX_TRACE_DEPTH: usize = 10;

/// Upper bound on CONTAINS hops when lifting a member to its type
const MAX_NESTING: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct FlowNode {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    pub layer: Layer,
    pub file_path: String,
    pub package_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct FlowEdge {
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub relationship_type: RelationshipType,
    /// Number of underlying edges folded into this one
    pub weight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct FlowGraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub layer_counts: BTreeMap<Layer, usize>,
    #[ts(type = "number")]
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    pub metadata: FlowGraphMetadata,
}

fn is_flow_node(store: &GraphStore, node: &CodeNode) -> bool {
    if node.is_external {
        return false;
    }
    match node.node_type {
        NodeType::Class | NodeType::Interface | NodeType::Enum | NodeType::Component => true,
        NodeType::Function => store
            .parent_of(node.id)
            .is_none_or(|parent| !parent.node_type.is_type_declaration()),
        _ => false,
    }
}

/// Nearest flow node at or above `id` along CONTAINS
fn flow_owner(store: &GraphStore, flow_ids: &FxHashSet<NodeId>, id: NodeId) -> Option<NodeId> {
    let mut current = id;
    for _ in 0..=MAX_NESTING {
        if flow_ids.contains(&current) {
            return Some(current);
        }
        current = store.parent_of(current)?.id;
    }
    None
}

fn assemble(
    graph: &KnowledgeGraph,
    mut nodes: Vec<FlowNode>,
    mut edges: Vec<FlowEdge>,
) -> FlowGraph {
    nodes.sort_by(|a, b| {
        a.layer
            .cmp(&b.layer)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
    edges.sort_by(|a, b| {
        (a.source_id, a.target_id, a.relationship_type)
            .cmp(&(b.source_id, b.target_id, b.relationship_type))
    });

    let mut layer_counts = BTreeMap::new();
    for node in &nodes {
        *layer_counts.entry(node.layer).or_insert(0) += 1;
    }

    FlowGraph {
        metadata: FlowGraphMetadata {
            node_count: nodes.len(),
            edge_count: edges.len(),
            layer_counts,
            generation: graph.generation(),
        },
        nodes,
        edges,
    }
}

/// Flow graph of the whole project
pub fn analyze(graph: &KnowledgeGraph, rules: &LayerRules) -> FlowGraph {
    let store = graph.store();

    let nodes: Vec<FlowNode> = store
        .nodes()
        .iter()
        .filter(|node| is_flow_node(store, node))
        .map(|node| FlowNode {
            id: node.id,
            name: node.name.clone(),
            node_type: node.node_type,
            layer: rules.classify(node),
            file_path: node.file_path.clone(),
            package_name: node.package_name.clone(),
        })
        .collect();
    let flow_ids: FxHashSet<NodeId> = nodes.iter().map(|n| n.id).collect();

    let mut weights: FxHashMap<(NodeId, NodeId, RelationshipType), usize> = FxHashMap::default();
    for rel in store.relationships() {
        let lifted = match rel.relationship_type {
            RelationshipType::Calls => flow_owner(store, &flow_ids, rel.source_id)
                .zip(flow_owner(store, &flow_ids, rel.target_id)),
            RelationshipType::Inherits | RelationshipType::Implements => {
                (flow_ids.contains(&rel.source_id) && flow_ids.contains(&rel.target_id))
                    .then_some((rel.source_id, rel.target_id))
            }
            _ => None,
        };
        if let Some((source, target)) = lifted.filter(|(source, target)| source != target) {
            *weights
                .entry((source, target, rel.relationship_type))
                .or_insert(0) += 1;
        }
    }

    let edges = weights
        .into_iter()
        .map(|((source_id, target_id, relationship_type), weight)| FlowEdge {
            source_id,
            target_id,
            relationship_type,
            weight,
        })
        .collect();

    assemble(graph, nodes, edges)
}

fn named_roots(flow: &FlowGraph, name: &str) -> Vec<NodeId> {
    flow.nodes
        .iter()
        .filter(|node| node.name.eq_ignore_ascii_case(name))
        .map(|node| node.id)
        .collect()
}

fn subgraph(
    graph: &KnowledgeGraph,
    flow: FlowGraph,
    keep: &FxHashSet<NodeId>,
    edge_filter: impl Fn(&FlowEdge) -> bool,
) -> FlowGraph {
    let nodes = flow
        .nodes
        .into_iter()
        .filter(|node| keep.contains(&node.id))
        .collect();
    let edges = flow
        .edges
        .into_iter()
        .filter(|edge| keep.contains(&edge.source_id) && keep.contains(&edge.target_id))
        .filter(|edge| edge_filter(edge))
        .collect();
    assemble(graph, nodes, edges)
}

/// Everything reachable downstream of the types named `from` within `depth` hops
pub fn trace(
    graph: &KnowledgeGraph,
    rules: &LayerRules,
    from: &str,
    depth: usize,
) -> Result<FlowGraph> {
    if !(1..=MAX_TRACE_DEPTH).contains(&depth) {
        return Err(QueryError::invalid(
            format!("depth={depth}"),
            format!("depth must be between 1 and {MAX_TRACE_DEPTH}"),
        ));
    }

    let flow = analyze(graph, rules);
    let roots = named_roots(&flow, from);
    if roots.is_empty() {
        return Err(QueryError::not_found("Type", from));
    }

    let mut downstream: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for edge in &flow.edges {
        downstream.entry(edge.source_id).or_default().push(edge.target_id);
    }

    let mut reached: FxHashMap<NodeId, usize> = roots.iter().map(|id| (*id, 0)).collect();
    let mut queue: VecDeque<NodeId> = roots.into_iter().collect();
    while let Some(current) = queue.pop_front() {
        let distance = reached[&current];
        if distance == depth {
            continue;
        }
        for next in downstream.get(&current).into_iter().flatten() {
            if !reached.contains_key(next) {
                reached.insert(*next, distance + 1);
                queue.push_back(*next);
            }
        }
    }

    let keep: FxHashSet<NodeId> = reached.keys().copied().collect();
    // only edges leaving a node that was still inside the bound
    Ok(subgraph(graph, flow, &keep, |edge| {
        reached.get(&edge.source_id).is_some_and(|d| *d < depth)
    }))
}

/// The types named `name` together with their direct neighbours in either direction
pub fn component(graph: &KnowledgeGraph, rules: &LayerRules, name: &str) -> Result<FlowGraph> {
    let flow = analyze(graph, rules);
    let roots: FxHashSet<NodeId> = named_roots(&flow, name).into_iter().collect();
    if roots.is_empty() {
        return Err(QueryError::not_found("Type", name));
    }

    let mut keep = roots.clone();
    for edge in &flow.edges {
        if roots.contains(&edge.source_id) {
            keep.insert(edge.target_id);
        }
        if roots.contains(&edge.target_id) {
            keep.insert(edge.source_id);
        }
    }

    Ok(subgraph(graph, flow, &keep, |edge| {
        roots.contains(&edge.source_id) || roots.contains(&edge.target_id)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::graph::NewNode;
    use database::testing::GraphFixture;

    struct Shop {
        graph: KnowledgeGraph,
        controller: NodeId,
        service: NodeId,
        repository: NodeId,
        order: NodeId,
    }

    fn shop() -> Shop {
        let mut fixture = GraphFixture::new();
        let controller = fixture.class("OrderController", "src/web/OrderController.java");
        let service = fixture.class("OrderService", "src/OrderService.java");
        let repository = fixture.class("OrderRepository", "src/OrderRepository.java");
        let base = fixture.type_node("Persistable", NodeType::Interface, "src/Persistable.java", 1);
        let order = fixture.class("Order", "src/model/Order.java");

        let place = fixture.method(controller, "place", 5);
        let create = fixture.method(service, "create", 5);
        let validate = fixture.method(service, "validate", 15);
        let save = fixture.method(repository, "save", 5);
        let total = fixture.method(order, "total", 5);

        fixture.calls(place, create);
        fixture.calls(place, create);
        fixture.calls(create, validate);
        fixture.calls(create, save);
        fixture.calls(save, total);
        fixture.relate(RelationshipType::Implements, repository, base);

        let helper = fixture.node(NewNode::new("util.ts#fmt", "fmt", NodeType::Function).in_file("src/util.ts", 1));
        fixture.calls(validate, helper);
        let external = fixture.node(NewNode::new("java.util.List", "List", NodeType::Class).external());
        fixture.calls(total, external);

        Shop {
            graph: fixture.build(),
            controller,
            service,
            repository,
            order,
        }
    }

    fn edge(flow: &FlowGraph, source: NodeId, target: NodeId) -> Option<&FlowEdge> {
        flow.edges
            .iter()
            .find(|e| e.source_id == source && e.target_id == target)
    }

    #[test]
    fn test_analyze_lifts_calls_to_types() {
        let shop = shop();
        let flow = analyze(&shop.graph, &LayerRules::default());

        assert_eq!(flow.metadata.node_count, 6);
        assert_eq!(flow.nodes[0].name, "OrderController");
        assert_eq!(flow.nodes[0].layer, Layer::Controller);

        let place_to_create = edge(&flow, shop.controller, shop.service).unwrap();
        assert_eq!(place_to_create.weight, 2);
        assert_eq!(place_to_create.relationship_type, RelationshipType::Calls);
        assert!(edge(&flow, shop.service, shop.service).is_none());
        assert!(flow.edges.iter().any(|e| e.relationship_type == RelationshipType::Implements));
        assert_eq!(flow.metadata.edge_count, flow.edges.len());
        assert_eq!(flow.metadata.layer_counts.get(&Layer::Repository), Some(&1));
        assert_eq!(flow.metadata.layer_counts.get(&Layer::Model), Some(&1));
    }

    #[test]
    fn test_trace_is_bounded() {
        let shop = shop();
        let rules = LayerRules::default();

        let one_hop = trace(&shop.graph, &rules, "ordercontroller", 1).unwrap();
        let ids: FxHashSet<NodeId> = one_hop.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids, FxHashSet::from_iter([shop.controller, shop.service]));
        assert_eq!(one_hop.edges.len(), 1);

        let deep = trace(&shop.graph, &rules, "OrderController", 3).unwrap();
        assert!(deep.nodes.iter().any(|n| n.id == shop.order));
        assert!(deep.nodes.iter().any(|n| n.name == "fmt"));

        assert_eq!(
            trace(&shop.graph, &rules, "Nope", 2),
            Err(QueryError::not_found("Type", "Nope"))
        );
        assert!(matches!(
            trace(&shop.graph, &rules, "OrderController", 11),
            Err(QueryError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_component_includes_neighbours_both_ways() {
        let shop = shop();
        let view = component(&shop.graph, &LayerRules::default(), "OrderRepository").unwrap();

        let names: Vec<&str> = view.nodes.iter().map(|n| n.name.as_str()).collect();
        assert!(names.contains(&"OrderService"));
        assert!(names.contains(&"Order"));
        assert!(names.contains(&"Persistable"));
        assert!(!names.contains(&"OrderController"));
        assert!(view
            .edges
            .iter()
            .all(|e| e.source_id == shop.repository || e.target_id == shop.repository));
    }
}
