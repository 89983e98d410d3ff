use crate::errors::{QueryError, Result};
use crate::types::{NodeWithRelationships, QueryNode, RelationshipView, node_order};
use database::graph::{CodeNode, GraphStore, NodeId, Relationship};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct HierarchyEntry {
    pub node: QueryNode,
    /// Number of INHERITS/IMPLEMENTS hops from the root
    pub distance: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct TypeHierarchy {
    pub root: QueryNode,
    pub ancestors: Vec<HierarchyEntry>,
    pub descendants: Vec<HierarchyEntry>,
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

fn inheritance_neighbours(
    store: &GraphStore,
    id: NodeId,
    direction: Direction,
) -> impl Iterator<Item = NodeId> + '_ {
    let edges: Box<dyn Iterator<Item = &Relationship> + '_> = match direction {
        Direction::Up => Box::new(store.outgoing(id, None)),
        Direction::Down => Box::new(store.incoming(id, None)),
    };
    edges
        .filter(|rel| rel.relationship_type.is_inheritance())
        .map(move |rel| match direction {
            Direction::Up => rel.target_id,
            Direction::Down => rel.source_id,
        })
}

fn direct(store: &GraphStore, id: NodeId, direction: Direction) -> Result<Vec<&CodeNode>> {
    store.node(id).map_err(|_| QueryError::NodeNotFound(id))?;
    let mut seen = FxHashSet::default();
    let mut nodes: Vec<&CodeNode> = inheritance_neighbours(store, id, direction)
        .filter(|other| seen.insert(*other))
        .filter_map(|other| store.get_node(other))
        .collect();
    nodes.sort_by(|a, b| node_order(a, b));
    Ok(nodes)
}

/// Direct supertypes: targets of outgoing INHERITS and IMPLEMENTS edges
pub fn supertypes(store: &GraphStore, id: NodeId) -> Result<Vec<&CodeNode>> {
    direct(store, id, Direction::Up)
}

/// Direct subtypes: sources of incoming INHERITS and IMPLEMENTS edges
pub fn subtypes(store: &GraphStore, id: NodeId) -> Result<Vec<&CodeNode>> {
    direct(store, id, Direction::Down)
}

fn walk(store: &GraphStore, root: NodeId, direction: Direction) -> Vec<HierarchyEntry> {
    let mut visited = FxHashSet::default();
    visited.insert(root);
    let mut queue = VecDeque::from([(root, 0usize)]);
    let mut found: Vec<(&CodeNode, usize)> = Vec::new();

    while let Some((current, distance)) = queue.pop_front() {
        for next in inheritance_neighbours(store, current, direction) {
            if visited.insert(next) {
                if let Some(node) = store.get_node(next) {
                    found.push((node, distance + 1));
                }
                queue.push_back((next, distance + 1));
            }
        }
    }

    found.sort_by(|(a, da), (b, db)| da.cmp(db).then_with(|| node_order(a, b)));
    found
        .into_iter()
        .map(|(node, distance)| HierarchyEntry {
            node: QueryNode::from(node),
            distance,
        })
        .collect()
}

/// Transitive ancestors and descendants of a type, nearest first
pub fn hierarchy(store: &GraphStore, id: NodeId) -> Result<TypeHierarchy> {
    let root = store.node(id).map_err(|_| QueryError::NodeNotFound(id))?;
    Ok(TypeHierarchy {
        root: QueryNode::from(root),
        ancestors: walk(store, id, Direction::Up),
        descendants: walk(store, id, Direction::Down),
    })
}

/// A node with all of its edges, each labelled with the node on its other end
pub fn node_with_relationships(store: &GraphStore, id: NodeId) -> Result<NodeWithRelationships> {
    let node = store.node(id).map_err(|_| QueryError::NodeNotFound(id))?;
    let outgoing_relationships = store
        .outgoing(id, None)
        .filter_map(|rel| store.get_node(rel.target_id).map(|other| RelationshipView::new(rel, other)))
        .collect();
    let incoming_relationships = store
        .incoming(id, None)
        .filter_map(|rel| store.get_node(rel.source_id).map(|other| RelationshipView::new(rel, other)))
        .collect();

    Ok(NodeWithRelationships {
        node: node.clone(),
        outgoing_relationships,
        incoming_relationships,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::graph::{NodeType, RelationshipType};
    use database::testing::GraphFixture;

    #[test]
    fn test_direct_and_transitive_hierarchy() {
        let mut fixture = GraphFixture::new();
        let entity = fixture.class("Entity", "src/Entity.java");
        let auditable = fixture.type_node("Auditable", NodeType::Interface, "src/Auditable.java", 1);
        let order = fixture.class("Order", "src/Order.java");
        let rush = fixture.class("RushOrder", "src/RushOrder.java");
        fixture.relate(RelationshipType::Inherits, order, entity);
        fixture.relate(RelationshipType::Implements, order, auditable);
        fixture.relate(RelationshipType::Inherits, rush, order);
        let graph = fixture.build();
        let store = graph.store();

        let names = |nodes: Vec<&CodeNode>| -> Vec<String> {
            nodes.into_iter().map(|n| n.name.clone()).collect()
        };
        assert_eq!(names(supertypes(store, order).unwrap()), vec!["Entity", "Auditable"]);
        assert_eq!(names(subtypes(store, order).unwrap()), vec!["RushOrder"]);

        let tree = hierarchy(store, rush).unwrap();
        let ancestors: Vec<(&str, usize)> = tree
            .ancestors
            .iter()
            .map(|e| (e.node.name.as_str(), e.distance))
            .collect();
        assert_eq!(ancestors, vec![("Order", 1), ("Entity", 2), ("Auditable", 2)]);
        assert!(tree.descendants.is_empty());

        let from_entity = hierarchy(store, entity).unwrap();
        assert_eq!(from_entity.descendants.len(), 2);
        assert_eq!(from_entity.descendants[1].distance, 2);
    }

    #[test]
    fn test_cyclic_inheritance_terminates() {
        let mut fixture = GraphFixture::new();
        let a = fixture.class("A", "src/A.java");
        let b = fixture.class("B", "src/B.java");
        fixture.relate(RelationshipType::Inherits, a, b);
        fixture.relate(RelationshipType::Inherits, b, a);
        let graph = fixture.build();

        let tree = hierarchy(graph.store(), a).unwrap();
        assert_eq!(tree.ancestors.len(), 1);
        assert_eq!(tree.descendants.len(), 1);
        assert_eq!(hierarchy(graph.store(), 99), Err(QueryError::NodeNotFound(99)));
    }

    #[test]
    fn test_node_with_relationships_lists_both_directions() {
        let mut fixture = GraphFixture::new();
        let class = fixture.class("Cart", "src/Cart.java");
        let add = fixture.method(class, "add", 3);
        let total = fixture.method(class, "total", 9);
        fixture.calls(add, total);
        let graph = fixture.build();

        let view = node_with_relationships(graph.store(), add).unwrap();
        assert_eq!(view.node.name, "add");
        assert_eq!(view.outgoing_relationships.len(), 1);
        let call = &view.outgoing_relationships[0];
        assert_eq!(call.relationship_type, RelationshipType::Calls);
        assert_eq!(call.related_node_id, total);
        assert_eq!(call.related_node_name, "total");
        assert_eq!(call.related_node_type, NodeType::Method);

        assert_eq!(view.incoming_relationships.len(), 1);
        let parent = &view.incoming_relationships[0];
        assert_eq!(parent.relationship_type, RelationshipType::Contains);
        assert_eq!(parent.related_node_name, "Cart");
        assert_eq!(parent.related_node_type, NodeType::Class);
    }

    #[test]
    fn test_node_with_relationships_serializes_flat() {
        let mut fixture = GraphFixture::new();
        let class = fixture.class("Cart", "src/Cart.java");
        let add = fixture.method(class, "add", 3);
        let total = fixture.method(class, "total", 9);
        fixture.calls(add, total);
        let graph = fixture.build();

        let view = node_with_relationships(graph.store(), total).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["name"], "total");
        assert_eq!(json["nodeType"], "METHOD");
        assert!(json.get("node").is_none());
        let incoming = json["incomingRelationships"].as_array().unwrap();
        assert_eq!(incoming.len(), 2);
        assert!(incoming.iter().any(|edge| {
            edge["relationshipType"] == "CALLS"
                && edge["relatedNodeName"] == "add"
                && edge["relatedNodeId"] == add
                && edge["relatedNodeType"] == "METHOD"
        }));
        assert!(incoming[0].get("relationshipId").is_some());
        assert!(json["outgoingRelationships"].as_array().unwrap().is_empty());
    }
}
