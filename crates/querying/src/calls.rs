use crate::errors::{QueryError, Result};
use database::graph::{CodeNode, GraphStore, NodeId, RelationshipType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

pub const DEFAULT_CHAIN_DEPTH: usize = 5;
pub const MAX_CHAIN_DEPTH: usize = 10;

/// Path enumeration stops after this many shortest paths
pub const MAX_CHAIN_PATHS: usize = 10_000;

/// All call-site edges between one caller and one callee, collapsed
#[derive(Debug, Clone, PartialEq)]
pub struct CallGroup<'g> {
    pub node: &'g CodeNode,
    pub call_count: usize,
    /// Call-site lines in edge order, where known
    pub lines: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct CallerInfo {
    pub node_id: NodeId,
    pub method_name: String,
    /// Name of the type containing the caller, if any
    pub class_name: Option<String>,
    pub file_path: String,
    /// First call-site line, or the caller's declaration line when no site is recorded
    pub line: u32,
    pub call_count: usize,
}

/// Incoming CALLS grouped by source, ordered by caller name then id
pub fn callers(store: &GraphStore, id: NodeId) -> Result<Vec<CallGroup<'_>>> {
    store.node(id).map_err(|_| QueryError::NodeNotFound(id))?;
    Ok(group_calls(
        store,
        store
            .incoming(id, Some(RelationshipType::Calls))
            .map(|rel| (rel.source_id, rel.line_number)),
    ))
}

/// Outgoing CALLS grouped by target, ordered by callee name then id
pub fn callees(store: &GraphStore, id: NodeId) -> Result<Vec<CallGroup<'_>>> {
    store.node(id).map_err(|_| QueryError::NodeNotFound(id))?;
    Ok(group_calls(
        store,
        store
            .outgoing(id, Some(RelationshipType::Calls))
            .map(|rel| (rel.target_id, rel.line_number)),
    ))
}

fn group_calls<'g>(
    store: &'g GraphStore,
    ends: impl Iterator<Item = (NodeId, Option<u32>)>,
) -> Vec<CallGroup<'g>> {
    let mut grouped: FxHashMap<NodeId, (usize, Vec<u32>)> = FxHashMap::default();
    for (other, line) in ends {
        let entry = grouped.entry(other).or_default();
        entry.0 += 1;
        entry.1.extend(line);
    }

    let mut groups: Vec<CallGroup<'g>> = grouped
        .into_iter()
        .filter_map(|(other, (call_count, lines))| {
            store.get_node(other).map(|node| CallGroup {
                node,
                call_count,
                lines,
            })
        })
        .collect();
    groups.sort_by(|a, b| {
        a.node
            .name
            .cmp(&b.node.name)
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
    groups
}

/// All shortest CALLS paths from `source` to `target` of at most `max_depth` hops.
///
/// Returns an empty list when the target is not reachable within the bound, and
/// `[[source]]` when both ends are the same node.
pub fn find_call_chain(
    store: &GraphStore,
    source: NodeId,
    target: NodeId,
    max_depth: usize,
) -> Result<Vec<Vec<NodeId>>> {
    store.node(source).map_err(|_| QueryError::NodeNotFound(source))?;
    store.node(target).map_err(|_| QueryError::NodeNotFound(target))?;

    if source == target {
        return Ok(vec![vec![source]]);
    }

    // depth at which each node was first reached, plus every parent at that depth
    let mut reached: FxHashMap<NodeId, usize> = FxHashMap::default();
    let mut parents: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    reached.insert(source, 0);
    let mut frontier = vec![source];

    for depth in 1..=max_depth {
        let mut next = Vec::new();
        for &node in &frontier {
            for rel in store.outgoing(node, Some(RelationshipType::Calls)) {
                let callee = rel.target_id;
                match reached.get(&callee) {
                    None => {
                        reached.insert(callee, depth);
                        parents.entry(callee).or_default().push(node);
                        next.push(callee);
                    }
                    Some(&d) if d == depth => {
                        let known = parents.entry(callee).or_default();
                        if !known.contains(&node) {
                            known.push(node);
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        if reached.contains_key(&target) || next.is_empty() {
            break;
        }
        frontier = next;
    }

    if !reached.contains_key(&target) {
        return Ok(Vec::new());
    }

    Ok(enumerate_paths(source, target, parents))
}

fn enumerate_paths(
    source: NodeId,
    target: NodeId,
    mut parents: FxHashMap<NodeId, Vec<NodeId>>,
) -> Vec<Vec<NodeId>> {
    for known in parents.values_mut() {
        known.sort_unstable();
    }

    let mut paths = Vec::new();
    let mut trail = vec![target];
    if walk_back(source, &parents, &mut trail, &mut paths) {
        warn!(
            "Call chain enumeration from {} to {} stopped at {} paths",
            source, target, MAX_CHAIN_PATHS
        );
    }

    paths.sort();
    paths
}

/// Depth-first over the shortest-path parents, reusing `trail` for the path walked
/// so far (target first). Every parent chain ends at `source`, so the recursion
/// is bounded by the chain depth. Returns true once the path cap is reached.
fn walk_back(
    source: NodeId,
    parents: &FxHashMap<NodeId, Vec<NodeId>>,
    trail: &mut Vec<NodeId>,
    paths: &mut Vec<Vec<NodeId>>,
) -> bool {
    let Some(&head) = trail.last() else {
        return false;
    };
    if head == source {
        paths.push(trail.iter().rev().copied().collect());
        return paths.len() >= MAX_CHAIN_PATHS;
    }

    for &parent in parents.get(&head).into_iter().flatten() {
        trail.push(parent);
        let capped = walk_back(source, parents, trail, paths);
        trail.pop();
        if capped {
            return true;
        }
    }
    false
}

/// Callers of every method named `method_name`, optionally narrowed by the name of the
/// containing class and by file path (exact or suffix match).
pub fn caller_info(
    store: &GraphStore,
    method_name: &str,
    class_name: Option<&str>,
    file_path: Option<&str>,
) -> Result<Vec<CallerInfo>> {
    let targets: Vec<&CodeNode> = store
        .find_by_exact_name(method_name)
        .into_iter()
        .filter(|node| node.node_type.is_callable())
        .filter(|node| {
            class_name.is_none_or(|class| {
                store
                    .parent_of(node.id)
                    .is_some_and(|parent| parent.name.eq_ignore_ascii_case(class))
            })
        })
        .filter(|node| {
            file_path.is_none_or(|file| node.file_path == file || node.file_path.ends_with(file))
        })
        .collect();

    if targets.is_empty() {
        return Err(QueryError::not_found("Method", method_name));
    }

    let mut infos = Vec::new();
    for target in targets {
        for group in callers(store, target.id)? {
            infos.push(CallerInfo {
                node_id: group.node.id,
                method_name: group.node.name.clone(),
                class_name: store.parent_of(group.node.id).map(|p| p.name.clone()),
                file_path: group.node.file_path.clone(),
                line: group
                    .lines
                    .iter()
                    .min()
                    .copied()
                    .unwrap_or(group.node.line_number),
                call_count: group.call_count,
            });
        }
    }

    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::graph::NodeType;
    use database::testing::GraphFixture;
    use std::time::{Duration, Instant};
    use tracing_test::traced_test;

    /// a -> b -> d, a -> c -> d, d -> e, e -> a (cycle)
    fn diamond() -> (GraphFixture, [NodeId; 5]) {
        let mut fixture = GraphFixture::new();
        let class = fixture.class("Flow", "src/Flow.java");
        let a = fixture.method(class, "a", 2);
        let b = fixture.method(class, "b", 4);
        let c = fixture.method(class, "c", 6);
        let d = fixture.method(class, "d", 8);
        let e = fixture.method(class, "e", 10);
        fixture.calls(a, b);
        fixture.calls(a, c);
        fixture.calls(b, d);
        fixture.calls(c, d);
        fixture.calls(d, e);
        fixture.calls(e, a);
        (fixture, [a, b, c, d, e])
    }

    #[test]
    fn test_callers_grouped_by_source() {
        let mut fixture = GraphFixture::new();
        let class = fixture.class("Svc", "Svc.java");
        let foo = fixture.method(class, "foo", 2);
        let baz = fixture.method(class, "baz", 6);
        let bar = fixture.method(class, "bar", 4);
        fixture.calls_at(baz, foo, Some(7));
        fixture.calls_at(bar, foo, Some(5));
        fixture.calls_at(bar, foo, Some(5));
        let graph = fixture.build();

        let groups = callers(graph.store(), foo).unwrap();
        let summary: Vec<(&str, usize)> = groups
            .iter()
            .map(|g| (g.node.name.as_str(), g.call_count))
            .collect();
        assert_eq!(summary, vec![("bar", 2), ("baz", 1)]);

        let incoming = graph
            .store()
            .incoming(foo, Some(RelationshipType::Calls))
            .count();
        assert_eq!(groups.iter().map(|g| g.call_count).sum::<usize>(), incoming);
        assert_eq!(callees(graph.store(), bar).unwrap()[0].node.id, foo);
    }

    #[test]
    fn test_callers_of_unknown_node() {
        let graph = GraphFixture::new().build();
        assert_eq!(callers(graph.store(), 42), Err(QueryError::NodeNotFound(42)));
    }

    #[test]
    fn test_chain_returns_all_shortest_paths() {
        let (fixture, [a, b, c, d, _]) = diamond();
        let graph = fixture.build();

        let paths = find_call_chain(graph.store(), a, d, 5).unwrap();
        assert_eq!(paths, vec![vec![a, b, d], vec![a, c, d]]);
    }

    #[test]
    fn test_chain_honours_max_depth() {
        let (fixture, [a, _, _, d, e]) = diamond();
        let graph = fixture.build();
        let store = graph.store();

        assert!(find_call_chain(store, a, e, 2).unwrap().is_empty());
        let found = find_call_chain(store, a, e, 3).unwrap();
        assert_eq!(found.len(), 2);
        for depth in 4..=MAX_CHAIN_DEPTH {
            assert_eq!(find_call_chain(store, a, e, depth).unwrap(), found);
        }
        assert!(find_call_chain(store, d, e, 0).unwrap().is_empty());
    }

    #[test]
    fn test_chain_terminates_on_cycles_and_unreachable_targets() {
        let (mut fixture, [a, ..]) = diamond();
        let island = fixture.node(
            database::graph::NewNode::new("Island#x()", "x", NodeType::Method).in_file("I.java", 1),
        );
        let graph = fixture.build();

        assert!(find_call_chain(graph.store(), a, island, 10).unwrap().is_empty());
        assert_eq!(find_call_chain(graph.store(), a, a, 3).unwrap(), vec![vec![a]]);
    }

    #[traced_test]
    #[test]
    fn test_path_enumeration_is_capped() {
        // 15 layers of 2 parallel nodes give 2^15 shortest paths
        let mut fixture = GraphFixture::new();
        let class = fixture.class("Wide", "Wide.java");
        let source = fixture.method(class, "start", 1);
        let mut previous = vec![source];
        for layer in 0..15 {
            let current = vec![
                fixture.method(class, &format!("l{layer}a"), 2),
                fixture.method(class, &format!("l{layer}b"), 3),
            ];
            for &from in &previous {
                for &to in &current {
                    fixture.calls(from, to);
                }
            }
            previous = current;
        }
        let sink = fixture.method(class, "sink", 99);
        for &from in &previous {
            fixture.calls(from, sink);
        }
        let graph = fixture.build();

        let paths = find_call_chain(graph.store(), source, sink, 20).unwrap();
        assert_eq!(paths.len(), MAX_CHAIN_PATHS);
        assert!(logs_contain("stopped at 10000 paths"));
    }

    #[test]
    fn test_wide_layered_chain_stops_early() {
        // 9 layers of 6 parallel nodes give 6^9 shortest paths
        let mut fixture = GraphFixture::new();
        let class = fixture.class("Mesh", "Mesh.java");
        let source = fixture.method(class, "start", 1);
        let mut previous = vec![source];
        for layer in 0..9 {
            let current: Vec<NodeId> = (0..6)
                .map(|slot| fixture.method(class, &format!("l{layer}n{slot}"), 2))
                .collect();
            for &from in &previous {
                for &to in &current {
                    fixture.calls(from, to);
                }
            }
            previous = current;
        }
        let sink = fixture.method(class, "sink", 99);
        for &from in &previous {
            fixture.calls(from, sink);
        }
        let graph = fixture.build();

        let started = Instant::now();
        let paths = find_call_chain(graph.store(), source, sink, 10).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(paths.len(), MAX_CHAIN_PATHS);
        assert!(paths.iter().all(|path| path.len() == 11));
        assert!(paths.iter().all(|path| path[0] == source && path[10] == sink));
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }

    #[test]
    fn test_caller_info_filters_by_class_and_file() {
        let mut fixture = GraphFixture::new();
        let orders = fixture.class("OrderService", "src/orders/OrderService.java");
        let users = fixture.class("UserService", "src/users/UserService.java");
        let save_order = fixture.method(orders, "save", 3);
        let save_user = fixture.method(users, "save", 3);
        let checkout = fixture.method(orders, "checkout", 10);
        let register = fixture.method(users, "register", 12);
        fixture.calls_at(checkout, save_order, Some(11));
        fixture.calls_at(checkout, save_order, Some(14));
        fixture.calls_at(register, save_user, Some(13));
        let graph = fixture.build();
        let store = graph.store();

        let all = caller_info(store, "SAVE", None, None).unwrap();
        assert_eq!(all.len(), 2);

        let scoped = caller_info(store, "save", Some("orderservice"), None).unwrap();
        assert_eq!(
            scoped,
            vec![CallerInfo {
                node_id: checkout,
                method_name: "checkout".to_string(),
                class_name: Some("OrderService".to_string()),
                file_path: "src/orders/OrderService.java".to_string(),
                line: 11,
                call_count: 2,
            }]
        );

        let by_file = caller_info(store, "save", None, Some("users/UserService.java")).unwrap();
        assert_eq!(by_file[0].method_name, "register");

        assert!(matches!(
            caller_info(store, "missing", None, None),
            Err(QueryError::NotFound { .. })
        ));
    }
}
