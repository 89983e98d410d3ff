//! The textual query language.
//!
//! A query is a whitespace-separated list of `key:value` tokens combined with AND:
//!
//! ```text
//! type:CLASS public:true name:"order service"
//! calls:checkout inherits:BaseRepository
//! from:placeOrder to:save depth:4
//! ```
//!
//! `from`/`to`/`depth` form a call-chain query and cannot be combined with filters.

use crate::calls::{DEFAULT_CHAIN_DEPTH, MAX_CHAIN_DEPTH, find_call_chain};
use crate::errors::{QueryError, Result};
use crate::types::{QueryNode, QueryPath, QueryResult, node_order};
use database::graph::{CodeNode, GraphStore, NodeId, NodeType, RelationshipType};
use rustc_hash::FxHashSet;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Case-insensitive substring of the node name
    Name(String),
    Type(NodeType),
    /// Nodes called by a node with this exact (case-insensitive) name
    Calls(String),
    /// Nodes extending or implementing a node with this exact (case-insensitive) name
    Inherits(String),
    Public(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuery {
    Filters(Vec<Filter>),
    Chain {
        from: String,
        to: String,
        depth: usize,
    },
}

/// Split on whitespace, keeping double-quoted runs together
fn tokenize(query: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in query.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(QueryError::invalid(current, "unterminated quote"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

pub fn parse_query(query: &str) -> Result<ParsedQuery> {
    let tokens = tokenize(query)?;
    if tokens.is_empty() {
        return Err(QueryError::invalid("", "empty query"));
    }

    let mut filters = Vec::new();
    let mut from = None;
    let mut to = None;
    let mut depth = None;
    let mut first_filter_token: Option<&str> = None;
    let mut first_chain_token: Option<&str> = None;

    for token in &tokens {
        let Some((key, raw_value)) = token.split_once(':') else {
            return Err(QueryError::invalid(token, "expected key:value"));
        };
        let value = unquote(raw_value).trim();
        if value.is_empty() {
            return Err(QueryError::invalid(token, "empty value"));
        }

        match key.to_ascii_lowercase().as_str() {
            "name" => filters.push(Filter::Name(value.to_string())),
            "type" => {
                let node_type = NodeType::from_str(value)
                    .map_err(|_| QueryError::invalid(token, "unknown node type"))?;
                filters.push(Filter::Type(node_type));
            }
            "calls" => filters.push(Filter::Calls(value.to_string())),
            "inherits" => filters.push(Filter::Inherits(value.to_string())),
            "public" => {
                let flag = match value.to_ascii_lowercase().as_str() {
                    "true" => true,
                    "false" => false,
                    _ => return Err(QueryError::invalid(token, "expected true or false")),
                };
                filters.push(Filter::Public(flag));
            }
            "from" | "to" | "depth" => {
                let slot = match key.to_ascii_lowercase().as_str() {
                    "from" => &mut from,
                    "to" => &mut to,
                    _ => &mut depth,
                };
                if slot.is_some() {
                    return Err(QueryError::invalid(token, "repeated chain key"));
                }
                *slot = Some(value.to_string());
                first_chain_token.get_or_insert(token);
                continue;
            }
            _ => return Err(QueryError::invalid(token, "unknown key")),
        }
        first_filter_token.get_or_insert(token);
    }

    match (first_chain_token, first_filter_token) {
        (None, _) => Ok(ParsedQuery::Filters(filters)),
        (Some(_), Some(filter_token)) => Err(QueryError::invalid(
            filter_token,
            "filters cannot be combined with from/to",
        )),
        (Some(chain_token), None) => {
            let (Some(from), Some(to)) = (from, to) else {
                return Err(QueryError::invalid(chain_token, "chain queries need both from and to"));
            };
            let depth = match depth {
                None => DEFAULT_CHAIN_DEPTH,
                Some(raw) => match raw.parse::<usize>() {
                    Ok(n) if (1..=MAX_CHAIN_DEPTH).contains(&n) => n,
                    _ => {
                        return Err(QueryError::invalid(
                            format!("depth:{raw}"),
                            format!("depth must be between 1 and {MAX_CHAIN_DEPTH}"),
                        ));
                    }
                },
            };
            Ok(ParsedQuery::Chain { from, to, depth })
        }
    }
}

/// Parse and evaluate `query` against `store`
pub fn execute_query(store: &GraphStore, query: &str) -> Result<QueryResult> {
    match parse_query(query)? {
        ParsedQuery::Filters(filters) => {
            let nodes = apply_filters(store, &filters);
            Ok(QueryResult {
                query: query.to_string(),
                total_results: nodes.len(),
                nodes: nodes.into_iter().map(QueryNode::from).collect(),
                paths: Vec::new(),
            })
        }
        ParsedQuery::Chain { from, to, depth } => {
            let mut paths = Vec::new();
            for source in store.find_by_exact_name(&from) {
                for target in store.find_by_exact_name(&to) {
                    paths.extend(find_call_chain(store, source.id, target.id, depth)?);
                }
            }

            let on_paths: FxHashSet<NodeId> = paths.iter().flatten().copied().collect();
            let mut nodes: Vec<&CodeNode> = on_paths
                .into_iter()
                .filter_map(|id| store.get_node(id))
                .collect();
            nodes.sort_by(|a, b| node_order(a, b));

            Ok(QueryResult {
                query: query.to_string(),
                total_results: paths.len(),
                nodes: nodes.into_iter().map(QueryNode::from).collect(),
                paths: paths.into_iter().map(QueryPath::from).collect(),
            })
        }
    }
}

fn apply_filters<'g>(store: &'g GraphStore, filters: &[Filter]) -> Vec<&'g CodeNode> {
    // relationship filters are turned into id sets up front
    let mut required: Vec<FxHashSet<NodeId>> = Vec::new();
    for filter in filters {
        match filter {
            Filter::Calls(caller) => required.push(
                store
                    .find_by_exact_name(caller)
                    .into_iter()
                    .flat_map(|node| store.outgoing(node.id, Some(RelationshipType::Calls)))
                    .map(|rel| rel.target_id)
                    .collect(),
            ),
            Filter::Inherits(supertype) => required.push(
                store
                    .find_by_exact_name(supertype)
                    .into_iter()
                    .flat_map(|node| store.incoming(node.id, None))
                    .filter(|rel| rel.relationship_type.is_inheritance())
                    .map(|rel| rel.source_id)
                    .collect(),
            ),
            _ => {}
        }
    }

    let name_needles: Vec<String> = filters
        .iter()
        .filter_map(|f| match f {
            Filter::Name(name) => Some(name.to_lowercase()),
            _ => None,
        })
        .collect();

    let mut nodes: Vec<&CodeNode> = store
        .nodes()
        .iter()
        .filter(|node| required.iter().all(|ids| ids.contains(&node.id)))
        .filter(|node| {
            name_needles.is_empty() || {
                let name = node.name.to_lowercase();
                name_needles.iter().all(|needle| name.contains(needle.as_str()))
            }
        })
        .filter(|node| {
            filters.iter().all(|filter| match filter {
                Filter::Type(node_type) => node.node_type == *node_type,
                Filter::Public(flag) => node.is_public == *flag,
                _ => true,
            })
        })
        .collect();

    nodes.sort_by(|a, b| node_order(a, b));
    nodes
}
