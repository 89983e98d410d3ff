use chrono::{DateTime, Utc};
use database::graph::{NodeId, NodeType, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use ts_rs::TS;

/// Parameters of one expansion round set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "api.ts")]
pub struct ExpandOptions {
    pub depth: usize,
    pub include_callers: bool,
    pub include_callees: bool,
    pub include_inheritance: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self::all_families(1)
    }
}

impl ExpandOptions {
    pub fn all_families(depth: usize) -> Self {
        Self {
            depth,
            include_callers: true,
            include_callees: true,
            include_inheritance: true,
        }
    }
}

/// What the repository stores for a slice.
///
/// Members are kept as node keys, which survive rebuilds; node ids do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub node_keys: BTreeSet<String>,
    /// Expansions already folded into the current membership
    #[serde(default)]
    pub applied_expansions: Vec<ExpandOptions>,
}

/// A slice as handed to callers, resolved against the current graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct FeatureSlice {
    pub id: String,
    pub name: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_date: DateTime<Utc>,
    pub node_ids: Vec<NodeId>,
    pub node_count: usize,
    pub file_count: usize,
    pub file_paths: Vec<String>,
    /// Member keys with no node in the current graph
    pub missing_node_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct CreateSliceRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub seed_node_ids: Vec<NodeId>,
    /// Expand with every edge family this many rounds right after creation
    #[serde(default)]
    pub expansion_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct UpdateSliceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub add_node_ids: Vec<NodeId>,
    #[serde(default)]
    pub remove_node_ids: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct SliceStatistics {
    pub slice_id: String,
    pub node_count: usize,
    pub file_count: usize,
    pub package_count: usize,
    pub node_type_counts: BTreeMap<NodeType, usize>,
    /// Relationships with both ends inside the slice
    pub relationship_type_counts: BTreeMap<RelationshipType, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_options_fill_missing_fields() {
        let options: ExpandOptions =
            serde_json::from_str(r#"{"depth": 2, "includeCallers": false}"#).unwrap();
        assert_eq!(
            options,
            ExpandOptions {
                depth: 2,
                include_callers: false,
                include_callees: true,
                include_inheritance: true,
            }
        );
    }

    #[test]
    fn test_record_without_expansions_loads() {
        let record: SliceRecord = serde_json::from_str(
            r#"{
                "id": "s1",
                "name": "checkout",
                "description": "",
                "createdDate": "2025-01-01T00:00:00Z",
                "updatedDate": "2025-01-01T00:00:00Z",
                "nodeKeys": ["Cart", "Cart#add"]
            }"#,
        )
        .unwrap();
        assert_eq!(record.node_keys.len(), 2);
        assert!(record.applied_expansions.is_empty());
    }
}
