use crate::analysis::builder::BuildReport;
use crate::parsing::processor::{ErroredFile, SkippedFile};
use chrono::{DateTime, Utc};
use database::graph::GraphStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use ts_rs::TS;

/// Summary of one project build, returned by the CLI and the rebuild endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct BuildStatistics {
    pub ckg_version: String,
    pub project_path: String,
    /// Snapshot generation the build was installed as, 0 until installed
    #[ts(type = "number")]
    pub generation: u64,
    #[ts(type = "string")]
    pub built_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_errored: usize,
    pub node_count: usize,
    pub relationship_count: usize,
    pub external_node_count: usize,
    pub duplicate_key_count: usize,
    pub orphaned_member_count: usize,
    pub node_type_counts: BTreeMap<String, usize>,
    pub relationship_type_counts: BTreeMap<String, usize>,
    pub skipped_files: Vec<SkippedFile>,
    pub errored_files: Vec<ErroredFile>,
}

pub struct StatisticsInput<'a> {
    pub project_path: String,
    pub files_discovered: usize,
    pub files_processed: usize,
    pub skipped_files: Vec<SkippedFile>,
    pub errored_files: Vec<ErroredFile>,
    pub store: &'a GraphStore,
    pub report: &'a BuildReport,
    pub duration: Duration,
}

pub fn finalize_build_statistics(input: StatisticsInput<'_>) -> BuildStatistics {
    let mut node_type_counts: BTreeMap<String, usize> = BTreeMap::new();
    for node in input.store.nodes() {
        *node_type_counts
            .entry(node.node_type.to_string())
            .or_insert(0) += 1;
    }

    let mut relationship_type_counts: BTreeMap<String, usize> = BTreeMap::new();
    for relationship in input.store.relationships() {
        *relationship_type_counts
            .entry(relationship.relationship_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    BuildStatistics {
        ckg_version: env!("CARGO_PKG_VERSION").to_string(),
        project_path: input.project_path,
        generation: 0,
        built_at: Utc::now(),
        duration_seconds: input.duration.as_secs_f64(),
        files_discovered: input.files_discovered,
        files_processed: input.files_processed,
        files_skipped: input.skipped_files.len(),
        files_errored: input.errored_files.len(),
        node_count: input.store.node_count(),
        relationship_count: input.store.relationship_count(),
        external_node_count: input.report.external_nodes,
        duplicate_key_count: input.report.duplicate_keys,
        orphaned_member_count: input.report.orphaned_members,
        node_type_counts,
        relationship_type_counts,
        skipped_files: input.skipped_files,
        errored_files: input.errored_files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::graph::{NewNode, NodeType, RelationshipType};

    #[test]
    fn test_counts_by_type() {
        let mut store = GraphStore::new();
        let class = store
            .add_node(NewNode::new("A", "A", NodeType::Class).in_file("A.java", 1))
            .unwrap();
        let method = store
            .add_node(NewNode::new("A#run()", "run", NodeType::Method).in_file("A.java", 2))
            .unwrap();
        store
            .add_relationship(RelationshipType::Contains, class, method, None, BTreeMap::new())
            .unwrap();

        let statistics = finalize_build_statistics(StatisticsInput {
            project_path: "/tmp/project".to_string(),
            files_discovered: 2,
            files_processed: 1,
            skipped_files: vec![SkippedFile {
                file_path: "Big.java.tree.json".to_string(),
                reason: "too big".to_string(),
                file_size: Some(10),
            }],
            errored_files: vec![],
            store: &store,
            report: &BuildReport::default(),
            duration: Duration::from_millis(5),
        });

        assert_eq!(statistics.node_type_counts.get("CLASS"), Some(&1));
        assert_eq!(statistics.node_type_counts.get("METHOD"), Some(&1));
        assert_eq!(statistics.relationship_type_counts.get("CONTAINS"), Some(&1));
        assert_eq!(statistics.files_skipped, 1);
        assert_eq!(statistics.generation, 0);

        let json = serde_json::to_value(&statistics).unwrap();
        assert_eq!(json["nodeCount"], 2);
        assert_eq!(json["skippedFiles"][0]["filePath"], "Big.java.tree.json");
    }
}
