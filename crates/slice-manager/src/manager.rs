use crate::errors::{Result, SliceError};
use crate::repository::SliceRepository;
use crate::slice::{
    CreateSliceRequest, ExpandOptions, FeatureSlice, SliceRecord, SliceStatistics,
    UpdateSliceRequest,
};
use chrono::Utc;
use dashmap::DashMap;
use database::graph::{GraphHandle, GraphStore, KnowledgeGraph, NodeId, RelationshipType};
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

pub const MAX_EXPANSION_DEPTH: usize = 10;

/// CRUD and expansion over feature slices.
///
/// Mutations of one slice are serialized through a per-id lock; different slices
/// never wait on each other. Reads resolve stored keys against whichever graph
/// snapshot is current when they run.
pub struct SliceManager {
    repository: Arc<dyn SliceRepository>,
    graph: Arc<GraphHandle>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Grow `members` one hop per enabled edge family per round, for `options.depth` rounds
pub fn expand_node_set(
    store: &GraphStore,
    members: &BTreeSet<NodeId>,
    options: &ExpandOptions,
) -> BTreeSet<NodeId> {
    let mut result = members.clone();
    let mut frontier: Vec<NodeId> = members.iter().copied().collect();

    for _ in 0..options.depth {
        let mut discovered = FxHashSet::default();
        for &id in &frontier {
            if options.include_callers {
                discovered.extend(
                    store
                        .incoming(id, Some(RelationshipType::Calls))
                        .map(|rel| rel.source_id),
                );
            }
            if options.include_callees {
                discovered.extend(
                    store
                        .outgoing(id, Some(RelationshipType::Calls))
                        .map(|rel| rel.target_id),
                );
            }
            if options.include_inheritance {
                discovered.extend(
                    store
                        .outgoing(id, None)
                        .filter(|rel| rel.relationship_type.is_inheritance())
                        .map(|rel| rel.target_id),
                );
                discovered.extend(
                    store
                        .incoming(id, None)
                        .filter(|rel| rel.relationship_type.is_inheritance())
                        .map(|rel| rel.source_id),
                );
            }
        }

        frontier = discovered
            .into_iter()
            .filter(|id| result.insert(*id))
            .collect();
        if frontier.is_empty() {
            break;
        }
    }
    result
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SliceError::InvalidRequest(
            "slice name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_depth(depth: usize) -> Result<()> {
    if depth > MAX_EXPANSION_DEPTH {
        return Err(SliceError::InvalidRequest(format!(
            "expansion depth must be at most {MAX_EXPANSION_DEPTH}"
        )));
    }
    Ok(())
}

/// Ids of the stored keys that still resolve, plus the keys that do not
fn resolve(store: &GraphStore, record: &SliceRecord) -> (BTreeSet<NodeId>, Vec<String>) {
    let mut ids = BTreeSet::new();
    let mut missing = Vec::new();
    for key in &record.node_keys {
        match store.find_by_key(key) {
            Some(node) => {
                ids.insert(node.id);
            }
            None => missing.push(key.clone()),
        }
    }
    (ids, missing)
}

fn keys_of(store: &GraphStore, ids: &BTreeSet<NodeId>) -> BTreeSet<String> {
    ids.iter()
        .filter_map(|id| store.get_node(*id))
        .map(|node| node.key.clone())
        .collect()
}

fn require_nodes(store: &GraphStore, ids: &[NodeId]) -> Result<()> {
    match ids.iter().find(|id| !store.contains(**id)) {
        Some(unknown) => Err(SliceError::UnknownNode(*unknown)),
        None => Ok(()),
    }
}

/// Distinct non-empty file paths of `ids`, sorted
fn file_paths(store: &GraphStore, ids: &BTreeSet<NodeId>) -> Vec<String> {
    ids.iter()
        .filter_map(|id| store.get_node(*id))
        .filter(|node| !node.file_path.is_empty())
        .map(|node| node.file_path.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn view(graph: &KnowledgeGraph, record: &SliceRecord) -> FeatureSlice {
    let store = graph.store();
    let (ids, missing_node_keys) = resolve(store, record);
    let file_paths = file_paths(store, &ids);
    FeatureSlice {
        id: record.id.clone(),
        name: record.name.clone(),
        description: record.description.clone(),
        created_date: record.created_date,
        updated_date: record.updated_date,
        node_count: ids.len(),
        node_ids: ids.into_iter().collect(),
        file_count: file_paths.len(),
        file_paths,
        missing_node_keys,
    }
}

impl SliceManager {
    pub fn new(repository: Arc<dyn SliceRepository>, graph: Arc<GraphHandle>) -> Self {
        Self {
            repository,
            graph,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn load(&self, id: &str) -> Result<SliceRecord> {
        self.repository
            .load(id)?
            .ok_or_else(|| SliceError::NotFound(id.to_string()))
    }

    /// `load` for callers holding the id's lock; drops the lock entry again when
    /// no such slice exists
    fn load_locked(&self, id: &str) -> Result<SliceRecord> {
        let loaded = self.load(id);
        if matches!(loaded, Err(SliceError::NotFound(_))) {
            self.locks.remove(id);
        }
        loaded
    }

    pub fn create(&self, request: CreateSliceRequest) -> Result<FeatureSlice> {
        let name = validate_name(&request.name)?;
        let expansion_depth = request.expansion_depth.unwrap_or(0);
        validate_depth(expansion_depth)?;

        let graph = self.graph.current();
        let store = graph.store();
        require_nodes(store, &request.seed_node_ids)?;

        let mut members: BTreeSet<NodeId> = request.seed_node_ids.iter().copied().collect();
        let mut applied_expansions = Vec::new();
        if expansion_depth > 0 {
            let options = ExpandOptions::all_families(expansion_depth);
            members = expand_node_set(store, &members, &options);
            applied_expansions.push(options);
        }

        let now = Utc::now();
        let record = SliceRecord {
            id: Uuid::new_v4().to_string(),
            name,
            description: request.description.unwrap_or_default(),
            created_date: now,
            updated_date: now,
            node_keys: keys_of(store, &members),
            applied_expansions,
        };
        self.repository.save(&record)?;

        info!(
            "Created slice '{}' ({}) with {} nodes",
            record.name,
            record.id,
            record.node_keys.len()
        );
        Ok(view(&graph, &record))
    }

    pub fn get(&self, id: &str) -> Result<FeatureSlice> {
        let record = self.load(id)?;
        Ok(view(&self.graph.current(), &record))
    }

    /// All slices, ordered by name then id
    pub fn list(&self) -> Result<Vec<FeatureSlice>> {
        let graph = self.graph.current();
        let mut records = self.repository.list()?;
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(records.iter().map(|record| view(&graph, record)).collect())
    }

    pub fn update(&self, id: &str, request: UpdateSliceRequest) -> Result<FeatureSlice> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut record = self.load_locked(id)?;
        let graph = self.graph.current();
        let store = graph.store();

        if let Some(name) = &request.name {
            record.name = validate_name(name)?;
        }
        if let Some(description) = request.description {
            record.description = description;
        }

        require_nodes(store, &request.add_node_ids)?;
        require_nodes(store, &request.remove_node_ids)?;
        let before = record.node_keys.clone();
        for id in &request.add_node_ids {
            if let Some(node) = store.get_node(*id) {
                record.node_keys.insert(node.key.clone());
            }
        }
        for id in &request.remove_node_ids {
            if let Some(node) = store.get_node(*id) {
                record.node_keys.remove(&node.key);
            }
        }
        if record.node_keys != before {
            // membership changed, earlier expansions no longer describe it
            record.applied_expansions.clear();
        }

        record.updated_date = Utc::now();
        self.repository.save(&record)?;
        debug!("Updated slice {}", record.id);
        Ok(view(&graph, &record))
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

        let deleted = self.repository.delete(id);
        self.locks.remove(id);
        if !deleted? {
            return Err(SliceError::NotFound(id.to_string()));
        }
        info!("Deleted slice {id}");
        Ok(())
    }

    /// Grow the slice; repeating an expansion already applied to the current
    /// membership leaves it unchanged
    pub fn expand(&self, id: &str, options: ExpandOptions) -> Result<FeatureSlice> {
        validate_depth(options.depth)?;
        let lock = self.lock_for(id);
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

        let mut record = self.load_locked(id)?;
        let graph = self.graph.current();
        if options.depth == 0 || record.applied_expansions.contains(&options) {
            return Ok(view(&graph, &record));
        }

        let store = graph.store();
        let (members, _) = resolve(store, &record);
        let expanded = expand_node_set(store, &members, &options);
        let added = expanded.len() - members.len();

        record.node_keys.extend(keys_of(store, &expanded));
        record.applied_expansions.push(options);
        if added > 0 {
            record.updated_date = Utc::now();
        }
        self.repository.save(&record)?;

        info!("Expanded slice {} by {} nodes", record.id, added);
        Ok(view(&graph, &record))
    }

    pub fn files(&self, id: &str) -> Result<Vec<String>> {
        Ok(self.get(id)?.file_paths)
    }

    pub fn statistics(&self, id: &str) -> Result<SliceStatistics> {
        let record = self.load(id)?;
        let graph = self.graph.current();
        let store = graph.store();
        let (ids, _) = resolve(store, &record);

        let mut node_type_counts = BTreeMap::new();
        let mut packages = BTreeSet::new();
        let mut relationship_type_counts = BTreeMap::new();
        for node in ids.iter().filter_map(|id| store.get_node(*id)) {
            *node_type_counts.entry(node.node_type).or_insert(0) += 1;
            if !node.package_name.is_empty() {
                packages.insert(node.package_name.as_str());
            }
            for rel in store.outgoing(node.id, None) {
                if ids.contains(&rel.target_id) {
                    *relationship_type_counts
                        .entry(rel.relationship_type)
                        .or_insert(0) += 1;
                }
            }
        }

        Ok(SliceStatistics {
            slice_id: record.id.clone(),
            node_count: ids.len(),
            file_count: file_paths(store, &ids).len(),
            package_count: packages.len(),
            node_type_counts,
            relationship_type_counts,
        })
    }
}
