use crate::graph::facts::SourceFacts;
use crate::graph::store::GraphStore;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use tracing::info;

/// One immutable build generation: the graph plus the facts extracted with it
#[derive(Debug)]
pub struct KnowledgeGraph {
    store: GraphStore,
    facts: SourceFacts,
    generation: u64,
    built_at: DateTime<Utc>,
}

impl KnowledgeGraph {
    pub fn new(store: GraphStore, facts: SourceFacts) -> Self {
        Self {
            store,
            facts,
            generation: 0,
            built_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(GraphStore::new(), SourceFacts::new())
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn facts(&self) -> &SourceFacts {
        &self.facts
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Shared pointer to the current [`KnowledgeGraph`].
///
/// Readers take a cheap `Arc` clone and drop the lock immediately, so a rebuild can
/// swap in a new generation while earlier reads finish on the old one.
#[derive(Debug)]
pub struct GraphHandle {
    current: RwLock<Arc<KnowledgeGraph>>,
}

impl Default for GraphHandle {
    fn default() -> Self {
        Self::new(KnowledgeGraph::empty())
    }
}

impl GraphHandle {
    pub fn new(graph: KnowledgeGraph) -> Self {
        Self {
            current: RwLock::new(Arc::new(graph)),
        }
    }

    pub fn current(&self) -> Arc<KnowledgeGraph> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Install a freshly built graph as the next generation and return that generation
    pub fn replace(&self, mut graph: KnowledgeGraph) -> u64 {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        graph.generation = guard.generation + 1;
        let generation = graph.generation;

        info!(
            "Swapped knowledge graph to generation {} ({} nodes, {} relationships)",
            generation,
            graph.store.node_count(),
            graph.store.relationship_count()
        );
        *guard = Arc::new(graph);
        generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::types::{NewNode, NodeType};
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_replace_bumps_generation_and_keeps_old_readers() {
        let handle = GraphHandle::default();
        let before = handle.current();
        assert_eq!(before.generation(), 0);

        let mut store = GraphStore::new();
        store
            .add_node(NewNode::new("a.A", "A", NodeType::Class))
            .unwrap();
        let generation = handle.replace(KnowledgeGraph::new(store, SourceFacts::new()));

        assert_eq!(generation, 1);
        assert_eq!(handle.current().store().node_count(), 1);
        assert_eq!(before.store().node_count(), 0);
        assert!(logs_contain("Swapped knowledge graph to generation 1"));
    }
}
