pub mod facts;
pub mod snapshot;
pub mod store;
pub mod types;

pub use facts::{
    AssignmentFact, FileFacts, SourceFacts, Variant, VariableFact, VariableId, VariantForm,
    VariantSet,
};
pub use snapshot::{GraphHandle, KnowledgeGraph};
pub use store::GraphStore;
pub use types::{CodeNode, NewNode, NodeId, NodeType, Relationship, RelationshipId, RelationshipType};
