pub mod project;

pub use indexer::parsing::tree::{DecisionPoint, Declaration, DeclarationKind, ResolvedTree};
pub use indexer::testing::{TreeBuilder, method_key};
pub use project::TestProject;
