use crate::analysis::test_detection::is_test_callable;
use crate::parsing::processor::FileProcessingResult;
use crate::parsing::tree::{Declaration, DeclarationKind, SymbolRef, simple_name};
use database::errors::GraphError;
use database::graph::{
    AssignmentFact, FileFacts, GraphStore, NewNode, NodeId, NodeType, RelationshipType,
    SourceFacts, Variant, VariableFact, VariableId, VariantForm, VariantSet,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How a declaration refers to another symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceKind {
    Call,
    Extends,
    Implements,
    FieldAccess,
    TypeUse,
}

impl ReferenceKind {
    fn relationship_type(&self) -> RelationshipType {
        match self {
            ReferenceKind::Call => RelationshipType::Calls,
            ReferenceKind::Extends => RelationshipType::Inherits,
            ReferenceKind::Implements => RelationshipType::Implements,
            ReferenceKind::FieldAccess | ReferenceKind::TypeUse => RelationshipType::References,
        }
    }

    /// Best guess at what an unresolved target is, from the way it was referenced
    fn inferred_node_type(&self) -> NodeType {
        match self {
            ReferenceKind::Call => NodeType::Method,
            ReferenceKind::Extends => NodeType::Class,
            ReferenceKind::Implements => NodeType::Interface,
            ReferenceKind::FieldAccess => NodeType::Field,
            ReferenceKind::TypeUse => NodeType::Class,
        }
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        let kind = match self {
            ReferenceKind::FieldAccess => "field_access",
            ReferenceKind::TypeUse => "type_use",
            _ => return BTreeMap::new(),
        };
        BTreeMap::from([("kind".to_string(), kind.to_string())])
    }
}

/// Every outgoing reference of a declaration, in a fixed order
fn references_of(
    declaration: &Declaration,
) -> impl Iterator<Item = (ReferenceKind, &SymbolRef, Option<u32>)> + '_ {
    let extends = declaration
        .extends
        .iter()
        .map(|r| (ReferenceKind::Extends, r, None));
    let implements = declaration
        .implements
        .iter()
        .map(|r| (ReferenceKind::Implements, r, None));
    let calls = declaration
        .calls
        .iter()
        .map(|r| (ReferenceKind::Call, &r.target, r.line));
    let field_accesses = declaration
        .field_accesses
        .iter()
        .map(|r| (ReferenceKind::FieldAccess, &r.target, r.line));
    let type_references = declaration
        .type_references
        .iter()
        .map(|r| (ReferenceKind::TypeUse, &r.target, r.line));
    let value_type = declaration
        .value_type
        .iter()
        .map(move |r| (ReferenceKind::TypeUse, r, Some(declaration.line)));
    let local_types = declaration.locals.iter().filter_map(|local| {
        local
            .value_type
            .as_ref()
            .map(|r| (ReferenceKind::TypeUse, r, Some(local.line)))
    });

    extends
        .chain(implements)
        .chain(calls)
        .chain(field_accesses)
        .chain(type_references)
        .chain(value_type)
        .chain(local_types)
}

/// Counters gathered while building, reported in build statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub duplicate_keys: usize,
    pub external_nodes: usize,
    /// Members whose `parent` key did not resolve
    pub orphaned_members: usize,
}

#[derive(Debug)]
pub struct BuildOutput {
    pub store: GraphStore,
    pub facts: SourceFacts,
    pub report: BuildReport,
}

/// Turns resolved trees into a [`GraphStore`] plus [`SourceFacts`].
///
/// Ids are assigned deterministically: files in path order, declarations in source
/// order, then one external node per unresolved key in key order. Building the same
/// input twice therefore yields identical ids.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    store: GraphStore,
    facts: SourceFacts,
    report: BuildReport,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self, mut files: Vec<FileProcessingResult>) -> Result<BuildOutput, GraphError> {
        let start = Instant::now();
        files.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        let declared = self.add_declarations(&files)?;
        let resolver = Resolver {
            declared: &declared,
        };

        self.add_external_nodes(&files, &resolver)?;
        self.add_relationships(&files, &resolver)?;
        self.extract_state_facts(&files, &resolver);

        info!(
            "Built knowledge graph from {} files: {} nodes ({} external), {} relationships in {:?}",
            files.len(),
            self.store.node_count(),
            self.report.external_nodes,
            self.store.relationship_count(),
            start.elapsed()
        );

        Ok(BuildOutput {
            store: self.store,
            facts: self.facts,
            report: self.report,
        })
    }

    fn add_declarations<'f>(
        &mut self,
        files: &'f [FileProcessingResult],
    ) -> Result<Vec<DeclaredFile<'f>>, GraphError> {
        let mut declared = Vec::with_capacity(files.len());

        for file in files {
            debug!(
                "Adding {} declarations from {}",
                file.tree.declarations.len(),
                file.file_path
            );
            self.facts.record_file(FileFacts {
                file_path: file.file_path.clone(),
                package_name: file.tree.package_name.clone(),
                lines_of_code: file.lines_of_code,
            });

            let mut ids = Vec::with_capacity(file.tree.declarations.len());
            let mut local_keys = FxHashMap::default();

            for declaration in &file.tree.declarations {
                let key = if self.store.find_by_key(&declaration.key).is_some() {
                    let renamed = unique_key(&self.store, &declaration.key, &file.file_path);
                    warn!(
                        "Duplicate declaration key '{}' in {}, stored as '{}'",
                        declaration.key, file.file_path, renamed
                    );
                    self.report.duplicate_keys += 1;
                    renamed
                } else {
                    declaration.key.clone()
                };

                let mut node = NewNode::new(key, declaration.name.clone(), declaration.kind.node_type())
                    .in_file(file.file_path.clone(), declaration.line)
                    .in_package(file.tree.package_name.clone())
                    .public(declaration.is_public());
                node.signature = declaration.signature.clone();
                node.documentation = declaration.documentation.clone();
                node.is_static = declaration.has_modifier("static");
                node.is_abstract = declaration.has_modifier("abstract");
                node.annotations = declaration.annotations.clone();

                let id = self.store.add_node(node)?;
                local_keys.entry(declaration.key.as_str()).or_insert(id);
                ids.push(id);
            }

            declared.push(DeclaredFile {
                file,
                ids,
                local_keys,
            });
        }

        Ok(declared)
    }

    fn add_external_nodes(
        &mut self,
        files: &[FileProcessingResult],
        resolver: &Resolver<'_, '_>,
    ) -> Result<(), GraphError> {
        let mut unresolved: BTreeMap<&str, (&str, NodeType)> = BTreeMap::new();

        for (file_index, file) in files.iter().enumerate() {
            for declaration in &file.tree.declarations {
                for (kind, reference, _) in references_of(declaration) {
                    let key = reference.lookup_key();
                    if resolver.resolve(&self.store, file_index, key).is_none() {
                        unresolved
                            .entry(key)
                            .or_insert((reference.name.as_str(), kind.inferred_node_type()));
                    }
                }
            }
        }

        for (key, (name, node_type)) in unresolved {
            let name = match simple_name(name) {
                "" => key,
                simple => simple,
            };
            self.store
                .add_node(NewNode::new(key, name, node_type).external())?;
            self.report.external_nodes += 1;
        }

        Ok(())
    }

    fn add_relationships(
        &mut self,
        files: &[FileProcessingResult],
        resolver: &Resolver<'_, '_>,
    ) -> Result<(), GraphError> {
        for (file_index, file) in files.iter().enumerate() {
            for (declaration, &id) in file
                .tree
                .declarations
                .iter()
                .zip(&resolver.declared[file_index].ids)
            {
                if let Some(parent_key) = &declaration.parent {
                    match resolver.resolve(&self.store, file_index, parent_key) {
                        Some(parent) if parent != id => {
                            self.store.add_relationship(
                                RelationshipType::Contains,
                                parent,
                                id,
                                None,
                                BTreeMap::new(),
                            )?;
                        }
                        _ => {
                            warn!(
                                "Container '{}' of '{}' in {} did not resolve",
                                parent_key, declaration.key, file.file_path
                            );
                            self.report.orphaned_members += 1;
                        }
                    }
                }

                for (kind, reference, line) in references_of(declaration) {
                    let target = resolver
                        .resolve(&self.store, file_index, reference.lookup_key())
                        .ok_or(GraphError::NodeNotFound(id))?;
                    self.store.add_relationship(
                        kind.relationship_type(),
                        id,
                        target,
                        line,
                        kind.metadata(),
                    )?;
                }

                let node_type = declaration.kind.node_type();
                if node_type.is_callable() {
                    self.facts
                        .record_decision_points(id, declaration.decision_points.len() as u32);
                    if is_test_callable(&declaration.name, &file.file_path, &declaration.annotations) {
                        self.facts.mark_test(id);
                    }
                }

                if !declaration.variants.is_empty() {
                    let form = match declaration.kind {
                        DeclarationKind::Enum => VariantForm::Enum,
                        _ => VariantForm::Union,
                    };
                    let variants = declaration
                        .variants
                        .iter()
                        .map(|v| Variant {
                            name: simple_name(&v.name).to_string(),
                            line: v.line,
                        })
                        .collect();
                    self.facts.set_variants(id, VariantSet { form, variants });
                }
            }
        }

        Ok(())
    }

    /// Record enum/union-typed variables and the assignments made to them
    fn extract_state_facts(&mut self, files: &[FileProcessingResult], resolver: &Resolver<'_, '_>) {
        let mut fields: FxHashMap<(NodeId, String), VariableId> = FxHashMap::default();
        let mut locals: FxHashMap<(NodeId, String), VariableId> = FxHashMap::default();

        for (file_index, file) in files.iter().enumerate() {
            for (declaration, &id) in file
                .tree
                .declarations
                .iter()
                .zip(&resolver.declared[file_index].ids)
            {
                if declaration.kind == DeclarationKind::Field {
                    let owner = self.store.parent_of(id).map_or(id, |parent| parent.id);
                    if let Some(variable) = self.state_variable(
                        file_index,
                        resolver,
                        &declaration.name,
                        declaration.line,
                        owner,
                        declaration.value_type.as_ref(),
                        declaration.initializer.as_deref(),
                    ) {
                        fields.insert((owner, declaration.name.clone()), variable);
                    }
                }

                for local in &declaration.locals {
                    if let Some(variable) = self.state_variable(
                        file_index,
                        resolver,
                        &local.name,
                        local.line,
                        id,
                        local.value_type.as_ref(),
                        local.initializer.as_deref(),
                    ) {
                        locals.insert((id, local.name.clone()), variable);
                    }
                }
            }
        }

        for (file_index, file) in files.iter().enumerate() {
            for (declaration, &id) in file
                .tree
                .declarations
                .iter()
                .zip(&resolver.declared[file_index].ids)
            {
                for assignment in &declaration.assignments {
                    let name = simple_name(&assignment.target).to_string();
                    let variable = locals
                        .get(&(id, name.clone()))
                        .or_else(|| self.enclosing_field(&fields, id, name))
                        .copied();

                    if let Some(variable) = variable {
                        self.facts.add_assignment(AssignmentFact {
                            variable,
                            method: id,
                            value: assignment.value.as_deref().map(|v| simple_name(v).to_string()),
                            guard: assignment.guard.as_deref().map(|g| simple_name(g).to_string()),
                            line: assignment.line,
                        });
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn state_variable(
        &mut self,
        file_index: usize,
        resolver: &Resolver<'_, '_>,
        name: &str,
        line: u32,
        owner: NodeId,
        value_type: Option<&SymbolRef>,
        initializer: Option<&str>,
    ) -> Option<VariableId> {
        let type_id = resolver.resolve(&self.store, file_index, value_type?.lookup_key())?;
        self.facts.variants_of(type_id)?;

        Some(self.facts.add_variable(VariableFact {
            name: name.to_string(),
            file_path: resolver.declared[file_index].file.file_path.clone(),
            line,
            owner,
            type_id,
            initializer: initializer.map(|i| simple_name(i).to_string()),
        }))
    }

    /// Field named `name` on the nearest enclosing type of `callable`
    fn enclosing_field<'m>(
        &self,
        fields: &'m FxHashMap<(NodeId, String), VariableId>,
        callable: NodeId,
        name: String,
    ) -> Option<&'m VariableId> {
        let mut visited = FxHashSet::default();
        let mut key = (callable, name);

        while let Some(container) = self.store.parent_of(key.0) {
            if !visited.insert(container.id) {
                break;
            }
            key.0 = container.id;
            if let Some(variable) = fields.get(&key) {
                return Some(variable);
            }
        }

        None
    }
}

/// Node ids assigned to one file's declarations
struct DeclaredFile<'f> {
    file: &'f FileProcessingResult,
    ids: Vec<NodeId>,
    /// First declaration per original key within this file
    local_keys: FxHashMap<&'f str, NodeId>,
}

struct Resolver<'d, 'f> {
    declared: &'d [DeclaredFile<'f>],
}

impl Resolver<'_, '_> {
    /// Resolve a key from inside `file_index`, preferring declarations in that same file
    fn resolve(&self, store: &GraphStore, file_index: usize, key: &str) -> Option<NodeId> {
        self.declared
            .get(file_index)
            .and_then(|file| file.local_keys.get(key).copied())
            .or_else(|| store.find_by_key(key).map(|node| node.id))
    }
}

fn unique_key(store: &GraphStore, key: &str, file_path: &str) -> String {
    let candidate = format!("{key}@{file_path}");
    if store.find_by_key(&candidate).is_none() {
        return candidate;
    }
    (2..)
        .map(|n| format!("{candidate}#{n}"))
        .find(|c| store.find_by_key(c).is_none())
        .unwrap_or(candidate)
}
