//! Resolved syntax tree handed over by a [`crate::parsing::parser::SourceParser`].
//!
//! A tree is the parser's view of one source file after symbol resolution: every
//! declaration carries a qualified key, and every reference it makes carries the key of
//! the declaration it resolved to, or no key when resolution failed.

use database::graph::NodeType;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTree {
    /// Project-relative path of the source file the tree was produced from
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub package_name: String,
    /// Original source text, used for size metrics
    #[serde(default)]
    pub source: Option<String>,
    /// Size reported by the parser when the source text is not shipped
    #[serde(default)]
    pub lines_of_code: Option<u32>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DeclarationKind {
    Class,
    Interface,
    Enum,
    /// Closed union or sealed hierarchy root
    Union,
    Method,
    Constructor,
    Field,
    Function,
    Component,
}

impl DeclarationKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            DeclarationKind::Class => NodeType::Class,
            DeclarationKind::Interface => NodeType::Interface,
            DeclarationKind::Enum => NodeType::Enum,
            DeclarationKind::Union => NodeType::TypeAlias,
            DeclarationKind::Method => NodeType::Method,
            DeclarationKind::Constructor => NodeType::Constructor,
            DeclarationKind::Field => NodeType::Field,
            DeclarationKind::Function => NodeType::Function,
            DeclarationKind::Component => NodeType::Component,
        }
    }
}

/// Branching construct counted towards cyclomatic complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionPoint {
    If,
    For,
    While,
    Case,
    Catch,
    And,
    Or,
    Ternary,
}

/// A symbol as written at a use site, plus its resolved key when resolution succeeded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRef {
    pub name: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl SymbolRef {
    pub fn resolved(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some(key.into()),
        }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }

    /// Key used to look the target up in the graph. Unresolved refs fall back to the name.
    pub fn lookup_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub target: SymbolRef,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVariable {
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub value_type: Option<SymbolRef>,
    #[serde(default)]
    pub initializer: Option<String>,
}

/// `target = value` inside a callable body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Assigned variable as written, `this.` qualifiers allowed
    pub target: String,
    /// Constant on the right-hand side, absent when the value is computed
    #[serde(default)]
    pub value: Option<String>,
    /// Constant the target was compared against in an enclosing condition
    #[serde(default)]
    pub guard: Option<String>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub key: String,
    pub name: String,
    pub kind: DeclarationKind,
    pub line: u32,
    /// Key of the enclosing declaration
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub documentation: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub extends: Vec<SymbolRef>,
    #[serde(default)]
    pub implements: Vec<SymbolRef>,
    #[serde(default)]
    pub calls: Vec<Reference>,
    #[serde(default)]
    pub field_accesses: Vec<Reference>,
    #[serde(default)]
    pub type_references: Vec<Reference>,
    #[serde(default)]
    pub decision_points: Vec<DecisionPoint>,
    /// Enum constants or union members, in source order
    #[serde(default)]
    pub variants: Vec<VariantDecl>,
    /// Declared type of a field
    #[serde(default)]
    pub value_type: Option<SymbolRef>,
    #[serde(default)]
    pub initializer: Option<String>,
    #[serde(default)]
    pub locals: Vec<LocalVariable>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Declaration {
    pub fn new(key: impl Into<String>, name: impl Into<String>, kind: DeclarationKind, line: u32) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            kind,
            line,
            parent: None,
            signature: None,
            documentation: None,
            modifiers: Vec::new(),
            annotations: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
            calls: Vec::new(),
            field_accesses: Vec::new(),
            type_references: Vec::new(),
            decision_points: Vec::new(),
            variants: Vec::new(),
            value_type: None,
            initializer: None,
            locals: Vec::new(),
            assignments: Vec::new(),
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m.eq_ignore_ascii_case(modifier))
    }

    pub fn is_public(&self) -> bool {
        self.has_modifier("public") || self.has_modifier("export")
    }
}

/// Strip qualifiers from a constant or variable as written: `Status.ACTIVE` -> `ACTIVE`
pub fn simple_name(written: &str) -> &str {
    written
        .rsplit(['.', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(written)
}
