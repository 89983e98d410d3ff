//! Fluent builders for resolved trees used across the workspace's tests

use crate::parsing::tree::{
    Assignment, DecisionPoint, Declaration, DeclarationKind, Reference, ResolvedTree, SymbolRef,
    VariantDecl,
};

/// Key the builders give a method named `name` inside `owner`
pub fn method_key(owner: &str, name: &str) -> String {
    format!("{owner}#{name}()")
}

pub struct TreeBuilder {
    tree: ResolvedTree,
}

impl TreeBuilder {
    pub fn new(file_path: &str) -> Self {
        Self {
            tree: ResolvedTree {
                file_path: file_path.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn package(mut self, package_name: &str) -> Self {
        self.tree.package_name = package_name.to_string();
        self
    }

    pub fn source(mut self, source: &str) -> Self {
        self.tree.source = Some(source.to_string());
        self
    }

    pub fn lines_of_code(mut self, lines: u32) -> Self {
        self.tree.lines_of_code = Some(lines);
        self
    }

    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.tree.declarations.push(declaration);
        self
    }

    /// Public type declaration keyed by its name
    pub fn type_decl(self, kind: DeclarationKind, name: &str, line: u32) -> Self {
        let mut declaration = Declaration::new(name, name, kind, line);
        declaration.modifiers.push("public".to_string());
        self.declare(declaration)
    }

    pub fn class(self, name: &str, line: u32) -> Self {
        self.type_decl(DeclarationKind::Class, name, line)
    }

    pub fn enumeration(self, name: &str, variants: &[&str], line: u32) -> Self {
        self.type_decl(DeclarationKind::Enum, name, line)
            .with(name, |declaration| {
                declaration.variants = variants
                    .iter()
                    .enumerate()
                    .map(|(offset, variant)| VariantDecl {
                        name: variant.to_string(),
                        line: line + 1 + offset as u32,
                    })
                    .collect();
            })
    }

    /// Public method of `owner`, keyed with [`method_key`]
    pub fn method(self, owner: &str, name: &str, line: u32) -> Self {
        self.member(owner, name, DeclarationKind::Method, line, true)
    }

    pub fn member(
        self,
        owner: &str,
        name: &str,
        kind: DeclarationKind,
        line: u32,
        is_public: bool,
    ) -> Self {
        let key = match kind {
            DeclarationKind::Field => format!("{owner}#{name}"),
            _ => method_key(owner, name),
        };
        let mut declaration = Declaration::new(key, name, kind, line);
        declaration.parent = Some(owner.to_string());
        if is_public {
            declaration.modifiers.push("public".to_string());
        }
        self.declare(declaration)
    }

    /// Field of `owner` typed with a resolved type key
    pub fn field(self, owner: &str, name: &str, type_key: &str, initializer: Option<&str>, line: u32) -> Self {
        let key = format!("{owner}#{name}");
        self.member(owner, name, DeclarationKind::Field, line, false)
            .with(&key, |declaration| {
                declaration.value_type = Some(SymbolRef::resolved(type_key, type_key));
                declaration.initializer = initializer.map(str::to_string);
            })
    }

    /// Record a resolved call from the declaration `from` to the key `to`
    pub fn call(self, from: &str, to: &str, line: u32) -> Self {
        self.with(from, |declaration| {
            declaration.calls.push(Reference {
                target: SymbolRef::resolved(to, to),
                line: Some(line),
            })
        })
    }

    pub fn unresolved_call(self, from: &str, name: &str, line: u32) -> Self {
        self.with(from, |declaration| {
            declaration.calls.push(Reference {
                target: SymbolRef::unresolved(name),
                line: Some(line),
            })
        })
    }

    pub fn extends(self, from: &str, to: &str) -> Self {
        self.with(from, |declaration| {
            declaration.extends.push(SymbolRef::resolved(to, to))
        })
    }

    pub fn implements(self, from: &str, to: &str) -> Self {
        self.with(from, |declaration| {
            declaration.implements.push(SymbolRef::resolved(to, to))
        })
    }

    pub fn decisions(self, key: &str, points: &[DecisionPoint]) -> Self {
        self.with(key, |declaration| {
            declaration.decision_points.extend_from_slice(points)
        })
    }

    pub fn annotate(self, key: &str, annotation: &str) -> Self {
        self.with(key, |declaration| {
            declaration.annotations.push(annotation.to_string())
        })
    }

    pub fn assign(
        self,
        method: &str,
        target: &str,
        value: Option<&str>,
        guard: Option<&str>,
        line: u32,
    ) -> Self {
        self.with(method, |declaration| {
            declaration.assignments.push(Assignment {
                target: target.to_string(),
                value: value.map(str::to_string),
                guard: guard.map(str::to_string),
                line,
            })
        })
    }

    /// Mutate the declaration with `key`
    pub fn with(mut self, key: &str, update: impl FnOnce(&mut Declaration)) -> Self {
        let declaration = self
            .tree
            .declarations
            .iter_mut()
            .find(|d| d.key == key)
            .unwrap_or_else(|| panic!("no declaration with key {key}"));
        update(declaration);
        self
    }

    pub fn build(self) -> ResolvedTree {
        self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_members_with_parent_keys() {
        let tree = TreeBuilder::new("src/Order.java")
            .package("com.acme")
            .class("Order", 1)
            .method("Order", "place", 3)
            .method("Order", "ship", 7)
            .call(&method_key("Order", "place"), &method_key("Order", "ship"), 4)
            .build();

        assert_eq!(tree.declarations.len(), 3);
        assert_eq!(tree.declarations[1].parent.as_deref(), Some("Order"));
        assert_eq!(tree.declarations[1].calls[0].target.lookup_key(), "Order#ship()");
    }

    #[test]
    fn test_enumeration_numbers_variant_lines() {
        let tree = TreeBuilder::new("Status.java")
            .enumeration("Status", &["PENDING", "ACTIVE"], 1)
            .build();
        let lines: Vec<u32> = tree.declarations[0].variants.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }
}
