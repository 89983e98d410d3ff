use crate::{DecisionPoint, DeclarationKind, ResolvedTree, TreeBuilder, method_key};
use anyhow::{Context, Result};
use indexer::parsing::parser::TREE_SUFFIX;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A project on disk made of serialized resolved trees, removed when dropped.
///
/// ```rust,ignore
/// let project = TestProject::new();
/// project.add_tree(TreeBuilder::new("src/Order.java").class("Order", 1).build());
/// let outcome = executor.build_project(project.path())?;
/// ```
pub struct TestProject {
    dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `tree` next to where its source file would live
    pub fn add_tree(&self, tree: ResolvedTree) -> PathBuf {
        let content = serde_json::to_string_pretty(&tree).expect("Failed to serialize tree");
        self.add_file(&format!("{}{TREE_SUFFIX}", tree.file_path), &content)
    }

    pub fn add_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative_path);
        write_file(&path, content).expect("Failed to write project file");
        debug!("Wrote test project file {}", path.display());
        path
    }

    pub fn remove_file(&self, relative_path: &str) {
        fs::remove_file(self.dir.path().join(relative_path)).expect("Failed to remove project file");
    }

    /// Small layered order-handling project:
    ///
    /// `OrderController.place -> OrderService.create -> OrderRepository.save`, with
    /// `JpaOrderRepository` implementing the repository, an unused `OrderService.cancel`,
    /// and `OrderService.status` moving from `PENDING` to `ACTIVE` inside `create`.
    pub fn shop() -> Self {
        let project = Self::new();
        for tree in shop_trees() {
            project.add_tree(tree);
        }
        project
    }
}

pub fn shop_trees() -> Vec<ResolvedTree> {
    let place = method_key("OrderController", "place");
    let create = method_key("OrderService", "create");
    let cancel = method_key("OrderService", "cancel");
    let save = method_key("OrderRepository", "save");

    vec![
        TreeBuilder::new("src/shop/Status.java")
            .package("shop")
            .lines_of_code(5)
            .enumeration("Status", &["PENDING", "ACTIVE", "CANCELLED"], 1)
            .build(),
        TreeBuilder::new("src/shop/web/OrderController.java")
            .package("shop.web")
            .lines_of_code(12)
            .class("OrderController", 1)
            .annotate("OrderController", "@RestController")
            .method("OrderController", "place", 5)
            .call(&place, &create, 6)
            .build(),
        TreeBuilder::new("src/shop/service/OrderService.java")
            .package("shop.service")
            .lines_of_code(30)
            .class("OrderService", 1)
            .field("OrderService", "status", "Status", Some("Status.PENDING"), 3)
            .method("OrderService", "create", 5)
            .call(&create, &save, 7)
            .assign(&create, "this.status", Some("Status.ACTIVE"), None, 8)
            .decisions(&create, &[DecisionPoint::If, DecisionPoint::And])
            .method("OrderService", "cancel", 12)
            .assign(&cancel, "status", Some("Status.CANCELLED"), Some("Status.ACTIVE"), 13)
            .build(),
        TreeBuilder::new("src/shop/data/OrderRepository.java")
            .package("shop.data")
            .lines_of_code(4)
            .type_decl(DeclarationKind::Interface, "OrderRepository", 1)
            .method("OrderRepository", "save", 3)
            .build(),
        TreeBuilder::new("src/shop/data/JpaOrderRepository.java")
            .package("shop.data")
            .lines_of_code(8)
            .class("JpaOrderRepository", 1)
            .implements("JpaOrderRepository", "OrderRepository")
            .method("JpaOrderRepository", "save", 3)
            .build(),
    ]
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_project_writes_one_tree_per_file() {
        let project = TestProject::shop();
        let tree_path = project.path().join("src/shop/service/OrderService.java.tree.json");
        assert!(tree_path.is_file());

        let tree: ResolvedTree = serde_json::from_str(&fs::read_to_string(tree_path).unwrap()).unwrap();
        assert_eq!(tree.package_name, "shop.service");
        assert_eq!(tree.declarations.len(), 4);
    }

    #[test]
    fn test_remove_file() {
        let project = TestProject::new();
        project.add_file("nested/dir/broken.tree.json", "{");
        assert!(project.path().join("nested/dir/broken.tree.json").exists());

        project.remove_file("nested/dir/broken.tree.json");
        assert!(!project.path().join("nested/dir/broken.tree.json").exists());
    }
}
