use std::path::{Path, PathBuf};

/// A file found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    /// Path relative to the project root, with `/` separators
    pub relative_path: String,
    pub size: u64,
}

impl FileInfo {
    pub fn new(path: PathBuf, relative_path: String, size: u64) -> Self {
        Self {
            path,
            relative_path,
            size,
        }
    }

    pub fn from_path(root: &Path, path: PathBuf, size: u64) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self::new(path, relative_path, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/work/project");
        let info = FileInfo::from_path(root, root.join("src").join("A.java.tree.json"), 12);
        assert_eq!(info.relative_path, "src/A.java.tree.json");
        assert_eq!(info.size, 12);
    }
}
