use crate::errors::RepositoryError;
use crate::slice::SliceRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

type Result<T> = std::result::Result<T, RepositoryError>;

/// Persistence port for slices
pub trait SliceRepository: Send + Sync {
    fn save(&self, slice: &SliceRecord) -> Result<()>;
    fn load(&self, id: &str) -> Result<Option<SliceRecord>>;
    fn list(&self) -> Result<Vec<SliceRecord>>;
    /// Returns whether a slice was removed
    fn delete(&self, id: &str) -> Result<bool>;
}

/// One pretty-printed JSON file per slice
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    directory: PathBuf,
}

impl JsonFileRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `None` for ids that could escape the directory
    fn slice_path(&self, id: &str) -> Option<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.directory.join(format!("{id}.json")))
    }
}

impl SliceRepository for JsonFileRepository {
    fn save(&self, slice: &SliceRecord) -> Result<()> {
        let path = self.slice_path(&slice.id).ok_or_else(|| {
            RepositoryError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid slice id: {}", slice.id),
            ))
        })?;
        debug!("Saving slice {} to: {}", slice.id, path.display());

        let content = serde_json::to_string_pretty(slice)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<SliceRecord>> {
        let Some(path) = self.slice_path(id) else {
            return Ok(None);
        };
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<SliceRecord>> {
        let mut slices = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                slices.push(serde_json::from_str(&content)?);
            }
        }
        Ok(slices)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let Some(path) = self.slice_path(id) else {
            return Ok(false);
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    slices: RwLock<BTreeMap<String, SliceRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SliceRepository for InMemoryRepository {
    fn save(&self, slice: &SliceRecord) -> Result<()> {
        self.slices
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(slice.id.clone(), slice.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<SliceRecord>> {
        Ok(self
            .slices
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<SliceRecord>> {
        Ok(self
            .slices
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .cloned()
            .collect())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self
            .slices
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(id)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn record(id: &str) -> SliceRecord {
        SliceRecord {
            id: id.to_string(),
            name: format!("slice {id}"),
            description: String::new(),
            created_date: Utc::now(),
            updated_date: Utc::now(),
            node_keys: BTreeSet::from(["A".to_string(), "A#run".to_string()]),
            applied_expansions: Vec::new(),
        }
    }

    fn exercise(repository: &dyn SliceRepository) {
        assert!(repository.load("one").unwrap().is_none());

        repository.save(&record("one")).unwrap();
        repository.save(&record("two")).unwrap();
        let mut updated = record("one");
        updated.name = "renamed".to_string();
        repository.save(&updated).unwrap();

        assert_eq!(repository.load("one").unwrap(), Some(updated));
        assert_eq!(repository.list().unwrap().len(), 2);

        assert!(repository.delete("two").unwrap());
        assert!(!repository.delete("two").unwrap());
        assert_eq!(repository.list().unwrap().len(), 1);
    }

    #[test]
    fn test_in_memory_repository() {
        exercise(&InMemoryRepository::new());
    }

    #[test]
    fn test_json_file_repository() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonFileRepository::new(temp_dir.path().join("slices")).unwrap();
        exercise(&repository);

        let file = repository.directory().join("one.json");
        let content = fs::read_to_string(file).unwrap();
        assert!(content.contains("\n  \"name\": \"renamed\""));
        assert!(!repository.directory().join("one.json.tmp").exists());
    }

    #[test]
    fn test_json_file_repository_rejects_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonFileRepository::new(temp_dir.path()).unwrap();

        assert!(repository.load("../etc/passwd").unwrap().is_none());
        assert!(!repository.delete("..").unwrap());
        assert!(repository.save(&record("a/b")).is_err());
    }

    #[test]
    fn test_json_file_repository_surfaces_corrupt_files() {
        let temp_dir = TempDir::new().unwrap();
        let repository = JsonFileRepository::new(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("bad.json"), "{not json").unwrap();

        assert!(matches!(repository.load("bad"), Err(RepositoryError::Json(_))));
        assert!(repository.list().is_err());
    }
}
