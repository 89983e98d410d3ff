//! Data directory management for the slice-manager crate
//!
//! Everything the engine persists between runs lives under one directory,
//! `~/.ckg` unless `CKG_DATA_DIR` points elsewhere:
//!
//! ```text
//! .ckg/
//! ├── slices/
//! │   ├── 6f1c…-slice-id.json
//! │   ├── 9a2e…-slice-id.json
//! ├── logs/
//! │   ├── ckg.log
//! ```

use crate::errors::RepositoryError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type Result<T> = std::result::Result<T, RepositoryError>;

pub const DATA_DIR_ENV_VAR: &str = "CKG_DATA_DIR";
const CKG_DATA_DIR_NAME: &str = ".ckg";
const CKG_SLICES_DIR_NAME: &str = "slices";
const CKG_LOGS_DIR_NAME: &str = "logs";

/// Manages the centralized data directory of the engine
#[derive(Debug, Clone)]
pub struct DataDirectory {
    pub root_path: PathBuf,
    pub slices_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl DataDirectory {
    pub fn new_system_default() -> Result<Self> {
        let root_path = Self::get_system_data_directory()?;
        Self::new(root_path)
    }

    pub fn new(root_path: PathBuf) -> Result<Self> {
        let slices_dir = root_path.join(CKG_SLICES_DIR_NAME);
        let logs_dir = root_path.join(CKG_LOGS_DIR_NAME);
        let data_dir = Self {
            root_path,
            slices_dir,
            logs_dir,
        };
        data_dir.ensure_directory_structure()?;
        Ok(data_dir)
    }

    /// `CKG_DATA_DIR` when set, `~/.ckg` otherwise
    pub fn get_system_data_directory() -> Result<PathBuf> {
        if let Some(overridden) = std::env::var_os(DATA_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(overridden));
        }
        dirs::home_dir()
            .map(|home| home.join(CKG_DATA_DIR_NAME))
            .ok_or(RepositoryError::SystemDataDirectoryNotFound)
    }

    pub fn ensure_directory_structure(&self) -> Result<()> {
        for dir in [&self.root_path, &self.slices_dir, &self.logs_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|_| {
                    RepositoryError::DataDirectoryCreationFailed { path: dir.clone() }
                })?;
                debug!("Created data directory: {}", dir.display());
            }
        }
        Ok(())
    }

    /// Delete every persisted slice and log file, then recreate the empty layout
    pub fn clean(&self) -> Result<()> {
        for dir in [&self.slices_dir, &self.logs_dir] {
            if dir.exists() {
                std::fs::remove_dir_all(dir)?;
                info!("Removed {}", dir.display());
            }
        }
        self.ensure_directory_structure()
    }

    fn calculate_directory_size(dir: &Path) -> Result<u64> {
        if !dir.exists() {
            return Ok(0);
        }

        use ignore::WalkBuilder;
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU64, Ordering};

        let total_size = Arc::new(AtomicU64::new(0));
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .build_parallel();

        let size_clone = Arc::clone(&total_size);
        walker.run(|| {
            let size_ref = Arc::clone(&size_clone);
            Box::new(move |entry| {
                if let Ok(metadata) = entry.and_then(|e| e.metadata()) {
                    if metadata.is_file() {
                        size_ref.fetch_add(metadata.len(), Ordering::Relaxed);
                    }
                }
                ignore::WalkState::Continue
            })
        });

        Ok(total_size.load(Ordering::Relaxed))
    }

    fn count_slice_files(&self) -> Result<usize> {
        if !self.slices_dir.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in std::fs::read_dir(&self.slices_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn get_info(&self) -> Result<DataDirectoryInfo> {
        Ok(DataDirectoryInfo {
            root_path: self.root_path.clone(),
            total_size: Self::calculate_directory_size(&self.root_path)?,
            slice_count: self.count_slice_files()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DataDirectoryInfo {
    pub root_path: PathBuf,
    pub total_size: u64,
    pub slice_count: usize,
}

impl DataDirectoryInfo {
    pub fn format_total_size(&self) -> String {
        format_bytes(self.total_size)
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes < THRESHOLD {
        return format!("{bytes} B");
    }

    let mut unit_index = 0;
    let mut temp_bytes = bytes;
    while temp_bytes >= THRESHOLD && unit_index < UNITS.len() - 1 {
        temp_bytes /= THRESHOLD;
        unit_index += 1;
    }

    let divisor = THRESHOLD.pow(unit_index as u32);
    let size = bytes as f64 / divisor as f64;
    format!("{:.1} {}", size, UNITS[unit_index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_data_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join(".ckg");
        let data_dir = DataDirectory::new(root.clone()).unwrap();

        assert_eq!(data_dir.root_path, root);
        assert_eq!(data_dir.slices_dir, root.join("slices"));
        assert_eq!(data_dir.logs_dir, root.join("logs"));
        assert!(data_dir.slices_dir.is_dir());
        assert!(data_dir.logs_dir.is_dir());
    }

    #[test]
    fn test_info_and_clean() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = DataDirectory::new(temp_dir.path().to_path_buf()).unwrap();

        let empty = data_dir.get_info().unwrap();
        assert_eq!(empty.slice_count, 0);
        assert_eq!(empty.total_size, 0);

        fs::write(data_dir.slices_dir.join("a.json"), "{}").unwrap();
        fs::write(data_dir.slices_dir.join("b.json.tmp"), "{").unwrap();
        fs::write(data_dir.logs_dir.join("ckg.log"), "hello").unwrap();

        let info = data_dir.get_info().unwrap();
        assert_eq!(info.slice_count, 1);
        assert_eq!(info.total_size, 8);

        data_dir.clean().unwrap();
        let cleaned = data_dir.get_info().unwrap();
        assert_eq!(cleaned.slice_count, 0);
        assert!(data_dir.slices_dir.is_dir());
        assert!(data_dir.logs_dir.is_dir());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(format_bytes(1024_u64.pow(4)), "1.0 TB");
    }
}
