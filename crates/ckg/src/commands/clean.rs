use anyhow::Result;
use slice_manager::{DataDirectory, DataDirectoryInfo};
use tracing::info;

use crate::utils::is_server_running;

/// Usage of the data directory before and after a clean
#[derive(Debug)]
pub struct CleanSummary {
    pub before: DataDirectoryInfo,
    pub after: DataDirectoryInfo,
}

pub fn run(data_directory: &DataDirectory) -> Result<CleanSummary> {
    if let Some(port) = is_server_running(data_directory)? {
        anyhow::bail!("ckg server is running on port {port}. Stop it before running clean.");
    }

    let before = data_directory.get_info()?;
    log_info("Before clean", &before);

    data_directory.clean()?;

    let after = data_directory.get_info()?;
    log_info("After clean", &after);
    info!("Clean completed");
    Ok(CleanSummary { before, after })
}

fn log_info(label: &str, data_info: &DataDirectoryInfo) {
    info!(
        "{label}: {} uses {} across {} slice(s)",
        data_info.root_path.display(),
        data_info.format_total_size(),
        data_info.slice_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_empties_slices() {
        let dir = tempfile::tempdir().unwrap();
        let data_directory = DataDirectory::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(data_directory.slices_dir.join("abc.json"), "{}").unwrap();

        run(&data_directory).unwrap();

        assert!(data_directory.slices_dir.is_dir());
        assert_eq!(std::fs::read_dir(&data_directory.slices_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_clean_reports_usage_before_and_after() {
        let dir = tempfile::tempdir().unwrap();
        let data_directory = DataDirectory::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(data_directory.slices_dir.join("one.json"), "{\"id\":\"one\"}").unwrap();
        std::fs::write(data_directory.slices_dir.join("two.json"), "{\"id\":\"two\"}").unwrap();
        std::fs::write(data_directory.logs_dir.join("ckg.log"), "started\n").unwrap();

        let summary = run(&data_directory).unwrap();

        assert_eq!(summary.before.slice_count, 2);
        assert!(summary.before.total_size > 0);
        assert_eq!(summary.after.slice_count, 0);
        assert_eq!(summary.after.total_size, 0);
        assert_eq!(summary.after.format_total_size(), "0 B");
    }
}
