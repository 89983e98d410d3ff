use anyhow::Result;
use serde::{Deserialize, Serialize};
use slice_manager::DataDirectory;
use std::fs;
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

const LOCK_FILE_NAME: &str = "ckg.lock";

pub fn get_lock_file_path(data_directory: &DataDirectory) -> PathBuf {
    data_directory.root_path.join(LOCK_FILE_NAME)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerLockInfo {
    pub port: u16,
    #[serde(default)]
    pub pid: Option<u32>,
}

pub fn read_lock_info(data_directory: &DataDirectory) -> Result<Option<ServerLockInfo>> {
    let lock_file = get_lock_file_path(data_directory);
    if !lock_file.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&lock_file)?;
    if let Ok(info) = serde_json::from_str::<ServerLockInfo>(contents.trim()) {
        return Ok(Some(info));
    }

    // Corrupt lock; remove and treat as not running
    let _ = fs::remove_file(lock_file);
    Ok(None)
}

pub fn write_lock_info(data_directory: &DataDirectory, info: &ServerLockInfo) -> Result<()> {
    let json = serde_json::to_string(info)?;
    fs::write(get_lock_file_path(data_directory), json)?;
    Ok(())
}

pub fn remove_lock_file(data_directory: &DataDirectory) -> Result<()> {
    let lock_file = get_lock_file_path(data_directory);
    if lock_file.exists() {
        fs::remove_file(lock_file)?;
    }
    Ok(())
}

/// Port of the live server recorded in the lock file, if any. Stale locks are removed.
pub fn is_server_running(data_directory: &DataDirectory) -> Result<Option<u16>> {
    let Some(lock) = read_lock_info(data_directory)? else {
        return Ok(None);
    };

    if TcpStream::connect_timeout(
        &format!("127.0.0.1:{}", lock.port).parse()?,
        Duration::from_millis(100),
    )
    .is_ok()
    {
        Ok(Some(lock.port))
    } else {
        remove_lock_file(data_directory)?;
        Ok(None)
    }
}

#[derive(Serialize, Deserialize)]
pub struct ServerInfo {
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn data_directory() -> (tempfile::TempDir, DataDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let data_directory = DataDirectory::new(dir.path().to_path_buf()).unwrap();
        (dir, data_directory)
    }

    #[test]
    fn test_live_server_is_detected() {
        let (_dir, data_directory) = data_directory();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        write_lock_info(&data_directory, &ServerLockInfo { port, pid: Some(1) }).unwrap();

        assert_eq!(is_server_running(&data_directory).unwrap(), Some(port));
    }

    #[test]
    fn test_stale_and_corrupt_locks_are_removed() {
        let (_dir, data_directory) = data_directory();
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        write_lock_info(&data_directory, &ServerLockInfo { port, pid: None }).unwrap();

        assert_eq!(is_server_running(&data_directory).unwrap(), None);
        assert!(!get_lock_file_path(&data_directory).exists());

        fs::write(get_lock_file_path(&data_directory), "not json").unwrap();
        assert_eq!(read_lock_info(&data_directory).unwrap(), None);
        assert!(!get_lock_file_path(&data_directory).exists());
    }
}
