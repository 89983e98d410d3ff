use crate::execution::config::IndexingConfig;
use crate::parsing::parser::SourceParser;
use crate::project::file_info::FileInfo;
use ignore::WalkBuilder;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

// File sources decouple discovery from processing: the executor only sees a list of
// `FileInfo`s, whether they came from walking a directory or from a caller that already
// knows which files to index.

pub trait FileSource {
    type Error: std::fmt::Display + Send + Sync + 'static;

    fn get_files(&self, config: &IndexingConfig) -> Result<Vec<FileInfo>, Self::Error>;
}

/// Walks a project directory and keeps the files the parser claims
pub struct PathFileSource {
    root: PathBuf,
    parser: Arc<dyn SourceParser>,
}

impl PathFileSource {
    pub fn new(root: PathBuf, parser: Arc<dyn SourceParser>) -> Self {
        Self { root, parser }
    }
}

impl FileSource for PathFileSource {
    type Error = std::io::Error;

    fn get_files(&self, config: &IndexingConfig) -> Result<Vec<FileInfo>, Self::Error> {
        if !self.root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Project root {} is not a directory", self.root.display()),
            ));
        }

        let files = Arc::new(Mutex::new(Vec::new()));

        WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(config.respect_gitignore)
            .git_global(config.respect_gitignore)
            .git_exclude(config.respect_gitignore)
            .ignore(config.respect_gitignore)
            .require_git(false)
            .parents(false)
            .threads(config.worker_threads)
            .build_parallel()
            .run(|| {
                let files: Arc<Mutex<Vec<FileInfo>>> = Arc::clone(&files);
                let parser = Arc::clone(&self.parser);
                let root = self.root.clone();

                Box::new(move |result| {
                    match result {
                        Ok(entry) => {
                            let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                            if is_file && parser.supports(entry.path()) {
                                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                                let file_info =
                                    FileInfo::from_path(&root, entry.path().to_path_buf(), size);
                                files
                                    .lock()
                                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                                    .push(file_info);
                            }
                        }
                        Err(e) => warn!("Skipping unreadable entry during discovery: {e}"),
                    }
                    ignore::WalkState::Continue
                })
            });

        let mut files = std::mem::take(
            &mut *files
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }
}
