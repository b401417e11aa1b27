//! Finding image files among command line inputs.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use glimpse_core::config::ProcessingConfig;

/// Discovers image files in files and directories.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,

    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover supported files under every input, in input order.
    ///
    /// Each directory is walked recursively and its files sorted by path. A
    /// file named twice is reported once. Missing inputs are logged and
    /// skipped.
    pub fn discover_all(&self, inputs: &[PathBuf]) -> Vec<DiscoveredFile> {
        let mut files: Vec<DiscoveredFile> = Vec::new();
        for input in inputs {
            if !input.exists() {
                tracing::warn!("Input not found: {:?}", input);
                continue;
            }
            for file in self.discover(input) {
                if !files.iter().any(|seen| seen.path == file.path) {
                    files.push(file);
                }
            }
        }
        files
    }

    /// Discover all supported image files at a path.
    ///
    /// An explicitly named file is accepted whatever its extension; the
    /// decoder sniffs the real format. Directory entries are filtered by
    /// extension.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            return std::fs::metadata(path)
                .map(|meta| {
                    vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                    }]
                })
                .unwrap_or_default();
        }

        let mut files: Vec<DiscoveredFile> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && self.is_supported(entry.path()))
            .filter_map(|entry| {
                let size = entry.metadata().ok()?.len();
                Some(DiscoveredFile {
                    path: entry.into_path(),
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.config.is_supported_extension(ext))
            .unwrap_or(false)
    }
}
