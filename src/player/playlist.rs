// Playlist - Ordered list of files to play

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ordered list of files with a cursor
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    files: Vec<PathBuf>,
    current: usize,
}

impl Playlist {
    /// Playlist in the given order
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files, current: 0 }
    }

    /// Regular files in `folder` whose extension matches `extension`
    /// (case-insensitive), sorted by path
    pub fn from_folder<P: AsRef<Path>>(folder: P, extension: &str) -> io::Result<Self> {
        let mut files = Vec::new();

        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if matches && path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(Self::new(files))
    }

    /// Expand command-line arguments: folders are scanned, files kept as given
    pub fn from_paths(paths: &[PathBuf], extension: &str) -> io::Result<Self> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(Self::from_folder(path, extension)?.files);
            } else {
                files.push(path.clone());
            }
        }
        Ok(Self::new(files))
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File under the cursor
    pub fn current(&self) -> Option<&Path> {
        self.files.get(self.current).map(PathBuf::as_path)
    }

    /// Move to the next file; returns false past the end
    pub fn advance(&mut self) -> bool {
        if self.current < self.files.len() {
            self.current += 1;
        }
        self.current < self.files.len()
    }
}
