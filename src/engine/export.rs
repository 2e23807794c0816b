//! Saving exported response bodies

use std::io;
use std::path::PathBuf;

/// Destination for response bodies requested by `export_file == '<name>'`
pub trait ExportSink: Send + Sync {
    /// Write `bytes` under `name`, returning where they landed
    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Writes exports into a directory, relative names resolved against it
pub struct FsExportSink {
    dir: PathBuf,
}

impl FsExportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for FsExportSink {
    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}
