use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::sorting::common::error::{Result, SortError};
use crate::sorting::snapshot::store::SnapshotStore;
use crate::sorting::stats::SessionStats;

/// Stores the snapshot as pretty-printed JSON.
///
/// Saves write a temporary file next to the target, sync it, and rename it
/// over the previous snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn persistence_error(&self, err: impl std::fmt::Display) -> SortError {
        SortError::Persistence(format!("{}: {}", self.path.display(), err))
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, stats: &SessionStats) -> Result<()> {
        let tmp = NamedTempFile::new_in(self.parent_dir()).map_err(|e| self.persistence_error(e))?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, stats).map_err(|e| self.persistence_error(e))?;
            writer.flush().map_err(|e| self.persistence_error(e))?;
        }
        tmp.as_file().sync_all().map_err(|e| self.persistence_error(e))?;

        tmp.persist(&self.path).map_err(|e| self.persistence_error(e.error))?;
        debug!(path = %self.path.display(), total = stats.total_scanned, "Snapshot written");
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionStats>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.persistence_error(e)),
        };

        let stats = serde_json::from_reader(BufReader::new(file)).map_err(|e| self.persistence_error(e))?;
        Ok(Some(stats))
    }
}
