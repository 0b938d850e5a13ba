use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use newsbot_common::NewsbotError;

/// Append-only set of strings backed by a one-record-per-line file.
/// Used for delivered identifiers and for content hashes.
#[derive(Debug)]
pub struct SeenLog {
    path: PathBuf,
    entries: HashSet<String>,
}

impl SeenLog {
    /// Load the log. A missing file is an empty log.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, NewsbotError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(NewsbotError::persistence(&path, e)),
        };
        info!(path = %path.display(), entries = entries.len(), "Loaded seen log");
        Ok(Self { path, entries })
    }

    /// Re-read the file, replacing the in-memory set.
    pub fn reload(&mut self) -> Result<(), NewsbotError> {
        *self = Self::load(self.path.clone())?;
        Ok(())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains(value)
    }

    /// Record `value`. Already-present values are not written again.
    pub fn append(&mut self, value: &str) -> Result<(), NewsbotError> {
        let value = value.trim();
        if value.is_empty() || self.entries.contains(value) {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| NewsbotError::persistence(dir, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| NewsbotError::persistence(&self.path, e))?;
        writeln!(file, "{value}").map_err(|e| NewsbotError::persistence(&self.path, e))?;
        self.entries.insert(value.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = SeenLog::load(dir.path().join("sent.txt")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn appends_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("sent.txt");
        let mut log = SeenLog::load(&path).unwrap();
        log.append("https://www.cdm.me/?p=1").unwrap();
        log.append("https://www.cdm.me/?p=2").unwrap();
        log.append("https://www.cdm.me/?p=1").unwrap();

        let reloaded = SeenLog::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("https://www.cdm.me/?p=2"));
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn reload_picks_up_external_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hashes.txt");
        let mut log = SeenLog::load(&path).unwrap();
        std::fs::write(&path, "abc\n\ndef\n").unwrap();
        log.reload().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains("def"));
    }
}
