// On-disk state of the bot. Append-only logs for sent identifiers and content
// hashes; whole-file atomic rewrites for the embedding index and subscribers.

mod embedding_index;
mod seen_log;
mod subscribers;

pub use embedding_index::EmbeddingIndex;
pub use seen_log::SeenLog;
pub use subscribers::SubscriberStore;

use std::io::Write;
use std::path::Path;

use newsbot_common::NewsbotError;

/// Replace `path` with `contents` via a temp file in the same directory and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), NewsbotError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| NewsbotError::persistence(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| NewsbotError::persistence(path, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| NewsbotError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| NewsbotError::persistence(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("file.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
