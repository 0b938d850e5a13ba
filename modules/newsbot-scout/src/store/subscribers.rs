use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use newsbot_common::{ChatId, NewsbotError};

/// Subscribed chat ids, one per line, rewritten atomically on every change.
#[derive(Debug)]
pub struct SubscriberStore {
    path: PathBuf,
    chats: BTreeSet<ChatId>,
}

impl SubscriberStore {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, NewsbotError> {
        let path = path.into();
        let chats = Self::read_ids(&path)?;
        Ok(Self { path, chats })
    }

    /// Current subscribers as stored on disk. Lines that are not chat ids are skipped.
    pub fn read_ids(path: &Path) -> Result<BTreeSet<ChatId>, NewsbotError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No subscribers file found, starting fresh");
                return Ok(BTreeSet::new());
            }
            Err(e) => return Err(NewsbotError::persistence(path, e)),
        };
        let mut chats = BTreeSet::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.parse::<ChatId>() {
                Ok(id) => {
                    chats.insert(id);
                }
                Err(_) => warn!(path = %path.display(), line, "Skipping malformed subscriber line"),
            }
        }
        info!(subscribers = chats.len(), "Loaded subscribers");
        Ok(chats)
    }

    /// Returns `false` when the chat was already subscribed. The in-memory
    /// set only changes once the file has been written.
    pub fn subscribe(&mut self, chat_id: ChatId) -> Result<bool, NewsbotError> {
        if self.chats.contains(&chat_id) {
            return Ok(false);
        }
        let mut chats = self.chats.clone();
        chats.insert(chat_id);
        self.commit(chats)?;
        Ok(true)
    }

    /// Returns `false` when the chat was not subscribed.
    pub fn unsubscribe(&mut self, chat_id: ChatId) -> Result<bool, NewsbotError> {
        if !self.chats.contains(&chat_id) {
            return Ok(false);
        }
        let mut chats = self.chats.clone();
        chats.remove(&chat_id);
        self.commit(chats)?;
        Ok(true)
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.chats.contains(&chat_id)
    }

    pub fn chats(&self) -> &BTreeSet<ChatId> {
        &self.chats
    }

    fn commit(&mut self, chats: BTreeSet<ChatId>) -> Result<(), NewsbotError> {
        let mut contents = String::new();
        for id in &chats {
            contents.push_str(&id.to_string());
            contents.push('\n');
        }
        super::write_atomic(&self.path, contents.as_bytes())?;
        info!(subscribers = chats.len(), "Saved subscribers");
        self.chats = chats;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_and_unsubscribe_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");
        let mut store = SubscriberStore::load(&path).unwrap();

        assert!(store.subscribe(42).unwrap());
        assert!(!store.subscribe(42).unwrap());
        assert!(store.subscribe(-1001).unwrap());
        assert_eq!(SubscriberStore::read_ids(&path).unwrap().len(), 2);

        assert!(store.unsubscribe(42).unwrap());
        assert!(!store.unsubscribe(42).unwrap());
        let on_disk = SubscriberStore::read_ids(&path).unwrap();
        assert_eq!(on_disk.into_iter().collect::<Vec<_>>(), vec![-1001]);
    }

    #[test]
    fn failed_write_leaves_subscribers_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("state");
        let path = parent.join("subscribers.txt");
        let mut store = SubscriberStore::load(&path).unwrap();

        // A plain file where the directory should be makes every write fail.
        std::fs::write(&parent, "not a directory").unwrap();
        assert!(store.subscribe(7).is_err());
        assert!(!store.contains(7));

        std::fs::remove_file(&parent).unwrap();
        assert!(store.subscribe(7).unwrap());
        assert_eq!(SubscriberStore::read_ids(&path).unwrap().into_iter().collect::<Vec<_>>(), vec![7]);

        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, "not a directory").unwrap();
        assert!(store.unsubscribe(7).is_err());
        assert!(store.contains(7));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscribers.txt");
        std::fs::write(&path, "1\nabc\n\n2\n").unwrap();
        let store = SubscriberStore::load(&path).unwrap();
        assert!(store.contains(1));
        assert!(store.contains(2));
        assert_eq!(store.chats().len(), 2);
    }
}
