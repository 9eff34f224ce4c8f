use crate::{Result as StoreResult, StoreError};

use herald_core::{Message, MessagePriority};

use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use error_location::ErrorLocation;
use log::{debug, warn};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const ENTRY_EXTENSION: &str = "tmp";

/// Disk-backed spillover for messages that do not fit in the priority buffer.
///
/// Layout: one subdirectory per priority rank, one file per message named
/// `<rank><millis>.tmp` with the timestamp zero-padded to 13 digits. Entries
/// inside a rank are ordered by sorting their names, so draining yields the
/// most urgent, oldest message first. Writes are not fsynced.
pub struct OverflowStore {
    root: PathBuf,
    last_stamp: u64,
}

impl OverflowStore {
    /// Open (and create if needed) the store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let mut last_stamp = 0;

        for priority in MessagePriority::ALL {
            let dir = root.join(priority.rank().to_string());
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StoreError::io(&dir, e))?;

            // Keep new names sorting after anything left from a previous run.
            if let Some(newest) = list_entries(&dir).await?.last() {
                last_stamp = last_stamp.max(parse_stamp(newest).unwrap_or(0));
            }
        }

        Ok(Self { root, last_stamp })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `message` to a new entry file and return its path.
    pub async fn spill(&mut self, message: &Message) -> StoreResult<PathBuf> {
        let Some(priority) = message.priority() else {
            return Err(StoreError::NotPushMessage {
                message_type: message.message_type().to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let dir = self.root.join(priority.rank().to_string());
        let bytes = message.encode();

        loop {
            let stamp = self.next_stamp();
            let path = dir.join(entry_name(priority, stamp));

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::io(&path, e)),
            };

            file.write_all(&bytes)
                .await
                .map_err(|e| StoreError::io(&path, e))?;
            file.flush().await.map_err(|e| StoreError::io(&path, e))?;

            debug!("Spilled message {} to {}", message.id(), path.display());
            return Ok(path);
        }
    }

    /// Take the most urgent, oldest entry out of the store.
    ///
    /// A rank whose directory cannot be read is skipped. Returns `None` when
    /// nothing readable is left or the selected entry is corrupt. The selected file is deleted in every case so a bad
    /// entry cannot be picked again.
    pub async fn drain(&mut self) -> Option<Message> {
        for priority in MessagePriority::ALL {
            let dir = self.root.join(priority.rank().to_string());

            let entries = match list_entries(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Overflow drain skipped rank {}: {e}", priority.rank());
                    continue;
                }
            };

            let Some(first) = entries.first() else {
                continue;
            };

            let path = dir.join(first);
            let read = fs::read(&path).await;

            if let Err(e) = fs::remove_file(&path).await {
                warn!("Failed to delete overflow entry {}: {e}", path.display());
            }

            return match read {
                Ok(bytes) => match Message::decode(&bytes) {
                    Ok(message) => {
                        debug!("Drained message {} from {}", message.id(), path.display());
                        Some(message)
                    }
                    Err(source) => {
                        let error = StoreError::Corrupt {
                            path,
                            source,
                            location: ErrorLocation::from(Location::caller()),
                        };
                        warn!("Discarded overflow entry: {error}");
                        None
                    }
                },
                Err(e) => {
                    warn!("Overflow drain failed: {}", StoreError::io(&path, e));
                    None
                }
            };
        }

        None
    }

    /// Number of entries currently on disk across all priorities.
    pub async fn pending_count(&self) -> usize {
        let mut count = 0;
        for priority in MessagePriority::ALL {
            let dir = self.root.join(priority.rank().to_string());
            count += list_entries(&dir).await.map(|e| e.len()).unwrap_or(0);
        }
        count
    }

    fn next_stamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        self.last_stamp = now.max(self.last_stamp + 1);
        self.last_stamp
    }
}

fn entry_name(priority: MessagePriority, stamp: u64) -> String {
    format!("{}{:013}.{}", priority.rank(), stamp, ENTRY_EXTENSION)
}

fn parse_stamp(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(".tmp")?;
    stem.get(1..)?.parse().ok()
}

/// Entry file names in `dir`, sorted so the oldest comes first.
async fn list_entries(dir: &Path) -> StoreResult<Vec<String>> {
    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|e| StoreError::io(dir, e))?;

    let mut names = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| StoreError::io(dir, e))?
    {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if Path::new(&name)
            .extension()
            .is_some_and(|ext| ext == ENTRY_EXTENSION)
        {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}
