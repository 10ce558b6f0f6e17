//! JSONL-backed persistent store.
//!
//! Content states are stored as an append-only log of upsert/remove lines;
//! replaying the log yields the current record per id. Fingerprints are one
//! URL per line. Append-only JSONL keeps the files easy to inspect and
//! recover by hand.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::domain::ContentRecord;

use super::{ContentStore, StorageStats, StoreError};

/// One line in the content-states log
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum StateLine {
    Upsert { record: ContentRecord },
    Remove { id: String },
}

/// File-based store using JSONL logs
pub struct FileStore {
    states_path: PathBuf,
    fingerprints_path: PathBuf,
}

impl FileStore {
    /// Open a store rooted at a directory, creating it if needed
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        Ok(Self {
            states_path: dir.join("content_states.jsonl"),
            fingerprints_path: dir.join("fingerprints.jsonl"),
        })
    }

    /// Append one line; write failures surface as the degraded kind so
    /// callers (and operators) can tell a lost write from a read error.
    async fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
        Self::try_append(path, line)
            .await
            .map_err(|e| StoreError::PersistenceDegraded(e.to_string()))
    }

    async fn try_append(path: &Path, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_lines(path: &Path) -> Result<Vec<String>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut out = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if !line.trim().is_empty() {
                out.push(line);
            }
        }

        Ok(out)
    }

    /// Replay the state log into the current per-id view
    async fn replay_states(&self) -> Result<HashMap<String, ContentRecord>, StoreError> {
        let mut states = HashMap::new();

        for line in Self::read_lines(&self.states_path).await? {
            let parsed: StateLine = serde_json::from_str(&line)?;
            match parsed {
                StateLine::Upsert { record } => {
                    states.insert(record.item.id.clone(), record);
                }
                StateLine::Remove { id } => {
                    states.remove(&id);
                }
            }
        }

        Ok(states)
    }

    async fn replay_fingerprints(&self) -> Result<HashSet<String>, StoreError> {
        Ok(Self::read_lines(&self.fingerprints_path)
            .await?
            .into_iter()
            .collect())
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn store_content_state(&self, record: &ContentRecord) -> Result<(), StoreError> {
        let line = serde_json::to_string(&StateLine::Upsert {
            record: record.clone(),
        })?;
        Self::append_line(&self.states_path, &line).await
    }

    async fn get_content_state(&self, id: &str) -> Result<Option<ContentRecord>, StoreError> {
        Ok(self.replay_states().await?.remove(id))
    }

    async fn get_all_content_states(&self) -> Result<Vec<ContentRecord>, StoreError> {
        Ok(self.replay_states().await?.into_values().collect())
    }

    async fn remove_content_states(&self, ids: &[String]) -> Result<(), StoreError> {
        for id in ids {
            let line = serde_json::to_string(&StateLine::Remove { id: id.clone() })?;
            Self::append_line(&self.states_path, &line).await?;
        }
        Ok(())
    }

    async fn clear_all_content_states(&self) -> Result<(), StoreError> {
        if self.states_path.exists() {
            fs::write(&self.states_path, b"").await?;
        }
        Ok(())
    }

    async fn has_fingerprint(&self, url: &str) -> Result<bool, StoreError> {
        Ok(self.replay_fingerprints().await?.contains(url))
    }

    async fn store_fingerprint(&self, url: &str) -> Result<(), StoreError> {
        Self::append_line(&self.fingerprints_path, url).await
    }

    async fn storage_stats(&self) -> Result<StorageStats, StoreError> {
        Ok(StorageStats {
            content_states: self.replay_states().await?.len(),
            fingerprints: self.replay_fingerprints().await?.len(),
        })
    }
}
