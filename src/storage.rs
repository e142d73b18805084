use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::FeedItem;

/// Key under which an item's idempotence marker is stored: the same item
/// handled by two different agents must produce two independent records.
pub fn processed_key(item_id: u64, agent_id: &str) -> String {
    format!("{item_id}-{agent_id}")
}

/// Durable marker that an item has been seen (and possibly replied to).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub item_id: u64,
    pub author_id: String,
    pub text: String,
    #[serde(default)]
    pub in_reply_to: Option<u64>,
    /// Seconds since epoch at which the record was created.
    pub recorded_at: i64,
}

impl ProcessedRecord {
    pub fn from_item(item: &FeedItem) -> Self {
        Self {
            item_id: item.id,
            author_id: item.author_id.clone(),
            text: item.text.clone(),
            in_reply_to: item.in_reply_to,
            recorded_at: Utc::now().timestamp(),
        }
    }
}

/// Room/connection bookkeeping for an author the bot has interacted with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    pub last_conversation_id: u64,
    pub first_seen_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct WatermarkData {
    watermark: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct RecordData {
    // processed-record key -> record
    processed: HashMap<String, ProcessedRecord>,
    // author id -> connection record
    connections: HashMap<String, ConnectionRecord>,
}

/// Watermark, processed-item records, connection records and generation
/// trace blobs, persisted as JSON under a state directory. Processed and
/// connection records are flushed as soon as they change (they are the
/// idempotence boundary); the watermark is flushed once per poll batch via
/// [`persist_watermark`](Self::persist_watermark).
#[derive(Debug, Clone)]
pub struct InteractionStore {
    watermark: Arc<RwLock<WatermarkData>>,
    records: Arc<RwLock<RecordData>>,
    dir: Option<PathBuf>,
}

impl InteractionStore {
    pub fn in_memory() -> Self {
        Self {
            watermark: Arc::new(RwLock::new(WatermarkData::default())),
            records: Arc::new(RwLock::new(RecordData::default())),
            dir: None,
        }
    }

    /// Load persisted state from `dir`, starting empty for anything missing
    /// or unreadable.
    pub async fn load_from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(err) = tokio::fs::create_dir_all(&dir).await {
            warn!(error = %err, "failed to create state dir");
        }

        let watermark: WatermarkData =
            read_json_with_tmp_fallback(&dir.join("watermark.json")).await;
        let records: RecordData = read_json_with_tmp_fallback(&dir.join("records.json")).await;

        Self {
            watermark: Arc::new(RwLock::new(watermark)),
            records: Arc::new(RwLock::new(records)),
            dir: Some(dir),
        }
    }

    pub async fn watermark(&self) -> Option<u64> {
        self.watermark.read().await.watermark
    }

    /// Advance the in-memory watermark. Never moves backwards.
    pub async fn set_watermark(&self, id: u64) {
        let mut inner = self.watermark.write().await;
        match inner.watermark {
            Some(current) if current >= id => {
                debug!(current, id, "watermark not advanced");
            }
            _ => inner.watermark = Some(id),
        }
    }

    /// Flush the watermark to disk. Called once per poll batch rather than
    /// per item, so a crash mid-batch reprocesses at most the current batch.
    pub async fn persist_watermark(&self) {
        let Some(dir) = &self.dir else {
            debug!("store is in-memory only; skipping watermark persist");
            return;
        };
        let inner = self.watermark.read().await;
        write_json_atomic(&dir.join("watermark.json"), &*inner).await;
    }

    pub async fn has_processed(&self, key: &str) -> bool {
        self.records.read().await.processed.contains_key(key)
    }

    pub async fn processed(&self, key: &str) -> Option<ProcessedRecord> {
        self.records.read().await.processed.get(key).cloned()
    }

    /// Create the idempotence marker for `key`. First write wins; a second
    /// call for the same key leaves the original record in place.
    pub async fn record_processed(&self, key: String, record: ProcessedRecord) {
        let mut inner = self.records.write().await;
        if inner.processed.contains_key(&key) {
            debug!(%key, "item already recorded as processed");
            return;
        }
        inner.processed.insert(key, record);
        drop(inner);
        self.persist_records().await;
    }

    pub async fn connection(&self, author_id: &str) -> Option<ConnectionRecord> {
        self.records.read().await.connections.get(author_id).cloned()
    }

    /// Create or refresh the connection record for an item's author.
    pub async fn ensure_connection(&self, item: &FeedItem) {
        let mut inner = self.records.write().await;
        match inner.connections.get_mut(&item.author_id) {
            Some(existing) => {
                existing.username = item.username.clone();
                existing.name = item.name.clone();
                existing.last_conversation_id = item.conversation_id;
            }
            None => {
                inner.connections.insert(
                    item.author_id.clone(),
                    ConnectionRecord {
                        username: item.username.clone(),
                        name: item.name.clone(),
                        last_conversation_id: item.conversation_id,
                        first_seen_at: Utc::now().timestamp(),
                    },
                );
            }
        }
        drop(inner);
        self.persist_records().await;
    }

    /// Store a human-readable trace blob (e.g. the full generation context
    /// for a reply) as `cache/<key>.txt` under the state directory.
    pub async fn cache_blob(&self, key: &str, text: &str) {
        let Some(dir) = &self.dir else {
            debug!(key, "store is in-memory only; skipping blob cache");
            return;
        };
        let cache_dir = dir.join("cache");
        if let Err(err) = tokio::fs::create_dir_all(&cache_dir).await {
            warn!(error = %err, "failed to create cache dir");
            return;
        }
        let path = cache_dir.join(format!("{key}.txt"));
        if let Err(err) = tokio::fs::write(&path, text).await {
            warn!(error = %err, path = %path.display(), "failed to write cache blob");
        }
    }

    pub async fn read_blob(&self, key: &str) -> Option<String> {
        let dir = self.dir.as_ref()?;
        let path = dir.join("cache").join(format!("{key}.txt"));
        tokio::fs::read_to_string(path).await.ok()
    }

    async fn persist_records(&self) {
        let Some(dir) = &self.dir else {
            debug!("store is in-memory only; skipping records persist");
            return;
        };
        let inner = self.records.read().await;
        write_json_atomic(&dir.join("records.json"), &*inner).await;
    }
}

async fn read_json_with_tmp_fallback<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                let tmp = path.with_extension("json.tmp");
                match tokio::fs::read(&tmp).await {
                    Ok(tmp_bytes) => serde_json::from_slice::<T>(&tmp_bytes).unwrap_or_default(),
                    Err(_) => T::default(),
                }
            }
        },
        Err(_) => T::default(),
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) {
    let bytes = match serde_json::to_vec_pretty(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "failed to serialize store data");
            return;
        }
    };
    if let Some(parent) = path.parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }
    let tmp = path.with_extension("json.tmp");
    if let Err(err) = tokio::fs::write(&tmp, &bytes).await {
        warn!(error = %err, path = %tmp.display(), "failed to write temp store file");
        return;
    }
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        warn!(error = %err, path = %path.display(), "failed to persist store file");
    }
}
