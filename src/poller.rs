use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::error::PollError;
use crate::models::FeedItem;
use crate::source::FeedSource;
use crate::storage::{processed_key, InteractionStore};
use crate::thread::build_conversation_thread;

/// Runtime knobs for the ingestion loop, usually derived from [`BotConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    /// How many latest mentions to fetch per cycle.
    pub mention_limit: usize,
    /// How many latest items to fetch per watched author per cycle.
    pub author_limit: usize,
    /// Watched-author items older than this are ignored.
    pub freshness_window: Duration,
    pub max_thread_depth: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(120),
            mention_limit: 20,
            author_limit: 3,
            freshness_window: Duration::from_secs(2 * 60 * 60),
            max_thread_depth: 10,
        }
    }
}

impl From<&BotConfig> for PollConfig {
    fn from(config: &BotConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            mention_limit: config.mention_fetch_limit,
            author_limit: config.target_fetch_limit,
            freshness_window: Duration::from_secs(config.freshness_window_secs),
            max_thread_depth: config.max_thread_depth,
        }
    }
}

/// One unit of downstream work: a new item plus its reconstructed ancestry.
#[derive(Debug, Clone)]
pub enum Event {
    Interaction {
        item: FeedItem,
        thread: Vec<FeedItem>,
    },
}

pub struct PollerHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn stop(self) -> Result<(), PollError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(PollError::from)
    }
}

/// Run one full poll cycle and return the handoffs in processing order.
///
/// Mentions of the bot are fetched first; if that fetch fails the whole
/// cycle is abandoned (the caller retries on the next tick). Watched-author
/// fetches are isolated per author: a failure skips that author only. The
/// merged candidate set is sorted ascending by numeric id, deduplicated, and
/// filtered through the watermark and the processed-record store before any
/// thread is built. The watermark is advanced in memory after each handoff
/// and flushed to disk once at the end of the batch.
pub async fn poll_once<S: FeedSource>(
    source: &S,
    store: &InteractionStore,
    config: &BotConfig,
    poll: &PollConfig,
) -> Result<Vec<Event>, PollError> {
    debug!("checking feed interactions");

    let query = format!("@{}", config.username);
    let mentions = source
        .search_by_query(&query, poll.mention_limit)
        .await
        .map_err(PollError::MentionFetch)?;
    debug!(count = mentions.len(), "completed checking mentions");

    let mut candidates = mentions;

    if config.target_users.is_empty() {
        debug!("no target users configured, processing only mentions");
    } else {
        let watermark = store.watermark().await;
        let now = Utc::now().timestamp();
        for handle in &config.target_users {
            let items = match source.search_by_author(handle, poll.author_limit).await {
                Ok(items) => items,
                Err(err) => {
                    warn!(author = %handle, error = %err, "failed to fetch items for author");
                    continue;
                }
            };
            let valid: Vec<FeedItem> = items
                .into_iter()
                .filter(|item| {
                    let unprocessed = watermark.map_or(true, |wm| item.id > wm);
                    let recent =
                        now - item.timestamp < poll.freshness_window.as_secs() as i64;
                    unprocessed && !item.is_reply && !item.is_retweet && recent
                })
                .collect();
            // At most one reply per watched author per cycle, picked at
            // random so the bot does not always latch onto the newest post.
            if let Some(selected) = valid.choose(&mut rand::thread_rng()) {
                debug!(author = %handle, id = selected.id, "selected item from author");
                candidates.push(selected.clone());
            }
        }
    }

    // Numeric sort; string comparison would put "9" after "10".
    candidates.sort_by_key(|item| item.id);
    candidates.dedup_by_key(|item| item.id);

    let mut events = Vec::new();
    for item in candidates {
        let watermark = store.watermark().await;
        if watermark.is_some_and(|wm| item.id <= wm) {
            continue;
        }

        let key = processed_key(item.id, &config.agent_id);
        if store.has_processed(&key).await {
            debug!(id = item.id, "already responded to item, skipping");
            continue;
        }

        info!(id = item.id, author = %item.username, "new item found");
        store.ensure_connection(&item).await;
        let thread =
            build_conversation_thread(source, store, &item, poll.max_thread_depth, &config.agent_id)
                .await;

        let id = item.id;
        events.push(Event::Interaction { item, thread });
        store.set_watermark(id).await;
    }

    store.persist_watermark().await;
    debug!(handoffs = events.len(), "finished checking feed interactions");
    Ok(events)
}

/// Spawn the background ingestion loop. Each tick runs one full `poll_once`
/// and forwards its events downstream; the next tick never starts until the
/// previous cycle has completely finished.
pub fn spawn_poller<S: FeedSource + 'static>(
    source: Arc<S>,
    store: InteractionStore,
    config: BotConfig,
    poll: PollConfig,
    update_tx: mpsc::Sender<Event>,
) -> PollerHandle {
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("poller shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    match poll_once(source.as_ref(), &store, &config, &poll).await {
                        Ok(events) => {
                            for event in events {
                                if update_tx.send(event).await.is_err() {
                                    warn!("update receiver dropped");
                                    return;
                                }
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "poll cycle failed, retrying next tick");
                        }
                    }
                }
            }
        }
    });

    PollerHandle { cancel_tx, join }
}
