use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::FeedItem;
use crate::source::FeedSource;
use crate::storage::{processed_key, InteractionStore, ProcessedRecord};

/// Reconstruct the reply ancestry of `item`, root-first with `item` last.
///
/// The walk follows `in_reply_to` upwards for at most `max_depth` steps. A
/// visited set guards against reply cycles in a malformed feed, and a failed
/// or empty parent fetch simply ends the chain: a partial thread is still
/// useful context, so per-ancestor errors are logged and never propagated.
///
/// Every item the walk visits gets a processed-record trace and a connection
/// record for its author. Ancestors are recorded for context only and are
/// never replied to; for the triggering item the trace doubles as the
/// idempotence marker that stops the next poll from handling it again.
pub async fn build_conversation_thread<S: FeedSource>(
    source: &S,
    store: &InteractionStore,
    item: &FeedItem,
    max_depth: usize,
    agent_id: &str,
) -> Vec<FeedItem> {
    let mut thread: Vec<FeedItem> = Vec::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut current = item.clone();
    let mut depth = 0usize;

    loop {
        if depth >= max_depth {
            debug!(depth, "reached maximum thread depth");
            break;
        }
        if !visited.insert(current.id) {
            debug!(id = current.id, "already visited item, stopping walk");
            break;
        }

        let key = processed_key(current.id, agent_id);
        if !store.has_processed(&key).await {
            store.ensure_connection(&current).await;
            store
                .record_processed(key, ProcessedRecord::from_item(&current))
                .await;
        }

        thread.push(current.clone());

        let Some(parent_id) = current.in_reply_to else {
            debug!(id = current.id, "reached end of reply chain");
            break;
        };
        match source.get_item(parent_id).await {
            Ok(Some(parent)) => {
                current = parent;
                depth += 1;
            }
            Ok(None) => {
                debug!(parent_id, "parent item not found, chain ends here");
                break;
            }
            Err(err) => {
                warn!(parent_id, error = %err, "failed to fetch parent item, chain ends here");
                break;
            }
        }
    }

    // The walk ascends from the triggering item; callers want root-first.
    thread.reverse();
    thread
}
