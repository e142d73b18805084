use std::sync::Arc;
use std::sync::LazyLock;

use chrono::{TimeZone, Utc};
use regex::Regex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::models::{FeedItem, MemeCoinSuggestion};
use crate::poller::Event;
use crate::source::FeedSource;
use crate::storage::InteractionStore;
use crate::suggestion::{format_response, SuggestionGenerator};

pub const EMPTY_CONTENT_REPLY: &str =
    "Please provide some content for me to generate a meme coin name suggestion.";

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip `@handle` mentions and collapse runs of whitespace. The generator
/// should see what the author actually wrote, not who they tagged.
pub fn extract_original_content(text: &str) -> String {
    let without_mentions = MENTION_RE.replace_all(text, "");
    let collapsed = WHITESPACE_RE.replace_all(&without_mentions, " ");
    let cleaned = collapsed.trim().to_owned();
    debug!(original = text, cleaned = %cleaned, "content extraction");
    cleaned
}

/// Downstream consumer of ingestion [`Event`]s: turns each (item, thread)
/// pair into a posted suggestion reply.
pub struct ReplyEngine<S> {
    source: Arc<S>,
    generator: SuggestionGenerator,
    store: InteractionStore,
    config: BotConfig,
}

impl<S: FeedSource> ReplyEngine<S> {
    pub fn new(
        source: Arc<S>,
        generator: SuggestionGenerator,
        store: InteractionStore,
        config: BotConfig,
    ) -> Self {
        Self {
            source,
            generator,
            store,
            config,
        }
    }

    /// Consume events until the channel closes.
    pub async fn run(&self, mut rx: mpsc::Receiver<Event>) {
        while let Some(event) = rx.recv().await {
            match event {
                Event::Interaction { item, thread } => {
                    self.handle_interaction(&item, &thread).await;
                }
            }
        }
        info!("event channel closed, reply engine stopping");
    }

    /// Generate and post one reply. Every failure mode degrades rather than
    /// propagates: generation errors fall back to a canned suggestion,
    /// moderation rejections swap in a neutral name, and a failed post is
    /// logged and dropped (the watermark has already moved past this item).
    pub async fn handle_interaction(&self, item: &FeedItem, thread: &[FeedItem]) {
        if item.text.is_empty() {
            debug!(id = item.id, "skipping item with no text");
            return;
        }
        info!(id = item.id, "processing item");

        let content = extract_original_content(&item.text);
        if content.is_empty() {
            self.post(EMPTY_CONTENT_REPLY, item.id).await;
            return;
        }

        let mut suggestion = match self.generator.generate(&content).await {
            Ok(suggestion) => suggestion,
            Err(err) => {
                warn!(id = item.id, error = %err, "suggestion generation failed, using fallback");
                MemeCoinSuggestion::fallback()
            }
        };

        if !self.generator.validate(&suggestion).await {
            suggestion = MemeCoinSuggestion::moderated();
        }

        let reply = format_response(&suggestion, &self.config.response_template);
        if !self.post(&reply, item.id).await {
            return;
        }

        let context = serde_json::to_string(&suggestion).unwrap_or_default();
        let trace = format!(
            "Context:\n\n{context}\n\nSelected Post: {} - {}: {}\n\nThread:\n{}\n\nAgent's Output:\n{reply}",
            item.id,
            item.username,
            item.text,
            format_thread(thread),
        );
        self.store
            .cache_blob(&format!("item_generation_{}", item.id), &trace)
            .await;
    }

    async fn post(&self, text: &str, in_reply_to: u64) -> bool {
        if self.config.dry_run {
            info!(in_reply_to, text, "dry run, not posting reply");
            return false;
        }
        match self.source.post_reply(text, in_reply_to).await {
            Ok(_) => true,
            Err(err) => {
                warn!(in_reply_to, error = %err, "error sending reply");
                false
            }
        }
    }
}

/// Render a thread as readable context, one block per item, root first.
pub fn format_thread(thread: &[FeedItem]) -> String {
    thread
        .iter()
        .map(|item| {
            let when = Utc
                .timestamp_opt(item.timestamp, 0)
                .single()
                .map(|dt| dt.format("%b %d, %H:%M").to_string())
                .unwrap_or_else(|| item.timestamp.to_string());
            format!("@{} ({}):\n        {}", item.username, when, item.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
