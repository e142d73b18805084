use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::FeedItem;

/// Contract for the social platform the bot reads from and posts to. The
/// concrete client (HTTP, scraping session, whatever the deployment uses)
/// lives outside this crate; everything here is written against this trait
/// so ingestion and reply logic can be driven by an in-memory fake in tests.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Latest items matching a search query (e.g. `@botname`), newest first.
    async fn search_by_query(&self, query: &str, limit: usize)
        -> Result<Vec<FeedItem>, SourceError>;

    /// Latest items authored by `handle`, newest first.
    async fn search_by_author(
        &self,
        handle: &str,
        limit: usize,
    ) -> Result<Vec<FeedItem>, SourceError>;

    /// Fetch a single item. `Ok(None)` means the item is gone or was never
    /// visible to us, which callers treat as the end of a reply chain.
    async fn get_item(&self, id: u64) -> Result<Option<FeedItem>, SourceError>;

    /// Post `text` as a reply to `in_reply_to`. Returns the posted item plus
    /// any continuation items the platform split the reply into.
    async fn post_reply(&self, text: &str, in_reply_to: u64)
        -> Result<Vec<FeedItem>, SourceError>;
}
