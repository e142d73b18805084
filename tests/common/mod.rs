#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use memebot::{BotConfig, FeedItem, FeedSource, SourceError};

/// In-memory feed platform for driving ingestion and reply logic in tests.
#[derive(Default)]
pub struct FakeSource {
    pub items: HashMap<u64, FeedItem>,
    pub mentions: Vec<FeedItem>,
    pub by_author: HashMap<String, Vec<FeedItem>>,
    pub failing_authors: HashSet<String>,
    pub failing_items: HashSet<u64>,
    pub fail_mentions: bool,
    pub posted: Mutex<Vec<(String, u64)>>,
}

impl FakeSource {
    pub fn add_item(&mut self, item: FeedItem) {
        self.items.insert(item.id, item);
    }

    pub fn add_mention(&mut self, item: FeedItem) {
        self.items.insert(item.id, item.clone());
        self.mentions.push(item);
    }

    pub fn add_author_item(&mut self, handle: &str, item: FeedItem) {
        self.items.insert(item.id, item.clone());
        self.by_author.entry(handle.to_owned()).or_default().push(item);
    }

    pub fn posted_replies(&self) -> Vec<(String, u64)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for FakeSource {
    async fn search_by_query(
        &self,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<FeedItem>, SourceError> {
        if self.fail_mentions {
            return Err(SourceError::Api("mention search unavailable".to_owned()));
        }
        Ok(self.mentions.iter().take(limit).cloned().collect())
    }

    async fn search_by_author(
        &self,
        handle: &str,
        limit: usize,
    ) -> Result<Vec<FeedItem>, SourceError> {
        if self.failing_authors.contains(handle) {
            return Err(SourceError::Api(format!("author {handle} unavailable")));
        }
        Ok(self
            .by_author
            .get(handle)
            .map(|items| items.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_item(&self, id: u64) -> Result<Option<FeedItem>, SourceError> {
        if self.failing_items.contains(&id) {
            return Err(SourceError::Api(format!("item {id} unavailable")));
        }
        Ok(self.items.get(&id).cloned())
    }

    async fn post_reply(
        &self,
        text: &str,
        in_reply_to: u64,
    ) -> Result<Vec<FeedItem>, SourceError> {
        self.posted
            .lock()
            .unwrap()
            .push((text.to_owned(), in_reply_to));
        Ok(Vec::new())
    }
}

pub fn item(id: u64, username: &str, text: &str) -> FeedItem {
    FeedItem {
        id,
        author_id: format!("user-{username}"),
        username: username.to_owned(),
        name: None,
        text: text.to_owned(),
        timestamp: Utc::now().timestamp(),
        in_reply_to: None,
        conversation_id: id,
        is_reply: false,
        is_retweet: false,
    }
}

pub fn reply(id: u64, username: &str, text: &str, parent: u64) -> FeedItem {
    let mut item = item(id, username, text);
    item.in_reply_to = Some(parent);
    item.is_reply = true;
    item.conversation_id = parent;
    item
}

pub fn test_config() -> BotConfig {
    BotConfig {
        username: "memebot".to_owned(),
        agent_id: "agent-1".to_owned(),
        openai_api_key: "test-key".to_owned(),
        ..BotConfig::default()
    }
}

/// Fresh scratch directory under the system temp, unique per call.
pub fn temp_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!(
        "memebot_test_{tag}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    dir
}
