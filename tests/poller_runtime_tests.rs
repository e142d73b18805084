mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use common::{item, test_config, FakeSource};
use memebot::{spawn_poller, Event, InteractionStore, PollConfig};

#[tokio::test]
async fn spawned_poller_emits_interactions_and_stops_cleanly() {
    let mut source = FakeSource::default();
    source.add_mention(item(5, "alice", "@memebot hello from the loop"));
    let source = Arc::new(source);

    let poll = PollConfig {
        interval: Duration::from_millis(50),
        ..PollConfig::default()
    };
    let (tx, mut rx) = mpsc::channel(8);
    let store = InteractionStore::in_memory();

    let handle = spawn_poller(source, store, test_config(), poll, tx);

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed");
    let Event::Interaction { item, thread } = event;
    assert_eq!(item.id, 5);
    assert_eq!(thread.len(), 1);

    handle.stop().await.expect("stop poller");
}

#[tokio::test]
async fn failed_cycles_are_retried_on_the_next_tick() {
    // A source that always fails mention fetch keeps the loop alive; the
    // poller must survive repeated failures and still shut down on request.
    let source = Arc::new(FakeSource {
        fail_mentions: true,
        ..FakeSource::default()
    });

    let poll = PollConfig {
        interval: Duration::from_millis(20),
        ..PollConfig::default()
    };
    let (tx, rx) = mpsc::channel(8);
    let store = InteractionStore::in_memory();

    let handle = spawn_poller(source, store, test_config(), poll, tx);
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop().await.expect("stop poller");
    drop(rx);
}
