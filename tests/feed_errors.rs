mod support;

use std::time::Duration;

use portpicker::pick_unused_port;
use replay_table::{FeedClient, FilterMode, IngestStatus, TableConfig, TableController};

use support::{FixtureServer, RecordingSink};

#[tokio::test]
async fn error_status_replaces_table_with_notice() {
    let server = FixtureServer::spawn().await;
    let config = TableConfig::new(server.url("/replays/missing/json"));
    let mut table = TableController::new(&config, FilterMode::Single, RecordingSink::default());
    let client = FeedClient::new().expect("feed client");

    let status = client.stream_into(&config.feed_url, &mut table).await;
    assert_eq!(status, IngestStatus::Failed(500));
    assert_eq!(table.sink().error.as_deref(), Some("Failed to load replays"));
    assert!(table.records().is_empty());
}

#[tokio::test]
async fn malformed_line_stops_ingest_quietly() {
    let server = FixtureServer::spawn().await;
    let config = TableConfig::new(server.url("/replays/broken/json"));
    let mut table = TableController::new(&config, FilterMode::Single, RecordingSink::default());
    let client = FeedClient::new().expect("feed client");

    let status = client.stream_into(&config.feed_url, &mut table).await;
    assert_eq!(status, IngestStatus::Interrupted);
    assert!(table.sink().error.is_none());
    assert_eq!(table.records().len(), 3);
    assert_eq!(table.sink().rows.len(), 3);
}

#[tokio::test]
async fn unreachable_feed_stops_ingest_quietly() {
    support::init_tracing();
    let port = pick_unused_port().expect("free port");
    let config = TableConfig::new(format!("http://127.0.0.1:{}/replays/index/json", port));
    let mut table = TableController::new(&config, FilterMode::Multi, RecordingSink::default());
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client");
    let client = FeedClient::with_client(http);

    let status = client.stream_into(&config.feed_url, &mut table).await;
    assert_eq!(status, IngestStatus::Interrupted);
    assert!(table.sink().error.is_none());
    assert!(table.records().is_empty());
}
