mod support;

use replay_table::{
    CellContent, FeedClient, Field, FilterMode, IngestStatus, Link, TableConfig, TableController,
};

use support::{fixture_replays, FixtureServer, RecordingSink};

fn table_for(config: &TableConfig) -> TableController<RecordingSink> {
    TableController::new(config, FilterMode::Multi, RecordingSink::default())
}

#[tokio::test]
async fn chunked_feed_arrives_in_order() {
    let server = FixtureServer::spawn().await;
    let config = TableConfig::new(server.url("/replays/index/json"));
    let mut table = table_for(&config);
    let client = FeedClient::new().expect("feed client");

    let status = client.stream_into(&config.feed_url, &mut table).await;
    assert_eq!(status, IngestStatus::Complete);
    table.drain();

    let expected = fixture_replays();
    let received: Vec<_> = table.records().iter().map(|record| (**record).clone()).collect();
    assert_eq!(received, expected);
    assert_eq!(table.sink().rows.len(), expected.len());
    assert!(table.sink().error.is_none());

    let first_row = &table.sink().rows[0];
    let score = first_row
        .iter()
        .find(|cell| cell.field == Field::Score)
        .expect("score cell");
    assert_eq!(
        score.content,
        CellContent::Link(Link::new("1,000,000", "/replays/8/0"))
    );
}

#[tokio::test]
async fn active_filter_applies_while_streaming() {
    let server = FixtureServer::spawn().await;
    let config = TableConfig::new(server.url("/replays/index/json"));
    let mut table = table_for(&config);
    table.update_filter(Field::Difficulty, "Hard");
    let client = FeedClient::new().expect("feed client");

    client.stream_into(&config.feed_url, &mut table).await;
    table.drain();
    assert_eq!(table.records().len(), 120);
    assert_eq!(table.sink().rows.len(), 40);

    table.update_filter(Field::Route, "Final A");
    table.drain();
    assert_eq!(table.sink().rows.len(), 20);

    table.update_filter(Field::Difficulty, "Hard");
    table.drain();
    assert_eq!(table.sink().rows.len(), 60);
}

#[tokio::test]
async fn array_body_is_accepted() {
    let server = FixtureServer::spawn().await;
    let config = TableConfig::new(server.url("/replays/th08/json"));
    let mut table = table_for(&config);
    let client = FeedClient::new().expect("feed client");

    let status = client.stream_into(&config.feed_url, &mut table).await;
    assert_eq!(status, IngestStatus::Complete);
    assert_eq!(table.records().len(), 120);
    assert_eq!(table.sink().rows.len(), 50);
    assert_eq!(table.drain(), 70);
}
