#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use async_stream::stream;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use portpicker::pick_unused_port;
use replay_table::{Cell, Field, Link, ReplayRecord, TableSink};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;

const CHUNK_BYTES: usize = 37;
const CHUNK_PAUSE_MS: u64 = 2;

pub struct FixtureServer {
    base_url: String,
    handle: JoinHandle<()>,
}

impl FixtureServer {
    pub async fn spawn() -> Self {
        init_tracing();
        let port = pick_unused_port().expect("free port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr).await.expect("bind fixture server");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router()).await;
        });
        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub rows: Vec<Vec<Cell>>,
    pub clears: usize,
    pub error: Option<String>,
}

impl TableSink for RecordingSink {
    fn clear(&mut self) {
        self.rows.clear();
        self.clears += 1;
    }

    fn append_rows(&mut self, rows: &[Vec<Cell>]) {
        self.rows.extend(rows.iter().cloned());
    }

    fn show_error(&mut self, message: &str) {
        self.rows.clear();
        self.error = Some(message.to_string());
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replay_table=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn fixture_replays() -> Vec<ReplayRecord> {
    (0..120_i64)
        .map(|id| {
            let difficulty = if id % 3 == 0 { "Hard" } else { "Lunatic" };
            ReplayRecord::default()
                .with(Field::Id, id)
                .with(
                    Field::User,
                    Link::new(format!("player{}", id), format!("/replays/user/player{}", id)),
                )
                .with(Field::Game, "th08")
                .with(Field::Difficulty, difficulty)
                .with(Field::Shot, "Border Team")
                .with(Field::Route, if id % 2 == 0 { "Final A" } else { "Final B" })
                .with(
                    Field::Score,
                    Link::new(format!("{},000,000", id + 1), format!("/replays/8/{}", id)),
                )
                .with(Field::UploadDate, "2024-05-01")
                .with(Field::Comment, "東方永夜抄 clear")
                .with(Field::Replay, Link::new("⬇", format!("/replays/8/{}/download", id)))
        })
        .collect()
}

pub fn ndjson(records: &[ReplayRecord]) -> Vec<u8> {
    let mut body = Vec::new();
    for record in records {
        let line = serde_json::to_vec(record).expect("encode fixture");
        body.extend_from_slice(&line);
        body.push(b'\n');
    }
    body
}

fn router() -> Router {
    Router::new()
        .route("/replays/index/json", get(lines_feed))
        .route("/replays/th08/json", get(array_feed))
        .route("/replays/broken/json", get(broken_feed))
        .route("/replays/missing/json", get(missing_feed))
}

fn chunked_response(body: Vec<u8>) -> Response {
    let chunks: Vec<Bytes> = body
        .chunks(CHUNK_BYTES)
        .map(Bytes::copy_from_slice)
        .collect();
    let body_stream = stream! {
        for chunk in chunks {
            sleep(Duration::from_millis(CHUNK_PAUSE_MS)).await;
            yield Ok::<Bytes, Infallible>(chunk);
        }
    };
    let mut response = Response::new(Body::from_stream(body_stream));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

async fn lines_feed() -> Response {
    chunked_response(ndjson(&fixture_replays()))
}

async fn array_feed() -> Response {
    let records = fixture_replays();
    let body = serde_json::to_vec_pretty(&records).expect("encode fixture array");
    chunked_response(body)
}

async fn broken_feed() -> Response {
    let records = fixture_replays();
    let mut body = ndjson(&records[..3]);
    body.extend_from_slice(b"{\"id\": 3, \"user\n");
    body.extend_from_slice(&ndjson(&records[4..6]));
    chunked_response(body)
}

async fn missing_feed() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "replays unavailable")
}
