use futures_util::StreamExt;
use tracing::{debug, info};

use crate::error::IngestError;
use crate::ingest::FeedDecoder;
use crate::table::{IngestStatus, TableController, TableSink};

/// Streams the replay feed into a table controller outside the browser.
#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new() -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| IngestError::Transport(err.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetches `url` once and feeds every chunk through the controller as it
    /// arrives. Deferred batches stay queued; run them with
    /// [`TableController::drain`] or a timer.
    pub async fn stream_into<S: TableSink>(
        &self,
        url: &str,
        table: &mut TableController<S>,
    ) -> IngestStatus {
        table.begin();
        match self.pump(url, table).await {
            Ok(()) => table.complete(),
            Err(err) => table.fail(&err),
        }
        table.status()
    }

    async fn pump<S: TableSink>(
        &self,
        url: &str,
        table: &mut TableController<S>,
    ) -> Result<(), IngestError> {
        info!(url, "requesting replay feed");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| IngestError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(IngestError::Status(response.status().as_u16()));
        }

        let mut decoder = FeedDecoder::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|err| IngestError::Transport(err.to_string()))?;
            let records = decoder.feed(&chunk)?;
            let scheduled = table.ingest(records);
            debug!(
                bytes = chunk.len(),
                painted = scheduled.painted,
                deferred = scheduled.deferred,
                "replay feed chunk"
            );
        }
        let records = decoder.finish()?;
        table.ingest(records);
        Ok(())
    }
}
