use tracing::debug;

use crate::error::IngestError;
use crate::models::ReplayRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Pending,
    Lines,
    Array,
}

/// Incremental decoder for the replay feed.
///
/// The feed is newline-delimited JSON: every complete line is one record and
/// the trailing fragment is held until the rest of it arrives. Splitting
/// happens on raw bytes, so a UTF-8 sequence cut across two chunks is
/// reassembled before decoding. A body whose first non-whitespace byte is `[`
/// is treated as a single JSON array and decoded in [`FeedDecoder::finish`].
///
/// Text is decoded leniently: a leading byte-order mark is dropped and invalid
/// UTF-8 becomes U+FFFD instead of failing the line.
///
/// Records that decode ahead of a malformed line in the same chunk are still
/// returned; the decode error comes out of the next call instead.
#[derive(Debug)]
pub struct FeedDecoder {
    buffer: Vec<u8>,
    format: BodyFormat,
    lines_seen: usize,
    failed: Option<IngestError>,
}

impl Default for FeedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            format: BodyFormat::Pending,
            lines_seen: 0,
            failed: None,
        }
    }

    /// Bytes held back waiting for a newline (or, in array mode, the whole body).
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<ReplayRecord>, IngestError> {
        if let Some(err) = self.failed.take() {
            return Err(err);
        }
        self.buffer.extend_from_slice(chunk);
        if self.format == BodyFormat::Pending {
            if self.buffer.len() < UTF8_BOM.len() && UTF8_BOM.starts_with(&self.buffer) {
                return Ok(Vec::new());
            }
            if self.buffer.starts_with(UTF8_BOM) {
                self.buffer.drain(..UTF8_BOM.len());
            }
            self.format = sniff_format(&self.buffer);
        }
        match self.format {
            BodyFormat::Lines => self.drain_lines(),
            BodyFormat::Pending | BodyFormat::Array => Ok(Vec::new()),
        }
    }

    /// Decodes whatever is left once the stream has ended.
    pub fn finish(mut self) -> Result<Vec<ReplayRecord>, IngestError> {
        if let Some(err) = self.failed.take() {
            return Err(err);
        }
        match self.format {
            BodyFormat::Pending => Ok(Vec::new()),
            BodyFormat::Array => {
                let line = self.lines_seen + 1;
                let body = String::from_utf8_lossy(&self.buffer);
                let records: Vec<ReplayRecord> = serde_json::from_str(&body)
                    .map_err(|source| IngestError::Decode { line, source })?;
                debug!(records = records.len(), "decoded replay feed array body");
                Ok(records)
            }
            BodyFormat::Lines => {
                let remainder = std::mem::take(&mut self.buffer);
                let mut records = Vec::new();
                if let Some(record) = self.decode_line(&remainder)? {
                    records.push(record);
                }
                Ok(records)
            }
        }
    }

    fn drain_lines(&mut self) -> Result<Vec<ReplayRecord>, IngestError> {
        let last_newline = match self.buffer.iter().rposition(|byte| *byte == b'\n') {
            Some(index) => index,
            None => return Ok(Vec::new()),
        };
        let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
        let mut records = Vec::new();
        for line in complete.split(|byte| *byte == b'\n') {
            match self.decode_line(line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(err) if records.is_empty() => return Err(err),
                Err(err) => {
                    self.failed = Some(err);
                    break;
                }
            }
        }
        Ok(records)
    }

    fn decode_line(&mut self, line: &[u8]) -> Result<Option<ReplayRecord>, IngestError> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        self.lines_seen += 1;
        let line_number = self.lines_seen;
        serde_json::from_str(&String::from_utf8_lossy(line))
            .map(Some)
            .map_err(|source| IngestError::Decode {
                line: line_number,
                source,
            })
    }
}

fn sniff_format(buffer: &[u8]) -> BodyFormat {
    match buffer.iter().find(|byte| !byte.is_ascii_whitespace()) {
        Some(b'[') => BodyFormat::Array,
        Some(_) => BodyFormat::Lines,
        None => BodyFormat::Pending,
    }
}
