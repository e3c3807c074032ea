use thiserror::Error;

/// Why ingestion stopped. Only `Status` is shown to the user.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("replay feed returned HTTP {0}")]
    Status(u16),
    #[error("replay feed transport failed: {0}")]
    Transport(String),
    #[error("replay feed line {line} did not decode: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl IngestError {
    /// The HTTP status behind a fault that should replace the table with the
    /// failure notice. Every other fault stays quiet.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            IngestError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown replay field {0:?}")]
pub struct UnknownField(pub String);
