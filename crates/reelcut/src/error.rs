//! Error types for the editor runtime and its ingestion boundary.
//!
//! Reducers never fail. Errors only appear where data enters the editor
//! (rows, ranges, configuration) or where the host loop talks to channels.

use thiserror::Error;

use crate::clip::DatabaseId;

#[derive(Debug, Error)]
pub enum ReelError {
    #[error("clip {database_id} has an unplayable window {start}..{end}")]
    InvalidClipWindow {
        database_id: DatabaseId,
        start: f64,
        end: f64,
    },

    #[error("clip {database_id} ends at {end}s but its source is only {duration}s long")]
    WindowBeyondMedia {
        database_id: DatabaseId,
        end: f64,
        duration: f64,
    },

    #[error("malformed range header: {0}")]
    MalformedRange(String),

    #[error("range not satisfiable for a body of {total_len} bytes")]
    RangeNotSatisfiable { total_len: u64 },

    #[error("invalid editor config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse editor config")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to read editor config")]
    ConfigRead(#[from] std::io::Error),

    #[error("editor event channel closed")]
    ChannelClosed,
}
