//! Record sinks and JSON exports.
//!
//! This is the only crate that writes simulation output to disk. The engine hands it one
//! [`records::StateRecord`] per body per tick and asks it to reset a body's stream when a probe
//! is relaunched.

use thiserror::Error;

pub mod diagnostics;
pub mod records;

pub use diagnostics::write_json;
pub use records::{CsvRecordSink, DiscardSink, MemorySink, RecordRow, RecordSink, StateRecord};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
