//! # audit-tail
//!
//! Incremental reading of append-only, newline-delimited JSON logs.
//!
//! This crate provides:
//!
//! - [`LogTailer`] — Reads complete records appended since the last poll,
//!   tracking a byte offset across partial writes and truncation
//! - [`ReplayPacer`] — Holds back historical events so they are released no
//!   faster than wall-clock time
//!
//! ## Example
//!
//! ```rust,no_run
//! use audit_tail::{Disposition, LogTailer, TailError};
//!
//! let mut tailer = LogTailer::new("/var/log/kubernetes/audit.log");
//! let summary = tailer.poll(|record: &[u8]| {
//!     println!("{}", String::from_utf8_lossy(record));
//!     Ok::<_, TailError>(Disposition::Consumed)
//! })?;
//! println!("read {} records, now at offset {}", summary.records, tailer.offset());
//! # Ok::<(), TailError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod pacer;
pub mod tailer;

// Re-export main types
pub use error::{Result, TailError};
pub use pacer::ReplayPacer;
pub use tailer::{
    Disposition, LogTailer, PollSummary, TailerConfig, DEFAULT_READ_BUFFER_SIZE,
    MIN_READ_BUFFER_SIZE,
};
