//! Shared output stream and record formatting.
//!
//! Record format, one per line:
//!
//! ```text
//! example.com,93.184.215.14,2606:2800:21f:cb07:6820:80da:af6b:8b2c
//! unresolvable.invalid,
//! ```

use crate::config::ResolutionMode;
use crate::resolver::AddressResult;
use parking_lot::Mutex;
use std::io::{self, Write};

/// Formats one output record, including the trailing newline.
///
/// The hostname is written back byte for byte, even if it is not UTF-8.
///
/// - Success: `hostname,addr[,addr...]`. Single mode writes the primary
///   address only.
/// - Failure: `hostname,` followed by `,addr` for every partially discovered
///   address (all-addresses mode only), so an unresolved name always shows an
///   empty first address field.
#[must_use]
pub fn format_record(hostname: &[u8], result: &AddressResult, mode: ResolutionMode) -> Vec<u8> {
    let mut line = Vec::with_capacity(hostname.len() + 48);
    line.extend_from_slice(hostname);
    // Writing into a Vec cannot fail.
    match (result, mode) {
        (AddressResult::Success { primary, .. }, ResolutionMode::Single) => {
            let _ = write!(line, ",{primary}");
        }
        (
            AddressResult::Success {
                primary,
                additional,
            },
            ResolutionMode::All,
        ) => {
            let _ = write!(line, ",{primary}");
            for addr in additional {
                let _ = write!(line, ",{addr}");
            }
        }
        (AddressResult::Failure { .. }, ResolutionMode::Single) => line.push(b','),
        (AddressResult::Failure { partial }, ResolutionMode::All) => {
            line.push(b',');
            for addr in partial {
                let _ = write!(line, ",{addr}");
            }
        }
    }
    line.push(b'\n');
    line
}

/// The single output destination, shared by every resolver worker.
///
/// Each [`write_record`](Self::write_record) holds the lock for the whole
/// line, so records from different workers never interleave.
pub struct OutputSink<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> OutputSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Writes one fully formatted record atomically.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; the record may be partially written.
    pub fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.writer.lock().write_all(record)
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns the error raised by the final flush.
    pub fn finish(self) -> io::Result<W> {
        let mut writer = self.writer.into_inner();
        writer.flush()?;
        Ok(writer)
    }
}
