//! Resolver workers: drain the queue, resolve, write one record per hostname.

use crate::config::ResolutionMode;
use crate::hostname::Hostname;
use crate::output::{OutputSink, format_record};
use crate::queue::BoundedQueue;
use crate::resolver::{AddressResult, Resolve};
use std::io::Write;

/// What one resolver worker did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerReport {
    /// Hostnames taken off the queue.
    pub processed: usize,
    /// Records successfully written.
    pub written: usize,
    /// Hostnames that did not resolve.
    pub failed_lookups: usize,
    /// Records lost to output errors.
    pub write_errors: usize,
}

/// Runs one resolver worker until the queue is closed and drained.
///
/// The queue lock is released before resolving and the output lock is only
/// taken for the write, so a slow lookup or write never blocks other workers
/// from popping.
///
/// A hostname that is not valid UTF-8 is never handed to the resolver; it is
/// recorded as a failed lookup with its original bytes.
pub fn run_consumer<R, W>(
    queue: &BoundedQueue<Hostname>,
    resolver: &R,
    sink: &OutputSink<W>,
    mode: ResolutionMode,
) -> ConsumerReport
where
    R: Resolve + ?Sized,
    W: Write,
{
    let mut report = ConsumerReport::default();

    while let Some(hostname) = queue.pop() {
        report.processed += 1;

        let result = match hostname.as_str() {
            Some(name) => resolver.resolve(name, mode),
            None => {
                tracing::warn!(hostname = %hostname, "Hostname is not valid UTF-8");
                AddressResult::failure()
            }
        };
        if let AddressResult::Failure { partial } = &result {
            tracing::warn!(hostname = %hostname, partial = partial.len(), "Lookup failed");
            report.failed_lookups += 1;
        } else {
            tracing::debug!(hostname = %hostname, "Resolved");
        }

        let record = format_record(hostname.as_bytes(), &result, mode);
        match sink.write_record(&record) {
            Ok(()) => report.written += 1,
            Err(e) => {
                tracing::error!(hostname = %hostname, error = %e, "Failed to write record");
                report.write_errors += 1;
            }
        }
    }

    report
}
