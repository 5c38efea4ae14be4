//! Orchestration of the producer and resolver pools.
//!
//! # Termination
//!
//! The run depends on one ordering:
//!
//! 1. join every producer,
//! 2. close the queue (sets the completion state and wakes every waiter),
//! 3. join every resolver worker.
//!
//! Closing before all producers are joined could drop hostnames; skipping the
//! broadcast would leave workers asleep on an empty queue forever.

use crate::config::LookupConfig;
use crate::consumer::{ConsumerReport, run_consumer};
use crate::error::{LookupError, Result};
use crate::hostname::Hostname;
use crate::output::OutputSink;
use crate::producer::{ProducerReport, run_producer};
use crate::queue::BoundedQueue;
use crate::resolver::Resolve;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread::{self, Scope, ScopedJoinHandle};

/// Totals for one completed run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Hostnames read from all inputs and queued.
    pub hostnames_read: usize,
    /// Output records written.
    pub records_written: usize,
    /// Hostnames written with a failure marker.
    pub failed_lookups: usize,
    /// Records lost to output errors.
    pub write_errors: usize,
    /// Tokens truncated to the maximum hostname length.
    pub truncated: usize,
    /// Inputs that could not be opened or fully read.
    pub failed_sources: Vec<PathBuf>,
    /// Number of resolver threads used.
    pub resolver_threads: usize,
}

impl RunSummary {
    fn add_producer(&mut self, report: ProducerReport) {
        self.hostnames_read += report.hostnames;
        self.truncated += report.truncated;
        if report.error.is_some() {
            self.failed_sources.push(report.path);
        }
    }

    fn add_consumer(&mut self, report: ConsumerReport) {
        self.records_written += report.written;
        self.failed_lookups += report.failed_lookups;
        self.write_errors += report.write_errors;
    }
}

/// Resolves every hostname from a set of input files into one output stream.
///
/// # Example
///
/// ```rust,ignore
/// use multi_lookup::{LookupConfig, Pipeline, SystemResolver};
///
/// let pipeline = Pipeline::new(LookupConfig::default(), SystemResolver::new());
/// let out = std::fs::File::create("results.txt")?;
/// let summary = pipeline.run(&["names1.txt", "names2.txt"], out)?;
/// ```
#[derive(Debug)]
pub struct Pipeline<R> {
    config: LookupConfig,
    resolver: R,
}

impl<R: Resolve> Pipeline<R> {
    #[must_use]
    pub const fn new(config: LookupConfig, resolver: R) -> Self {
        Self { config, resolver }
    }

    #[must_use]
    pub const fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Checks the config and the number of inputs without touching any file.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::NoInputs`], [`LookupError::TooManyInputs`] or
    /// [`LookupError::InvalidConfig`].
    pub fn check_inputs(&self, count: usize) -> Result<()> {
        self.config.validate()?;
        if count == 0 {
            return Err(LookupError::NoInputs);
        }
        if count > self.config.max_input_files {
            return Err(LookupError::TooManyInputs {
                count,
                max: self.config.max_input_files,
            });
        }
        Ok(())
    }

    /// Runs the pipeline to completion, writing one record per hostname to
    /// `output`, which is flushed before returning.
    ///
    /// Unreadable inputs and unresolvable hostnames are not errors; they show
    /// up in the returned [`RunSummary`] and in the output respectively.
    ///
    /// # Errors
    ///
    /// Returns a usage error (see [`check_inputs`](Self::check_inputs)),
    /// [`LookupError::Spawn`] if a worker thread cannot be created,
    /// [`LookupError::WorkerPanicked`] if one panics, or
    /// [`LookupError::Io`] if the final flush fails.
    pub fn run<P, W>(&self, inputs: &[P], output: W) -> Result<RunSummary>
    where
        P: AsRef<Path> + Sync,
        W: Write + Send,
    {
        self.check_inputs(inputs.len())?;

        let queue = BoundedQueue::new(self.config.queue_capacity)?;
        let sink = OutputSink::new(output);
        let resolver_threads = self.config.resolver_thread_count();

        tracing::info!(
            inputs = inputs.len(),
            resolver_threads,
            queue_capacity = self.config.queue_capacity,
            mode = ?self.config.mode,
            "Starting lookup run"
        );

        let mut summary =
            thread::scope(|s| self.run_pools(s, inputs, &queue, &sink, resolver_threads))?;
        summary.resolver_threads = resolver_threads;

        sink.finish()?;
        tracing::info!(
            hostnames = summary.hostnames_read,
            written = summary.records_written,
            failed_lookups = summary.failed_lookups,
            failed_sources = summary.failed_sources.len(),
            "Lookup run finished"
        );
        Ok(summary)
    }

    fn run_pools<'scope, 'env, P, W>(
        &'env self,
        s: &'scope Scope<'scope, 'env>,
        inputs: &'env [P],
        queue: &'env BoundedQueue<Hostname>,
        sink: &'env OutputSink<W>,
        resolver_threads: usize,
    ) -> Result<RunSummary>
    where
        P: AsRef<Path> + Sync,
        W: Write + Send,
    {
        let max_len = self.config.max_hostname_len;
        let mode = self.config.mode;

        let mut producers = Vec::with_capacity(inputs.len());
        let mut consumers = Vec::with_capacity(resolver_threads);
        for (i, input) in inputs.iter().enumerate() {
            let spawned = thread::Builder::new()
                .name(format!("producer-{i}"))
                .spawn_scoped(s, move || run_producer(input.as_ref(), queue, max_len));
            match spawned {
                Ok(handle) => producers.push(handle),
                Err(source) => {
                    return Err(abort(queue, producers, consumers, "producer", source));
                }
            }
        }

        for i in 0..resolver_threads {
            let spawned = thread::Builder::new()
                .name(format!("resolver-{i}"))
                .spawn_scoped(s, move || run_consumer(queue, &self.resolver, sink, mode));
            match spawned {
                Ok(handle) => consumers.push(handle),
                Err(source) => {
                    return Err(abort(queue, producers, consumers, "consumer", source));
                }
            }
        }

        let mut summary = RunSummary::default();
        let producer_panicked = join_all(producers, |r| summary.add_producer(r));
        queue.close();
        let consumer_panicked = join_all(consumers, |r| summary.add_consumer(r));

        if producer_panicked {
            return Err(LookupError::WorkerPanicked { role: "producer" });
        }
        if consumer_panicked {
            return Err(LookupError::WorkerPanicked { role: "consumer" });
        }
        Ok(summary)
    }
}

/// Closes the queue so already running workers wind down, joins them, and
/// builds the spawn error.
///
/// Joining here keeps a worker panic from resurfacing as a panic of the
/// enclosing scope.
fn abort<P, C>(
    queue: &BoundedQueue<Hostname>,
    producers: Vec<ScopedJoinHandle<'_, P>>,
    consumers: Vec<ScopedJoinHandle<'_, C>>,
    role: &'static str,
    source: std::io::Error,
) -> LookupError {
    tracing::error!(role, error = %source, "Thread creation failed, aborting run");
    queue.close();
    let producer_panicked = join_all(producers, drop);
    let consumer_panicked = join_all(consumers, drop);
    if producer_panicked || consumer_panicked {
        tracing::error!(role, "Worker panicked while aborting run");
    }
    LookupError::Spawn { role, source }
}

/// Joins every handle, feeding results to `f`. Returns `true` if any panicked.
fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, T>>, mut f: impl FnMut(T)) -> bool {
    let mut panicked = false;
    for handle in handles {
        match handle.join() {
            Ok(report) => f(report),
            Err(_) => panicked = true,
        }
    }
    panicked
}
