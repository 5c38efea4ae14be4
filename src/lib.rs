//! # multi-lookup
//!
//! Resolve large batches of hostnames to IP addresses by overlapping file
//! reading with name resolution.
//!
//! One producer thread per input file streams whitespace-delimited hostnames
//! into a shared [`BoundedQueue`]. A pool of resolver threads drains the
//! queue, resolves each name through a [`Resolve`] implementation, and writes
//! one record per hostname to a single [`OutputSink`]:
//!
//! ```text
//! input files ─▶ producers ─▶ BoundedQueue ─▶ resolvers ─▶ Resolve ─▶ OutputSink
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use multi_lookup::{LookupConfig, Pipeline, ResolutionMode, SystemResolver};
//!
//! let config = LookupConfig::default().with_mode(ResolutionMode::Single);
//! let pipeline = Pipeline::new(config, SystemResolver::new());
//!
//! let out = std::fs::File::create("results.txt")?;
//! let summary = pipeline.run(&["names1.txt", "names2.txt"], out)?;
//! assert_eq!(summary.hostnames_read, summary.records_written);
//! ```
//!
//! ## Output format
//!
//! One line per hostname, `hostname[,address]*`. A name that failed to
//! resolve keeps an empty first address field (`bad.invalid,`).
//!
//! ## Ordering
//!
//! Hostnames from one file leave the queue in file order. Output lines follow
//! the order in which resolver threads finish, not the input order.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod consumer;
pub mod error;
pub mod hostname;
pub mod output;
pub mod pipeline;
pub mod producer;
pub mod queue;
pub mod resolver;
pub mod util;

pub use config::{LookupConfig, ResolutionMode};
pub use error::{LookupError, Result};
pub use hostname::Hostname;
pub use output::{OutputSink, format_record};
pub use pipeline::{Pipeline, RunSummary};
pub use queue::{BoundedQueue, PushError, QueueState, RingBuffer};
pub use resolver::{AddressResult, Resolve, SystemResolver};
