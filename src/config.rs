//! Pipeline tunables.

use crate::error::{LookupError, Result};
use crate::util::online_cpus;

/// Default bounded-buffer capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Lower bound on the resolver (consumer) pool size.
pub const DEFAULT_MIN_RESOLVER_THREADS: usize = 2;

/// Upper bound on the resolver (consumer) pool size.
pub const DEFAULT_MAX_RESOLVER_THREADS: usize = 10;

/// Maximum number of input files, and therefore producer threads.
pub const DEFAULT_MAX_INPUT_FILES: usize = 10;

/// Maximum hostname length in bytes. Longer tokens are truncated.
pub const DEFAULT_MAX_HOSTNAME_LEN: usize = 1024;

/// How many addresses a resolver worker asks for per hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// First IPv4 address only.
    Single,
    /// Every address, IPv6 included.
    #[default]
    All,
}

/// Configuration for one lookup run.
///
/// # Example
///
/// ```
/// use multi_lookup::{LookupConfig, ResolutionMode};
///
/// let config = LookupConfig::default()
///     .with_queue_capacity(2)
///     .with_mode(ResolutionMode::Single);
///
/// assert_eq!(config.queue_capacity, 2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// Capacity of the shared hostname buffer.
    pub queue_capacity: usize,

    /// Explicit resolver pool size. `None` derives it from the number of
    /// online processors.
    pub resolver_threads: Option<usize>,

    /// Floor for the resolver pool size.
    pub min_resolver_threads: usize,

    /// Ceiling for the resolver pool size.
    pub max_resolver_threads: usize,

    /// Maximum number of input files accepted per run.
    pub max_input_files: usize,

    /// Maximum hostname token length in bytes.
    pub max_hostname_len: usize,

    /// Resolution mode.
    pub mode: ResolutionMode,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            resolver_threads: None,
            min_resolver_threads: DEFAULT_MIN_RESOLVER_THREADS,
            max_resolver_threads: DEFAULT_MAX_RESOLVER_THREADS,
            max_input_files: DEFAULT_MAX_INPUT_FILES,
            max_hostname_len: DEFAULT_MAX_HOSTNAME_LEN,
            mode: ResolutionMode::All,
        }
    }
}

impl LookupConfig {
    /// Overrides the queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Pins the resolver pool size. Still clamped into the min/max bounds.
    #[must_use]
    pub const fn with_resolver_threads(mut self, threads: usize) -> Self {
        self.resolver_threads = Some(threads);
        self
    }

    /// Overrides the resolver pool bounds.
    #[must_use]
    pub const fn with_resolver_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_resolver_threads = min;
        self.max_resolver_threads = max;
        self
    }

    /// Overrides the maximum number of input files.
    #[must_use]
    pub const fn with_max_input_files(mut self, max: usize) -> Self {
        self.max_input_files = max;
        self
    }

    /// Overrides the maximum hostname length.
    #[must_use]
    pub const fn with_max_hostname_len(mut self, len: usize) -> Self {
        self.max_hostname_len = len;
        self
    }

    /// Overrides the resolution mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Checks that the values describe a runnable pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(LookupError::InvalidConfig(
                "queue capacity must be at least 1".into(),
            ));
        }
        if self.min_resolver_threads == 0 {
            return Err(LookupError::InvalidConfig(
                "minimum resolver threads must be at least 1".into(),
            ));
        }
        if self.min_resolver_threads > self.max_resolver_threads {
            return Err(LookupError::InvalidConfig(format!(
                "minimum resolver threads ({}) exceeds maximum ({})",
                self.min_resolver_threads, self.max_resolver_threads
            )));
        }
        if self.max_input_files == 0 {
            return Err(LookupError::InvalidConfig(
                "maximum input files must be at least 1".into(),
            ));
        }
        if self.max_hostname_len == 0 {
            return Err(LookupError::InvalidConfig(
                "maximum hostname length must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Number of resolver threads to spawn.
    ///
    /// Uses the explicit override when set, otherwise the number of online
    /// processors, clamped into `[min_resolver_threads, max_resolver_threads]`.
    /// Only meaningful on a validated config.
    ///
    /// A host with fewer processors than the floor gets exactly
    /// `min_resolver_threads` workers. Classic `multi-lookup` builds jumped to
    /// the maximum in that case instead; pass
    /// [`with_resolver_threads`](Self::with_resolver_threads) to get that.
    #[must_use]
    pub fn resolver_thread_count(&self) -> usize {
        let wanted = self
            .resolver_threads
            .or_else(online_cpus)
            .unwrap_or(self.min_resolver_threads);
        wanted.clamp(self.min_resolver_threads, self.max_resolver_threads)
    }
}
