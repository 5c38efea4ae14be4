//! `multi-lookup <input>... <output>`

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use multi_lookup::config::{
    DEFAULT_MAX_HOSTNAME_LEN, DEFAULT_MAX_INPUT_FILES, DEFAULT_MAX_RESOLVER_THREADS,
    DEFAULT_MIN_RESOLVER_THREADS, DEFAULT_QUEUE_CAPACITY,
};
use multi_lookup::{LookupConfig, LookupError, Pipeline, ResolutionMode, SystemResolver};
use tracing_subscriber::EnvFilter;

/// Resolve every hostname in the input files and write `hostname,address...`
/// lines to the output file.
#[derive(Debug, Parser)]
#[command(name = "multi-lookup", version)]
struct Cli {
    /// Input files followed by the output file.
    #[arg(required = true, num_args = 2.., value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Only look up the first IPv4 address of each hostname.
    #[arg(long)]
    single: bool,

    /// Capacity of the shared hostname buffer.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Resolver thread count (defaults to the number of online processors).
    #[arg(long)]
    resolver_threads: Option<usize>,

    /// Lower bound on the resolver thread count.
    #[arg(long, default_value_t = DEFAULT_MIN_RESOLVER_THREADS)]
    min_resolver_threads: usize,

    /// Upper bound on the resolver thread count.
    #[arg(long, default_value_t = DEFAULT_MAX_RESOLVER_THREADS)]
    max_resolver_threads: usize,

    /// Maximum number of input files.
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_FILES)]
    max_input_files: usize,

    /// Maximum hostname length in bytes; longer tokens are truncated.
    #[arg(long, default_value_t = DEFAULT_MAX_HOSTNAME_LEN)]
    max_hostname_len: usize,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> LookupConfig {
        let mut config = LookupConfig::default()
            .with_queue_capacity(self.queue_capacity)
            .with_resolver_bounds(self.min_resolver_threads, self.max_resolver_threads)
            .with_max_input_files(self.max_input_files)
            .with_max_hostname_len(self.max_hostname_len)
            .with_mode(if self.single {
                ResolutionMode::Single
            } else {
                ResolutionMode::All
            });
        if let Some(n) = self.resolver_threads {
            config = config.with_resolver_threads(n);
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), LookupError> {
    // clap guarantees at least two paths.
    let Some((output_path, inputs)) = cli.files.split_last() else {
        return Err(LookupError::NoInputs);
    };

    let pipeline = Pipeline::new(cli.config(), SystemResolver::new());
    // Validate before the output file is created or truncated.
    pipeline.check_inputs(inputs.len())?;

    let output = File::create(output_path).map_err(|source| LookupError::OutputOpen {
        path: output_path.display().to_string(),
        source,
    })?;

    let summary = pipeline.run(inputs, BufWriter::new(output))?;
    for path in &summary.failed_sources {
        tracing::warn!(path = %path.display(), "Input file skipped");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("multi-lookup: {e}");
            if e.is_usage_error() {
                eprintln!("Usage: multi-lookup <inputFilePath>... <outputFilePath>");
            }
            ExitCode::FAILURE
        }
    }
}
