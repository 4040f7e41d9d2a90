//! CLI for the s3hash object hasher.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use s3hash_core::config;
use s3hash_core::pipeline::{self, PipelineOptions};
use s3hash_core::store::{ObjectFetch, S3Store};

/// Output file name, written to the working directory.
pub const OUTPUT_FILE: &str = "s3hashes.csv";
/// Log file name, written to the working directory.
pub const LOG_FILE: &str = "s3hash.log";

/// Download and SHA-256 hash S3 objects.
///
/// Streams keys from a file, fetches each object from the bucket, hashes
/// it in memory and writes `key,\xdigest` lines to s3hashes.csv. Fetched
/// objects are never stored on the filesystem.
#[derive(Debug, Parser)]
#[command(name = "s3hash")]
#[command(about = "Download and sha256 hash s3 objects", long_about = None)]
pub struct Cli {
    /// The s3 bucket from which to fetch objects.
    #[arg(long)]
    pub bucket: String,

    /// The input file from which to read s3 keys.
    #[arg(long, value_name = "PATH")]
    pub keys_file: PathBuf,

    /// The number of fetch workers (defaults to NUM_CPUS * 2).
    #[arg(long, value_name = "N")]
    pub num_threads: Option<u16>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        cli.run().await
    }

    pub async fn run(&self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let num_workers = match self.num_threads {
            Some(n) if n > 0 => n as usize,
            _ => cfg.num_workers.unwrap_or_else(config::default_num_workers),
        };
        tracing::debug!("bucket: {}", self.bucket);

        let store: Arc<dyn ObjectFetch> = Arc::new(S3Store::connect(self.bucket.clone()).await);
        let options = PipelineOptions {
            keys_file: self.keys_file.clone(),
            output_file: PathBuf::from(OUTPUT_FILE),
            num_workers,
            record_channel_capacity: cfg.record_channel_capacity,
            log_channel_capacity: cfg.log_channel_capacity,
        };

        pipeline::run(store, options).await?;
        Ok(())
    }
}
