//! The fetch-and-hash pipeline: one key producer, a pool of workers, one
//! result writer, one log sink, and the shutdown ordering tying them
//! together.
//!
//! Lifecycle: the key channel closes when the producer finishes; workers
//! drain it and exit; the last worker's exit closes the record channel;
//! the writer drains that and hands back the totals; the log channel
//! closes last so every buffered event reaches the logger before the
//! final summary.

mod keys;
mod log_sink;
mod worker;
mod writer;

pub use log_sink::{LogEvent, LogHandle, Severity};
pub use writer::RunStats;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinSet;

use crate::store::ObjectFetch;

/// A successfully fetched and hashed object, in flight from a worker to
/// the result writer.
#[derive(Debug)]
pub struct HashRecord {
    pub key: String,
    pub digest: [u8; 32],
    /// Object size in bytes; feeds the bytes-hashed total.
    pub size: u64,
}

/// Everything `run` needs to wire the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Input file with one object key per line.
    pub keys_file: PathBuf,
    /// Output file; truncated and rewritten each run.
    pub output_file: PathBuf,
    /// Worker-pool size.
    pub num_workers: usize,
    /// Record channel capacity; a full channel blocks workers.
    pub record_channel_capacity: usize,
    /// Log channel capacity; a full channel briefly blocks producers.
    pub log_channel_capacity: usize,
}

/// Run the pipeline to completion and return the final totals.
///
/// Spawns the log sink, the result writer, the key producer and
/// `num_workers` fetch workers, then drains them in dependency order:
/// workers first, then the writer (for the totals), then the sink. Every
/// key is processed at most once and every buffered record and log event
/// is flushed before this returns.
pub async fn run(store: Arc<dyn ObjectFetch>, options: PipelineOptions) -> Result<RunStats> {
    let num_workers = options.num_workers.max(1);

    // An output open failure is fatal before anything is spawned; a
    // pipeline that cannot record results has nothing to do.
    let out = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&options.output_file)
        .await
        .with_context(|| {
            format!(
                "failed to create output file: {}",
                options.output_file.display()
            )
        })?;

    tracing::info!(
        "s3hash started, pid: {}, outfile: {}, num_cores: {}",
        std::process::id(),
        options.output_file.display(),
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    );
    tracing::debug!("keys-file: {}", options.keys_file.display());
    tracing::debug!("num-workers: {}", num_workers);

    // Key channel is bounded to the pool size so the producer cannot run
    // far ahead of the workers.
    let (keys_tx, keys_rx) = mpsc::channel::<String>(num_workers);
    let (records_tx, records_rx) =
        mpsc::channel::<HashRecord>(options.record_channel_capacity.max(1));
    let (log_tx, log_rx) = mpsc::channel::<LogEvent>(options.log_channel_capacity.max(1));
    let (stats_tx, stats_rx) = oneshot::channel::<RunStats>();
    let log = LogHandle::new(log_tx);

    let sink = tokio::spawn(log_sink::run_sink(log_rx));
    let writer = tokio::spawn(writer::write_records(
        out,
        records_rx,
        stats_tx,
        log.clone(),
    ));

    // The producer's completion is observable only through the key-channel
    // close; its task handle is deliberately not kept.
    tokio::spawn(keys::stream_keys(
        options.keys_file.clone(),
        keys_tx,
        log.clone(),
    ));

    let keys_rx = Arc::new(Mutex::new(keys_rx));
    let mut workers = JoinSet::new();
    for _ in 0..num_workers {
        workers.spawn(worker::fetch_and_hash(
            Arc::clone(&store),
            Arc::clone(&keys_rx),
            records_tx.clone(),
            log.clone(),
        ));
    }
    // Only workers hold record senders from here on; the record channel
    // closes when the last worker exits. Same for the key receiver: once
    // the workers drop it, a still-blocked producer unblocks and stops.
    drop(records_tx);
    drop(keys_rx);

    while let Some(joined) = workers.join_next().await {
        if joined.is_err() {
            log.error("fetch worker panicked").await;
        }
    }

    // All record senders are gone; the writer drains and reports.
    let stats = match stats_rx.await {
        Ok(stats) => stats,
        Err(_) => {
            log.error("result writer exited without reporting totals").await;
            RunStats::default()
        }
    };
    let _ = writer.await;

    // Last producer handle; the sink drains whatever is buffered and exits.
    drop(log);
    let _ = sink.await;

    // The logger is no longer shared with any task, direct use is safe.
    tracing::info!(
        "s3hash finished, hashed {} bytes and wrote {} hashes to {}",
        stats.bytes_hashed,
        stats.hashes_written,
        options.output_file.display(),
    );

    Ok(stats)
}
