//! Result writer: single consumer of hash records. Owns the output file
//! and the running totals.

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

use crate::digest;

use super::log_sink::LogHandle;
use super::HashRecord;

/// Totals accumulated by the writer and reported in the final summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Records successfully written to the output file.
    pub hashes_written: u64,
    /// Sum of object sizes over those records.
    pub bytes_hashed: u64,
}

/// Consume records until the channel is closed and drained, then hand the
/// final stats to the orchestrator exactly once. A record that fails to
/// write is logged and left out of both totals.
pub(super) async fn write_records(
    mut out: File,
    mut records_rx: mpsc::Receiver<HashRecord>,
    stats_tx: oneshot::Sender<RunStats>,
    log: LogHandle,
) {
    let mut stats = RunStats::default();
    while let Some(record) = records_rx.recv().await {
        let line = format!("{}\n", digest::format_record(&record.key, &record.digest));
        match out.write_all(line.as_bytes()).await {
            Ok(()) => {
                stats.hashes_written += 1;
                stats.bytes_hashed += record.size;
            }
            Err(err) => {
                log.error(format!("error writing to output file: {}", err))
                    .await;
            }
        }
    }

    if let Err(err) = out.flush().await {
        log.error(format!("error flushing output file: {}", err))
            .await;
    }

    let _ = stats_tx.send(stats);
}
