//! Key producer: streams trimmed lines from the keys file into the key
//! channel.

use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::log_sink::LogHandle;

/// Read keys one line at a time and send each, whitespace-trimmed, into
/// `keys_tx`. Empty lines pass through as empty keys. The sender is
/// dropped on every exit path, and that channel close is the only
/// completion signal the workers get.
pub(super) async fn stream_keys(path: PathBuf, keys_tx: mpsc::Sender<String>, log: LogHandle) {
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            log.error(format!("unable to open keys file: {}", err)).await;
            return;
        }
    };

    let mut lines = BufReader::new(file).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let key = line.trim().to_string();
                // Receiver gone means the pipeline is shutting down early.
                if keys_tx.send(key).await.is_err() {
                    return;
                }
            }
            Ok(None) => {
                log.debug("done reading keys file").await;
                return;
            }
            Err(err) => {
                // Keys already sent still flow; just stop producing.
                log.error(format!("error reading keys file: {}", err)).await;
                return;
            }
        }
    }
}
