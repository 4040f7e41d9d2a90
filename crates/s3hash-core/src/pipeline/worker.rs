//! Fetch-and-hash worker: competes with its siblings for keys on a single
//! shared channel, which gives natural load balancing when object sizes
//! vary. A failed fetch is logged and never retried.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::digest;
use crate::store::ObjectFetch;

use super::log_sink::LogHandle;
use super::HashRecord;

/// Worker loop: pull a key, fetch the object, hash it in memory, hand the
/// record to the writer. Exits when the key channel is closed and drained.
pub(super) async fn fetch_and_hash(
    store: Arc<dyn ObjectFetch>,
    keys_rx: Arc<Mutex<mpsc::Receiver<String>>>,
    records_tx: mpsc::Sender<HashRecord>,
    log: LogHandle,
) {
    loop {
        // Receiver lock is scoped to the receive; a slow fetch on this
        // worker must not stall the siblings.
        let key = {
            let mut rx = keys_rx.lock().await;
            rx.recv().await
        };
        let Some(key) = key else {
            return;
        };

        match store.fetch(&key).await {
            Ok(bytes) => {
                let record = HashRecord {
                    digest: digest::sha256_bytes(&bytes),
                    size: bytes.len() as u64,
                    key,
                };
                // Writer gone: nothing left to record into, stop pulling.
                if records_tx.send(record).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                log.error(format!("unable to fetch s3 object '{}', err: {}", key, err))
                    .await;
            }
        }
    }
}
