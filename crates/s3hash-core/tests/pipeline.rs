//! End-to-end pipeline tests against an in-memory object store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use s3hash_core::digest;
use s3hash_core::pipeline::{self, PipelineOptions, RunStats};
use s3hash_core::store::{FetchError, ObjectFetch};

/// In-memory store: known keys return their bytes, everything else fails
/// the way a missing S3 object would.
struct MemoryStore {
    objects: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    fn new(objects: &[(&str, &[u8])]) -> Arc<dyn ObjectFetch> {
        Arc::new(Self {
            objects: objects
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect(),
        })
    }
}

#[async_trait]
impl ObjectFetch for MemoryStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, FetchError> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::Get(format!("no such key: {}", key)))
    }
}

fn options(dir: &TempDir, num_workers: usize) -> PipelineOptions {
    PipelineOptions {
        keys_file: dir.path().join("keys.txt"),
        output_file: dir.path().join("s3hashes.csv"),
        num_workers,
        record_channel_capacity: 8,
        log_channel_capacity: 64,
    }
}

async fn run_with_keys(
    dir: &TempDir,
    store: Arc<dyn ObjectFetch>,
    keys: &str,
    num_workers: usize,
) -> RunStats {
    let opts = options(dir, num_workers);
    std::fs::write(&opts.keys_file, keys).unwrap();
    pipeline::run(store, opts).await.unwrap()
}

fn sorted_lines(path: &Path) -> Vec<String> {
    let contents = std::fs::read_to_string(path).unwrap();
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    lines.sort();
    lines
}

#[tokio::test]
async fn hashes_two_objects_and_reports_totals() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(&[("a.txt", b"hello"), ("b.txt", b"world!")]);

    let stats = run_with_keys(&dir, store, "a.txt\nb.txt\n", 2).await;

    assert_eq!(stats.hashes_written, 2);
    assert_eq!(stats.bytes_hashed, 11);

    let lines = sorted_lines(&dir.path().join("s3hashes.csv"));
    assert_eq!(
        lines,
        vec![
            digest::format_record("a.txt", &digest::sha256_bytes(b"hello")),
            digest::format_record("b.txt", &digest::sha256_bytes(b"world!")),
        ]
    );
    // Pin one digest to a known vector so format_record can't drift.
    assert_eq!(
        lines[0],
        "a.txt,\\x2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[tokio::test]
async fn duplicate_keys_are_processed_independently() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(&[("a.txt", b"hello")]);

    let stats = run_with_keys(&dir, store, "a.txt\na.txt\n", 2).await;

    assert_eq!(stats.hashes_written, 2);
    assert_eq!(stats.bytes_hashed, 10);

    let lines = sorted_lines(&dir.path().join("s3hashes.csv"));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], lines[1]);
}

#[tokio::test]
async fn empty_input_creates_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(&[]);

    let stats = run_with_keys(&dir, store, "", 2).await;

    assert_eq!(stats, RunStats::default());
    let output = dir.path().join("s3hashes.csv");
    assert!(output.exists());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
}

#[tokio::test]
async fn failed_fetches_still_reach_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(&[]);

    let stats = run_with_keys(&dir, store, "missing-1\nmissing-2\nmissing-3\n", 4).await;

    assert_eq!(stats, RunStats::default());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("s3hashes.csv")).unwrap(),
        ""
    );
}

#[tokio::test]
async fn partial_failures_count_only_successes() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(&[("good.txt", b"hello")]);

    let stats = run_with_keys(&dir, store, "good.txt\nbad.txt\n", 2).await;

    assert_eq!(stats.hashes_written, 1);
    assert_eq!(stats.bytes_hashed, 5);
    assert_eq!(sorted_lines(&dir.path().join("s3hashes.csv")).len(), 1);
}

#[tokio::test]
async fn missing_keys_file_yields_an_empty_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(&[("a.txt", b"hello")]);

    // No keys file written; the producer logs the open failure and closes
    // the channel without producing keys.
    let stats = pipeline::run(store, options(&dir, 2)).await.unwrap();

    assert_eq!(stats, RunStats::default());
    assert!(dir.path().join("s3hashes.csv").exists());
}

#[tokio::test]
async fn output_is_truncated_between_runs() {
    let dir = tempfile::tempdir().unwrap();

    let store = MemoryStore::new(&[("a.txt", b"hello"), ("b.txt", b"world!")]);
    run_with_keys(&dir, store, "a.txt\nb.txt\n", 2).await;
    assert_eq!(sorted_lines(&dir.path().join("s3hashes.csv")).len(), 2);

    let store = MemoryStore::new(&[]);
    let stats = run_with_keys(&dir, store, "", 2).await;
    assert_eq!(stats, RunStats::default());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("s3hashes.csv")).unwrap(),
        ""
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_count_does_not_change_the_output_multiset() {
    let objects: Vec<(String, Vec<u8>)> = (0..20)
        .map(|i| (format!("obj-{:02}", i), format!("payload-{}", i).into_bytes()))
        .collect();
    let object_refs: Vec<(&str, &[u8])> = objects
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_slice()))
        .collect();
    let keys: String = objects.iter().map(|(k, _)| format!("{}\n", k)).collect();

    let dir_single = tempfile::tempdir().unwrap();
    let stats_single = run_with_keys(
        &dir_single,
        MemoryStore::new(&object_refs),
        &keys,
        1,
    )
    .await;

    let dir_wide = tempfile::tempdir().unwrap();
    let stats_wide = run_with_keys(&dir_wide, MemoryStore::new(&object_refs), &keys, 16).await;

    assert_eq!(stats_single, stats_wide);
    assert_eq!(stats_single.hashes_written, 20);
    assert_eq!(
        sorted_lines(&dir_single.path().join("s3hashes.csv")),
        sorted_lines(&dir_wide.path().join("s3hashes.csv")),
    );
}

#[tokio::test]
async fn unwritable_output_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(&[]);

    let mut opts = options(&dir, 2);
    opts.output_file = dir.path().join("no-such-dir").join("s3hashes.csv");
    std::fs::write(&opts.keys_file, "a.txt\n").unwrap();

    assert!(pipeline::run(store, opts).await.is_err());
}
