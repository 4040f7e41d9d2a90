use s3hash_core::logging;
use std::path::Path;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr when
    // the log file cannot be opened.
    if logging::init_logging(Path::new(cli::LOG_FILE)).is_err() {
        logging::init_logging_stderr();
    }

    // Parse CLI and dispatch.
    if let Err(err) = Cli::run_from_args().await {
        eprintln!("s3hash error: {:#}", err);
        std::process::exit(1);
    }
}
