use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/s3hash/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3HashConfig {
    /// Fixed worker-pool size. When missing, twice the available
    /// parallelism is used (the `--num-threads` flag overrides both).
    #[serde(default)]
    pub num_workers: Option<usize>,
    /// Capacity of the record channel between workers and the writer.
    /// A full channel blocks workers, so the writer sets the pace.
    pub record_channel_capacity: usize,
    /// Capacity of the log-event channel feeding the sink.
    pub log_channel_capacity: usize,
}

impl Default for S3HashConfig {
    fn default() -> Self {
        Self {
            num_workers: None,
            record_channel_capacity: 64,
            log_channel_capacity: 256,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("s3hash")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<S3HashConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = S3HashConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: S3HashConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Worker-pool size when neither the CLI flag nor the config file pins one.
pub fn default_num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
}
