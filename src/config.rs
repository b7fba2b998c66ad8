use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::store::default_cache_dir;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_MATCHDAY_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub matchday_timeout: Duration,
    pub cache_dir: PathBuf,
    pub log_filter: String,
    pub log_file: PathBuf,
}

impl Settings {
    /// Reads settings from the process environment. Call after loading `.env` files.
    pub fn from_env() -> Self {
        let api_url = non_empty_env("EPL_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let matchday_timeout = Duration::from_secs(
            env::var("MATCHDAY_TIMEOUT_SECS")
                .ok()
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_MATCHDAY_TIMEOUT_SECS)
                .clamp(10, 600),
        );
        let cache_dir = non_empty_env("EPL_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(default_cache_dir)
            .unwrap_or_else(|| PathBuf::from(".epl_predictor"));
        let log_filter = non_empty_env("EPL_LOG").unwrap_or_else(|| "info".to_string());
        let log_file = non_empty_env("EPL_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| cache_dir.join("epl_predictor.log"));

        Self {
            api_url,
            matchday_timeout,
            cache_dir,
            log_filter,
            log_file,
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
