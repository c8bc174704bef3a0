//! Weight download directory resolution for the local engine.
//!
//! The engine downloads model weights below a single root directory, chosen
//! in priority order:
//!
//! 1. The `download_dir` field of the engine config.
//! 2. The `JUDGE_RELAY_CACHE_DIR` environment variable, as `$JUDGE_RELAY_CACHE_DIR/<engine>`.
//! 3. A default `.judge_relay_cache/<engine>` directory relative to the working directory.

use crate::api::LocalEngineConfig;
use std::path::PathBuf;

/// The environment variable used to override the root cache directory.
pub const CACHE_ROOT_ENV: &str = "JUDGE_RELAY_CACHE_DIR";

/// Default root cache directory name (relative to CWD).
const DEFAULT_CACHE_ROOT: &str = ".judge_relay_cache";

fn cache_root() -> PathBuf {
    std::env::var(CACHE_ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CACHE_ROOT))
}

/// Resolve the download directory for `engine` (e.g. `"mistralrs"`).
pub fn resolve_download_dir(engine: &str, config: &LocalEngineConfig) -> PathBuf {
    if let Some(dir) = &config.download_dir {
        return PathBuf::from(dir);
    }
    cache_root().join(engine)
}
