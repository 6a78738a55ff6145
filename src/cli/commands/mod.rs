//! Command implementations.

pub mod annotations;
pub mod completions;
pub mod replay;
pub mod status;
pub mod version;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;

/// Resolve configuration: defaults, then environment, then CLI flags.
///
/// # Errors
///
/// Returns an error if a cache directory name (from either source) is not a
/// plain directory name.
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(name) = &cli.cache_dir_name {
        config = config.with_cache_dir_name(name)?;
    }
    if let Some(path) = &cli.annotations_db {
        config.annotations_db = Some(path.clone());
    }
    Ok(config)
}
