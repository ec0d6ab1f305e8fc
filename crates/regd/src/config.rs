use crate::error::{RegistryErrorExt, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// Registry behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Queries on native functions fail with `InvalidTarget` instead of answering `false`.
    pub strict_targets: bool,
    /// A decorator applied twice to the same chain is recorded once.
    pub dedupe: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { strict_targets: true, dedupe: true }
    }
}

/// Loads a configuration from a file, overlaid with `REGD__`-prefixed environment variables.
///
/// Without a path, a `regd` file in the working directory is used (any extension
/// the `config` crate understands). Nested keys use double underscores, e.g.
/// `REGD__STRICT_TARGETS=false`.
///
/// # Errors
/// Returns [`RegistryError::Config`](crate::RegistryError::Config) if the file is
/// missing or its content does not match `T`.
///
/// # Example
/// ```rust
/// use regd::{RegistryConfig, load_config};
///
/// let cfg: RegistryConfig = load_config(Some("does/not/exist")).unwrap_or_default();
/// assert!(cfg.strict_targets);
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("regd"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(Environment::with_prefix("REGD").separator("__"));

    info!("Loading registry config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
