//! Configuration loading for the CLI
//!
//! Sources, lowest precedence first: the `--config` file, then `DELEGATOR_*`
//! environment variables. The `--strategy` flag is applied by the caller.

use ::config::Map;
use anyhow::{Context, Result};
use delegator_lib::DelegationConfig;
use std::path::Path;

const ENV_PREFIX: &str = "DELEGATOR";

/// Load and deserialize the delegation configuration
pub fn load(path: Option<&Path>) -> Result<DelegationConfig> {
    load_with_env(path, None)
}

/// Same as [`load`], reading `DELEGATOR_*` variables from `env` instead of
/// the process environment when it is given
pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<DelegationConfig> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        builder = builder.add_source(::config::File::from(path));
    }

    let settings = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        )
        .build()
        .context("Failed to read configuration")?;

    settings
        .try_deserialize()
        .context("Failed to parse configuration")
}
