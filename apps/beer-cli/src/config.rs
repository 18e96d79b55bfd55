//! Layered configuration: serde defaults, then the YAML file (if given),
//! then `BEER_CATALOG__*` environment variables.

use std::path::Path;

use anyhow::{Context, Result, bail};
use beer_catalog_client::BeerClientConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};

pub const ENV_PREFIX: &str = "BEER_CATALOG__";

/// Nested keys use `__`: `BEER_CATALOG__OAUTH__CLIENT_SECRET` sets
/// `oauth.client_secret`.
pub fn load(path: Option<&Path>) -> Result<BeerClientConfig> {
    figment(path)?
        .extract()
        .context("invalid beer catalog configuration")
}

fn figment(path: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::new();
    if let Some(path) = path {
        if !path.is_file() {
            bail!("config file does not exist: {}", path.display());
        }
        figment = figment.merge(Yaml::file(path));
    }
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}
