mod basic;
mod summary;
mod upstream;

pub use basic::BasicConfig;
pub use summary::SummaryConfig;
pub use upstream::UpstreamConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Country and rate source settings (see `upstream` table in config.toml).
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Summary image settings (see `summary` table in config.toml).
    #[serde(default)]
    pub summary: SummaryConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "ORBIS_";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file and `ORBIS_*`
    /// environment variables, in that order.
    ///
    /// Nested keys use `__` as separator, e.g. `ORBIS_BASIC__LISTEN_PORT=3000`.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration and validates the few fields that have hard constraints.
    pub fn load() -> Result<Self, figment::Error> {
        let cfg: Self = Self::figment().extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), figment::Error> {
        if self.summary.gdp_factor_min > self.summary.gdp_factor_max {
            return Err(figment::Error::from(format!(
                "summary.gdp_factor_min ({}) must not exceed summary.gdp_factor_max ({})",
                self.summary.gdp_factor_min, self.summary.gdp_factor_max
            )));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(figment::Error::from(
                "upstream.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|err| panic!("failed to load configuration: {err}"))
});
