use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Country source and rate source settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Country source endpoint returning a JSON array of countries.
    /// TOML: `upstream.countries_url`.
    #[serde(default = "default_countries_url")]
    pub countries_url: Url,

    /// Rate source endpoint returning `{"rates": {CODE: rate}}` relative to USD.
    /// TOML: `upstream.rates_url`.
    #[serde(default = "default_rates_url")]
    pub rates_url: Url,

    /// Per-request timeout applied to each upstream fetch, in seconds.
    /// TOML: `upstream.timeout_secs`. Default: `15`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional upstream HTTP proxy. If set, used for the reqwest client.
    /// TOML: `upstream.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            countries_url: default_countries_url(),
            rates_url: default_rates_url(),
            timeout_secs: default_timeout_secs(),
            proxy: None,
        }
    }
}

fn default_countries_url() -> Url {
    Url::parse(
        "https://restcountries.com/v2/all?fields=name,capital,region,population,flag,currencies",
    )
    .expect("valid country source URL")
}

fn default_rates_url() -> Url {
    Url::parse("https://open.er-api.com/v6/latest/USD").expect("valid rate source URL")
}

fn default_timeout_secs() -> u64 {
    15
}
