use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const SUMMARY_FILE_NAME: &str = "summary.png";

/// Summary image and GDP derivation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// Directory holding the cached summary image. Created on demand.
    /// TOML: `summary.cache_dir`. Default: `cache`.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Extra directory of font files loaded in addition to system fonts.
    /// TOML: `summary.fonts_dir`. Default: unset.
    #[serde(default)]
    pub fonts_dir: Option<PathBuf>,

    /// Lower bound (inclusive) of the random GDP multiplier.
    /// TOML: `summary.gdp_factor_min`. Default: `1000`.
    #[serde(default = "default_gdp_factor_min")]
    pub gdp_factor_min: u32,

    /// Upper bound (inclusive) of the random GDP multiplier.
    /// TOML: `summary.gdp_factor_max`. Default: `2000`.
    #[serde(default = "default_gdp_factor_max")]
    pub gdp_factor_max: u32,
}

impl SummaryConfig {
    pub fn image_path(&self) -> PathBuf {
        self.cache_dir.join(SUMMARY_FILE_NAME)
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            fonts_dir: None,
            gdp_factor_min: default_gdp_factor_min(),
            gdp_factor_max: default_gdp_factor_max(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_gdp_factor_min() -> u32 {
    1000
}

fn default_gdp_factor_max() -> u32 {
    2000
}
