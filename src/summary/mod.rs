//! Summary image: ranking, SVG layout, PNG rasterisation and the on-disk cache.

pub mod cache;
pub mod rank;
pub mod render;

pub use cache::SummaryCache;
pub use rank::{SummaryEntry, TOP_GDP_LIMIT, dedup_by_name, rank_top_gdp};
pub use render::{SummaryRenderer, SummaryView};

use crate::config::SummaryConfig;
use crate::db::DbCountry;
use crate::error::OrbisError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Renders the summary for a set of stored rows and keeps the cache file current.
#[derive(Clone)]
pub struct SummaryGenerator {
    renderer: Arc<SummaryRenderer>,
    cache: SummaryCache,
}

impl SummaryGenerator {
    pub fn new(renderer: Arc<SummaryRenderer>, cache: SummaryCache) -> Self {
        Self { renderer, cache }
    }

    pub fn from_config(cfg: &SummaryConfig) -> Self {
        Self::new(
            Arc::new(SummaryRenderer::new(cfg.fonts_dir.as_deref())),
            SummaryCache::new(cfg.image_path()),
        )
    }

    pub fn cache(&self) -> &SummaryCache {
        &self.cache
    }

    /// Render `rows` stamped with `refreshed_at`, overwrite the cache and return the PNG.
    pub async fn regenerate(
        &self,
        rows: &[DbCountry],
        refreshed_at: DateTime<Utc>,
    ) -> Result<Vec<u8>, OrbisError> {
        let view = SummaryView::new(rows.iter().map(SummaryEntry::from).collect(), refreshed_at);
        let svg = view.to_svg();

        let renderer = self.renderer.clone();
        let png = tokio::task::spawn_blocking(move || renderer.render_png(&svg))
            .await
            .map_err(|e| OrbisError::UnexpectedError(format!("render task failed: {e}")))??;

        self.cache.write(&png).await?;
        info!(
            path = %self.cache.path().display(),
            total_countries = view.total_countries,
            ranked = view.top.len(),
            "Summary image generated"
        );
        Ok(png)
    }
}
