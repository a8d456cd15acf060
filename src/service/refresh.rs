use crate::db::{CountryFilter, DbActorHandle, DbCountry};
use crate::error::OrbisError;
use crate::ingest::{FactorSource, UpstreamClient, merge_country};
use crate::summary::SummaryGenerator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub last_refreshed_at: DateTime<Utc>,
    pub countries: usize,
    /// `false` when rows were committed but the summary image could not be rendered.
    pub image_generated: bool,
}

/// Fetch, merge, persist, render.
///
/// Upstream failures abort before any write. Rows and the meta timestamp are committed
/// in one transaction. A rendering failure after commit is logged and the stale image is
/// dropped, so the next image request renders lazily.
#[derive(Clone)]
pub struct RefreshService {
    db: DbActorHandle,
    upstream: UpstreamClient,
    factors: Arc<dyn FactorSource>,
    summary: SummaryGenerator,
}

impl RefreshService {
    pub fn new(
        db: DbActorHandle,
        upstream: UpstreamClient,
        factors: Arc<dyn FactorSource>,
        summary: SummaryGenerator,
    ) -> Self {
        Self {
            db,
            upstream,
            factors,
            summary,
        }
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, OrbisError> {
        info!("Refreshing countries and exchange rates");
        let snapshot = self.upstream.fetch_snapshot().await?;

        let now = Utc::now();
        let rows = snapshot
            .countries
            .iter()
            .map(|country| merge_country(country, &snapshot.rates, self.factors.as_ref(), now))
            .collect();

        let countries = self.db.apply_refresh(rows, now).await?;
        info!(countries, last_refreshed_at = %now, "Country rows committed");

        let image_generated = match self.regenerate_image(now).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Summary image generation failed after refresh");
                if let Err(e) = self.summary.cache().invalidate().await {
                    warn!(error = %e, "Failed to drop stale summary image");
                }
                false
            }
        };

        Ok(RefreshOutcome {
            last_refreshed_at: now,
            countries,
            image_generated,
        })
    }

    /// Cached PNG if present, otherwise rendered from the current store.
    ///
    /// An empty store yields `SummaryImageNotFound` instead of an empty image.
    pub async fn summary_image(&self) -> Result<Vec<u8>, OrbisError> {
        if let Some(png) = self.summary.cache().read().await? {
            return Ok(png);
        }

        let rows = self.all_rows().await?;
        if rows.is_empty() {
            return Err(OrbisError::SummaryImageNotFound);
        }

        let refreshed_at = self
            .db
            .status()
            .await?
            .last_refreshed_at
            .unwrap_or_else(Utc::now);
        self.summary.regenerate(&rows, refreshed_at).await
    }

    async fn regenerate_image(&self, refreshed_at: DateTime<Utc>) -> Result<(), OrbisError> {
        let rows = self.all_rows().await?;
        self.summary.regenerate(&rows, refreshed_at).await?;
        Ok(())
    }

    async fn all_rows(&self) -> Result<Vec<DbCountry>, OrbisError> {
        self.db.list_countries(CountryFilter::default()).await
    }
}
