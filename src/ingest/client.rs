use super::rates::RateTable;
use crate::config::UpstreamConfig;
use crate::error::{OrbisError, UpstreamSource};
use orbis_schema::{ExchangeRatesPayload, RestCountry};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const ORBIS_USER_AGENT: &str = concat!("orbis/", env!("CARGO_PKG_VERSION"));

/// Both upstream payloads of one refresh, fetched together.
#[derive(Debug, Clone)]
pub struct UpstreamSnapshot {
    pub countries: Vec<RestCountry>,
    pub rates: RateTable,
}

/// HTTP client for the country source and the rate source.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    countries_url: Url,
    rates_url: Url,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, OrbisError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(ORBIS_USER_AGENT)
            .connect_timeout(cfg.timeout())
            .timeout(cfg.timeout());

        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self {
            http: builder.build()?,
            countries_url: cfg.countries_url.clone(),
            rates_url: cfg.rates_url.clone(),
            timeout: cfg.timeout(),
        })
    }

    /// Fetch both sources concurrently. Either failing fails the whole snapshot.
    ///
    /// When both fail, the country source is reported.
    pub async fn fetch_snapshot(&self) -> Result<UpstreamSnapshot, OrbisError> {
        let (countries, rates) = tokio::join!(
            self.get_json::<Vec<RestCountry>>(UpstreamSource::Countries, &self.countries_url),
            self.get_json::<ExchangeRatesPayload>(UpstreamSource::Rates, &self.rates_url),
        );

        let countries = countries?;
        let rates = rates?;
        if rates.is_error() {
            let source = UpstreamSource::Rates;
            warn!(
                %source,
                url = %self.rates_url,
                extra = ?rates.extra,
                "Upstream reported an error result"
            );
            return Err(OrbisError::upstream(source, "result: error"));
        }
        let rates = RateTable::from(rates);

        debug!(
            countries = countries.len(),
            rates = rates.len(),
            "Upstream snapshot fetched"
        );
        Ok(UpstreamSnapshot { countries, rates })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        source: UpstreamSource,
        url: &Url,
    ) -> Result<T, OrbisError> {
        let resp = self
            .http
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!(%source, url = %url, error = %e, "Upstream request failed");
                OrbisError::upstream(source, e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%source, url = %url, %status, "Upstream returned non-success status");
            return Err(OrbisError::upstream(source, format!("status {status}")));
        }

        resp.json::<T>().await.map_err(|e| {
            warn!(%source, url = %url, error = %e, "Upstream payload could not be decoded");
            OrbisError::upstream(source, e)
        })
    }
}
