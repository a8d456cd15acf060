use super::{factor::FactorSource, rates::RateTable};
use crate::db::CountryUpsert;
use chrono::{DateTime, Utc};
use orbis_schema::RestCountry;

/// Combine one upstream country with the rate table into a row ready for upsert.
///
/// `estimated_gdp = population * factor / exchange_rate` when a rate resolves for the
/// first listed currency, `0` otherwise. Blank strings are stored as `NULL`.
pub fn merge_country<F>(
    country: &RestCountry,
    rates: &RateTable,
    factors: &F,
    refreshed_at: DateTime<Utc>,
) -> CountryUpsert
where
    F: FactorSource + ?Sized,
{
    let population = country.population.unwrap_or(0);
    let currency_code = country.primary_currency_code().map(str::to_string);
    let exchange_rate = currency_code.as_deref().and_then(|code| rates.lookup(code));

    #[allow(clippy::cast_precision_loss)]
    let estimated_gdp = match exchange_rate {
        Some(rate) => population as f64 * f64::from(factors.next_factor()) / rate,
        None => 0.0,
    };

    CountryUpsert {
        name: country.name.clone(),
        capital: non_blank(country.capital.as_deref()),
        region: non_blank(country.region.as_deref()),
        population: i64::try_from(population).unwrap_or(i64::MAX),
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: non_blank(country.flag.as_deref()),
        last_refreshed_at: refreshed_at,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}
