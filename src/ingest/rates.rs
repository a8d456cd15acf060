use orbis_schema::ExchangeRatesPayload;
use std::collections::HashMap;

/// USD exchange rates keyed by currency code.
///
/// Only finite, strictly positive rates are kept; anything else reads as "no rate".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn lookup(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl FromIterator<(String, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let rates = iter
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .collect();
        Self { rates }
    }
}

impl From<ExchangeRatesPayload> for RateTable {
    fn from(payload: ExchangeRatesPayload) -> Self {
        payload.rates.into_iter().collect()
    }
}
