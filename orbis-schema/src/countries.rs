use serde::{Deserialize, Serialize};

/// One element of the country source array (`restcountries.com/v2/all`).
///
/// Only `name` is required; every other field tolerates absence or `null`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct RestCountry {
    pub name: String,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<CountryCurrency>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct CountryCurrency {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl RestCountry {
    /// Code of the first listed currency, if that entry carries a non-empty code.
    pub fn primary_currency_code(&self) -> Option<&str> {
        self.currencies
            .as_ref()?
            .first()?
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
    }
}
