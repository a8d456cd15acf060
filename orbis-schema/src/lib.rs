pub mod countries;
pub mod rates;

pub use countries::{CountryCurrency, RestCountry};
pub use rates::ExchangeRatesPayload;
