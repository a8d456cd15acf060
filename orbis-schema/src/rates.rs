use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Payload of the rate source (`open.er-api.com/v6/latest/USD`).
///
/// Only `rates` is consumed and it must be present. Error replies from the source
/// (`{"result":"error", ...}`) carry no `rates` and fail to decode.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ExchangeRatesPayload {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub base_code: Option<String>,
    pub rates: HashMap<String, f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ExchangeRatesPayload {
    /// `true` when the source flagged the reply as failed.
    pub fn is_error(&self) -> bool {
        self.result.as_deref() == Some("error")
    }
}
