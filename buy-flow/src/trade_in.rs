use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::state::{TradeInDetailsPatch, set};

/// Quote request for the device being traded in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeInRequest {
    /// Phone being bought
    pub phone_id: String,
    pub tradein_brand: String,
    pub tradein_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Offer returned by the trade-in service.
///
/// Amounts are kept as display strings; numeric JSON is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeInOffer {
    #[serde(deserialize_with = "string_or_number")]
    pub tradein_value: String,
    #[serde(deserialize_with = "string_or_number")]
    pub tradein_promotion: String,
    pub tradein_phone_brand: String,
    pub tradein_model: String,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

impl TradeInOffer {
    /// `Samsung Galaxy S21`
    pub fn device_name(&self) -> String {
        format!("{} {}", self.tradein_phone_brand, self.tradein_model)
            .trim()
            .to_string()
    }

    /// Patch recording this offer as accepted.
    pub fn accepted(&self, condition: Option<&str>) -> TradeInDetailsPatch {
        TradeInDetailsPatch {
            has_trade_in: Some(true),
            trade_in_device: set(self.device_name()),
            trade_in_value: set(&self.tradein_value),
            trade_in_condition: Some(condition.map(str::to_string)),
        }
    }
}
