use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status of the current federation round as reported by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateStatus {
    pub round: u64,
    pub contributors: u64,
    pub models_in_round: u64,
    pub has_global_model: bool,
}

impl AggregateStatus {
    /// Flatten into a JSON object, the shape the remote cache stores.
    pub fn to_payload(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Rebuild from a cached JSON object. Missing fields take defaults.
    pub fn from_payload(payload: &Map<String, Value>) -> Option<Self> {
        serde_json::from_value(Value::Object(payload.clone())).ok()
    }
}
