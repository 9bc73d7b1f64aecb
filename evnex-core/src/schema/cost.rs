//! Cost records shared by sessions, insights and charge point detail

use serde::{Deserialize, Serialize};

/// Monetary amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub currency: String,
    pub cost: f64,
}

/// Cost segment of a v2 electricity tariff (`start` in seconds from midnight)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityCostSegment {
    pub cost: f64,
    pub start: f64,
}

/// v2 electricity tariff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityCost {
    pub currency: String,
    pub duration: Option<i64>,
    pub costs: Vec<ElectricityCostSegment>,
}

/// v3 tariff period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityTariff {
    pub start: f64,
    pub rate: f64,
    /// Tariff kind, e.g. `Flat`
    #[serde(rename = "type")]
    pub kind: String,
}

/// v3 electricity tariff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricityCostV3 {
    pub currency: String,
    pub tariffs: Vec<ElectricityTariff>,
    pub tariff_type: String,
    pub cost: f64,
}
