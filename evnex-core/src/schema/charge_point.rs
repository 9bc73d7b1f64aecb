//! Charge point records (v2 API shape)

use crate::schema::cost::ElectricityCost;
use crate::schema::schedule::LoadSchedule;
use crate::status::DeviceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connectivity of a charge point as reported by the cloud
///
/// The set of values is owned by the service; anything not listed here
/// decodes as `Unknown` rather than failing the whole record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkStatus {
    Online,
    Offline,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NetworkStatus::Online => "ONLINE",
            NetworkStatus::Offline => "OFFLINE",
            NetworkStatus::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Latest meter reading of a connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorMeter {
    /// e.g. `AC_1_PHASE`
    pub power_type: String,
    pub updated_date: DateTime<Utc>,
    pub power: f64,
    /// Cumulative energy register in Wh
    pub register: f64,
    pub frequency: f64,
}

/// Physical charging outlet of a charge point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub power_type: String,
    pub connector_id: String,
    pub evse_id: String,
    pub updated_date: String,
    pub connector_type: String,
    pub amperage: f64,
    pub voltage: f64,
    pub connector_format: String,
    pub ocpp_status: String,
    /// Cloud status, e.g. `OCCUPIED`
    pub status: String,
    /// OCPP code, e.g. `CHARGING`
    pub ocpp_code: String,
    pub meter: ConnectorMeter,
}

impl Connector {
    /// OCPP code mapped onto the known status table
    pub fn device_status(&self) -> Option<DeviceStatus> {
        self.ocpp_code.parse().ok()
    }
}

/// Geographic coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Postal address of a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address1: String,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub post_code: Option<String>,
    pub state: Option<String>,
    pub country: String,
}

/// Site a charge point is installed at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub address: Option<Address>,
    pub coordinates: Option<Coordinates>,
    pub charge_point_count: i64,
}

/// Hardware details of a charge point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargePointDetails {
    /// Product code, see [`crate::model::parse_model`]
    pub model: String,
    pub vendor: String,
    pub firmware: String,
    pub iccid: String,
}

/// Solar charging configuration (`commands/get-solar`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolarConfig {
    pub solar_with_schedule: bool,
    pub power_sensor_installed: bool,
    pub solar_start_export_power: f64,
    pub solar_stop_import_power: f64,
}

/// Charge-now override state (`commands/get-override`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideConfig {
    pub charge_now: bool,
}

/// Charge point as listed for an organisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargePoint {
    pub id: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub network_status_updated_date: DateTime<Utc>,
    pub name: String,
    pub ocpp_charge_point_id: String,
    pub serial: String,
    pub network_status: NetworkStatus,
    pub location: Location,
    pub details: ChargePointDetails,
    pub connectors: Vec<Connector>,
    pub last_heard: Option<DateTime<Utc>>,
    pub max_current: f64,
    pub token_required: bool,
    pub needs_registration_information: bool,
}

/// Charger settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargePointConfiguration {
    pub max_current: f64,
    pub plug_and_charge: bool,
}

/// Full v2 charge point detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargePointDetail {
    pub id: String,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub network_status_updated_date: DateTime<Utc>,
    pub name: String,
    pub ocpp_charge_point_id: String,
    pub serial: String,
    pub network_status: NetworkStatus,
    pub location: Location,
    pub configuration: ChargePointConfiguration,
    pub electricity_cost: ElectricityCost,
    pub load_schedule: LoadSchedule,
    pub connectors: Vec<Connector>,
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn test_charge_point_decoding() {
        let cp: ChargePoint = serde_json::from_value(fixtures::charge_point("cp-1")).unwrap();
        assert_eq!(cp.id, "cp-1");
        assert_eq!(cp.network_status, NetworkStatus::Online);
        assert_eq!(cp.connectors.len(), 1);
        assert_eq!(cp.connectors[0].meter.register, 123456.0);
        assert_eq!(
            cp.connectors[0].device_status(),
            Some(DeviceStatus::Charging)
        );
    }

    #[test]
    fn test_unknown_network_status() {
        let mut value = fixtures::charge_point("cp-1");
        value["networkStatus"] = serde_json::json!("DEGRADED");
        let cp: ChargePoint = serde_json::from_value(value).unwrap();
        assert_eq!(cp.network_status, NetworkStatus::Unknown);
    }

    #[test]
    fn test_missing_connectors_is_rejected() {
        let mut value = fixtures::charge_point("cp-1");
        value.as_object_mut().unwrap().remove("connectors");
        assert!(serde_json::from_value::<ChargePoint>(value).is_err());
    }

    #[test]
    fn test_last_heard_nullable() {
        let mut value = fixtures::charge_point("cp-1");
        value["lastHeard"] = serde_json::Value::Null;
        let cp: ChargePoint = serde_json::from_value(value).unwrap();
        assert!(cp.last_heard.is_none());
    }
}
