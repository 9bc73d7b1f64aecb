//! Charge point detail in the v3 attribute shape

use crate::schema::charge_point::NetworkStatus;
use crate::schema::cost::ElectricityCostV3;
use crate::schema::schedule::ChargeSchedule;
use crate::status::DeviceStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterV3 {
    #[serde(default)]
    pub current_l1: Option<f64>,
    pub frequency: f64,
    pub power: f64,
    pub register: f64,
    pub updated_date: DateTime<Utc>,
    #[serde(default, rename = "voltageL1N")]
    pub voltage_l1n: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorV3 {
    pub evse_id: String,
    /// e.g. `CABLE`
    pub connector_format: String,
    pub connector_type: String,
    pub ocpp_status: String,
    pub power_type: String,
    pub connector_id: String,
    pub ocpp_code: String,
    pub updated_date: DateTime<Utc>,
    pub meter: MeterV3,
    pub max_voltage: f64,
    pub max_amperage: f64,
}

impl ConnectorV3 {
    pub fn device_status(&self) -> Option<DeviceStatus> {
        self.ocpp_code.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeProfile {
    #[serde(default)]
    pub charge_schedule: Option<ChargeSchedule>,
}

/// Attributes of `GET /v3/charge-points/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargePointDetailV3 {
    pub connectors: Vec<ConnectorV3>,
    pub created_date: DateTime<Utc>,
    pub electricity_cost: ElectricityCostV3,
    pub firmware: String,
    pub iccid: String,
    pub max_current: f64,
    pub model: String,
    pub name: String,
    pub network_status: NetworkStatus,
    pub network_status_updated_date: DateTime<Utc>,
    pub ocpp_charge_point_id: String,
    pub profiles: ChargeProfile,
    pub serial: String,
    /// IANA zone, e.g. `Pacific/Auckland`
    pub time_zone: String,
    pub token_required: bool,
    pub updated_date: DateTime<Utc>,
    pub vendor: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn detail_attributes() -> Value {
        json!({
            "connectors": [{
                "evseId": "NZ*EVX*E1234*1",
                "connectorFormat": "CABLE",
                "connectorType": "IEC_62196_T2",
                "ocppStatus": "AVAILABLE",
                "powerType": "AC_1_PHASE",
                "connectorId": "1",
                "ocppCode": "AVAILABLE",
                "updatedDate": "2022-03-01T10:00:00Z",
                "meter": {
                    "currentL1": 0.0,
                    "frequency": 50.0,
                    "power": 0.0,
                    "register": 123456.0,
                    "updatedDate": "2022-03-01T10:00:00Z",
                    "voltageL1N": 238.5
                },
                "maxVoltage": 230,
                "maxAmperage": 32
            }],
            "createdDate": "2021-08-19T02:29:44.593Z",
            "electricityCost": {
                "currency": "NZD",
                "tariffs": [{"start": 0, "rate": 0.25, "type": "Flat"}],
                "tariffType": "Flat",
                "cost": 0.25
            },
            "firmware": "1.2.3",
            "iccid": "8964000000000000000",
            "maxCurrent": 32,
            "model": "X7-T2SW",
            "name": "Garage",
            "networkStatus": "ONLINE",
            "networkStatusUpdatedDate": "2022-03-01T10:00:00Z",
            "ocppChargePointId": "E1234",
            "profiles": {
                "chargeSchedule": {
                    "enabled": true,
                    "chargingSchedulePeriods": [{"limit": 32, "startPeriod": 0}]
                }
            },
            "serial": "E1234",
            "timeZone": "Pacific/Auckland",
            "tokenRequired": false,
            "updatedDate": "2022-03-01T10:00:00Z",
            "vendor": "Evnex"
        })
    }
}
