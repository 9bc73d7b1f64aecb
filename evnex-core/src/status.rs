//! Connector status reported by charge points
//!
//! The status is observed, never enforced by the client. The usual cycle is
//! `OFFLINE -> AVAILABLE -> PREPARING -> CHARGING -> FINISHING -> AVAILABLE`,
//! with `FAULTED`, `UNAVAILABLE`, `RESERVED`, `SUSPENDED_EV` and
//! `SUSPENDED_EVSE` as side branches.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// OCPP-derived device status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Offline,
    Available,
    Preparing,
    Charging,
    SuspendedEvse,
    SuspendedEv,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
}

impl DeviceStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [DeviceStatus; 10] = [
        DeviceStatus::Offline,
        DeviceStatus::Available,
        DeviceStatus::Preparing,
        DeviceStatus::Charging,
        DeviceStatus::SuspendedEvse,
        DeviceStatus::SuspendedEv,
        DeviceStatus::Finishing,
        DeviceStatus::Reserved,
        DeviceStatus::Unavailable,
        DeviceStatus::Faulted,
    ];

    /// Wire name, e.g. `SUSPENDED_EV`
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Offline => "OFFLINE",
            DeviceStatus::Available => "AVAILABLE",
            DeviceStatus::Preparing => "PREPARING",
            DeviceStatus::Charging => "CHARGING",
            DeviceStatus::SuspendedEvse => "SUSPENDED_EVSE",
            DeviceStatus::SuspendedEv => "SUSPENDED_EV",
            DeviceStatus::Finishing => "FINISHING",
            DeviceStatus::Reserved => "RESERVED",
            DeviceStatus::Unavailable => "UNAVAILABLE",
            DeviceStatus::Faulted => "FAULTED",
        }
    }

    /// Human readable explanation shown to end users
    pub fn description(&self) -> &'static str {
        match self {
            DeviceStatus::Available => "Available",
            DeviceStatus::Charging => "Charging",
            DeviceStatus::Faulted => "Faulted",
            DeviceStatus::Finishing => "Finished charging - unplug charge point",
            DeviceStatus::Preparing => "Preparing to charge",
            DeviceStatus::Reserved => "Reserved",
            DeviceStatus::SuspendedEv => "The vehicle is not currently requesting energy",
            DeviceStatus::SuspendedEvse => "Charging has been paused by the charge point",
            DeviceStatus::Unavailable => "Disabled",
            DeviceStatus::Offline => "Offline",
        }
    }

    /// Whether energy is currently flowing or about to
    pub fn is_active_session(&self) -> bool {
        matches!(
            self,
            DeviceStatus::Preparing
                | DeviceStatus::Charging
                | DeviceStatus::SuspendedEv
                | DeviceStatus::SuspendedEvse
                | DeviceStatus::Finishing
        )
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        DeviceStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Unknown device status '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!("CHARGING".parse::<DeviceStatus>(), Ok(DeviceStatus::Charging));
        assert_eq!(
            "suspended_ev".parse::<DeviceStatus>(),
            Ok(DeviceStatus::SuspendedEv)
        );
        assert_eq!(
            "SUSPENDED-EVSE".parse::<DeviceStatus>(),
            Ok(DeviceStatus::SuspendedEvse)
        );
        assert!("OCCUPIED".parse::<DeviceStatus>().is_err());
    }

    #[test]
    fn test_wire_names_round_trip() {
        for status in DeviceStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<DeviceStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(
            DeviceStatus::Finishing.description(),
            "Finished charging - unplug charge point"
        );
        assert_eq!(DeviceStatus::Unavailable.description(), "Disabled");
    }

    #[test]
    fn test_active_session() {
        assert!(DeviceStatus::Charging.is_active_session());
        assert!(!DeviceStatus::Available.is_active_session());
        assert!(!DeviceStatus::Offline.is_active_session());
    }
}
