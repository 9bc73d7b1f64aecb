//! Charge and load schedules
//!
//! Both schedules are lists of segments, each giving a current limit in amps
//! from an offset in seconds. The two endpoints spell the offset differently
//! (`startPeriod` for the charge schedule, `start` for load management), so
//! callers work with [`ScheduleSegment`] and the wire types convert.

use crate::error::{EvnexError, Result};
use serde::{Deserialize, Serialize};

/// Current limit applying from `start` seconds after the schedule begins
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSegment {
    pub start: u32,
    pub limit: f64,
}

impl ScheduleSegment {
    pub fn new(start: u32, limit: f64) -> Self {
        Self { start, limit }
    }
}

/// Check segments are non-empty, strictly ordered by start and have
/// non-negative finite limits
pub fn validate_segments(segments: &[ScheduleSegment]) -> Result<()> {
    if segments.is_empty() {
        return Err(EvnexError::InvalidInput(
            "schedule needs at least one segment".to_string(),
        ));
    }
    for pair in segments.windows(2) {
        if pair[1].start <= pair[0].start {
            return Err(EvnexError::InvalidInput(format!(
                "schedule segments must be ordered by start: {} follows {}",
                pair[1].start, pair[0].start
            )));
        }
    }
    if let Some(bad) = segments
        .iter()
        .find(|s| !s.limit.is_finite() || s.limit < 0.0)
    {
        return Err(EvnexError::InvalidInput(format!(
            "invalid current limit {} at {}s",
            bad.limit, bad.start
        )));
    }
    Ok(())
}

/// Parse `"0:32,3600:0"` into segments
pub fn parse_segments(input: &str) -> Result<Vec<ScheduleSegment>> {
    input.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (start, limit) = part.split_once(':').ok_or_else(|| {
                EvnexError::InvalidInput(format!("expected START:LIMIT, got '{}'", part))
            })?;
            let start = start.trim().parse::<u32>().map_err(|e| {
                EvnexError::InvalidInput(format!("invalid start '{}': {}", start, e))
            })?;
            let limit = limit.trim().parse::<f64>().map_err(|e| {
                EvnexError::InvalidInput(format!("invalid limit '{}': {}", limit, e))
            })?;
            Ok(ScheduleSegment::new(start, limit))
        })
        .collect()
}

/// Convert a wire offset back to whole seconds, refusing values a
/// [`ScheduleSegment`] cannot hold exactly
fn segment_start(start: f64, context: &str) -> Result<u32> {
    let whole = start.is_finite() && start.fract() == 0.0;
    if whole && start >= 0.0 && start <= f64::from(u32::MAX) {
        return Ok(start as u32);
    }
    Err(EvnexError::SchemaValidation {
        context: context.to_string(),
        message: format!("segment start {} is not a whole number of seconds", start),
        payload: serde_json::json!(start),
    })
}

/// Charge schedule period as spelled by `/charge-schedule`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeSchedulePeriod {
    pub limit: f64,
    pub start_period: f64,
}

impl From<ScheduleSegment> for ChargeSchedulePeriod {
    fn from(segment: ScheduleSegment) -> Self {
        Self {
            limit: segment.limit,
            start_period: f64::from(segment.start),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeSchedule {
    pub enabled: bool,
    pub charging_schedule_periods: Vec<ChargeSchedulePeriod>,
}

impl ChargeSchedule {
    pub fn new(segments: &[ScheduleSegment], enabled: bool) -> Self {
        Self {
            enabled,
            charging_schedule_periods: segments.iter().copied().map(Into::into).collect(),
        }
    }

    /// Periods as domain segments, in wire order
    pub fn segments(&self) -> Result<Vec<ScheduleSegment>> {
        self.charging_schedule_periods
            .iter()
            .map(|p| {
                let start = segment_start(p.start_period, "ChargeSchedule")?;
                Ok(ScheduleSegment::new(start, p.limit))
            })
            .collect()
    }
}

/// Load management profile period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeProfileSegment {
    pub limit: f64,
    pub start: f64,
}

impl From<ScheduleSegment> for ChargeProfileSegment {
    fn from(segment: ScheduleSegment) -> Self {
        Self {
            limit: segment.limit,
            start: f64::from(segment.start),
        }
    }
}

/// Load management schedule, as set by `/load-management` and reported on
/// the v2 charge point detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSchedule {
    /// Schedule length in seconds
    pub duration: i64,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Always `A` when set by this client
    pub units: String,
    pub charging_profile_periods: Vec<ChargeProfileSegment>,
}

impl LoadSchedule {
    pub fn new(segments: &[ScheduleSegment], enabled: bool, duration: i64) -> Self {
        Self {
            duration,
            enabled,
            timezone: None,
            units: "A".to_string(),
            charging_profile_periods: segments.iter().copied().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> Result<Vec<ScheduleSegment>> {
        self.charging_profile_periods
            .iter()
            .map(|p| {
                let start = segment_start(p.start, "LoadSchedule")?;
                Ok(ScheduleSegment::new(start, p.limit))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_segments() -> Vec<ScheduleSegment> {
        vec![ScheduleSegment::new(0, 32.0), ScheduleSegment::new(3600, 0.0)]
    }

    #[test]
    fn test_charge_schedule_wire_shape() {
        let schedule = ChargeSchedule::new(&two_segments(), true);
        let value = serde_json::to_value(&schedule).unwrap();
        assert_eq!(
            value,
            json!({
                "enabled": true,
                "chargingSchedulePeriods": [
                    {"limit": 32.0, "startPeriod": 0.0},
                    {"limit": 0.0, "startPeriod": 3600.0}
                ]
            })
        );
    }

    #[test]
    fn test_charge_schedule_echo_keeps_order() {
        let echoed: ChargeSchedule = serde_json::from_value(json!({
            "enabled": true,
            "chargingSchedulePeriods": [
                {"limit": 32, "startPeriod": 0},
                {"limit": 0, "startPeriod": 3600}
            ]
        }))
        .unwrap();
        assert_eq!(echoed.segments().unwrap(), two_segments());
    }

    #[test]
    fn test_echoed_start_must_be_whole_seconds() {
        let fractional: ChargeSchedule = serde_json::from_value(json!({
            "enabled": true,
            "chargingSchedulePeriods": [{"limit": 32, "startPeriod": 1.5}]
        }))
        .unwrap();
        assert!(matches!(
            fractional.segments(),
            Err(EvnexError::SchemaValidation { .. })
        ));

        let negative = LoadSchedule {
            charging_profile_periods: vec![ChargeProfileSegment {
                limit: 16.0,
                start: -60.0,
            }],
            ..LoadSchedule::new(&two_segments(), true, 86400)
        };
        match negative.segments() {
            Err(EvnexError::SchemaValidation { context, payload, .. }) => {
                assert_eq!(context, "LoadSchedule");
                assert_eq!(payload, json!(-60.0));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_schedule_wire_shape() {
        let schedule = LoadSchedule::new(&two_segments(), false, 86400);
        let value = serde_json::to_value(&schedule).unwrap();
        assert_eq!(value["units"], "A");
        assert_eq!(value["duration"], 86400);
        assert_eq!(value["chargingProfilePeriods"][1]["start"], 3600.0);
        assert!(value.get("timezone").is_none());
    }

    #[test]
    fn test_parse_segments() {
        assert_eq!(parse_segments("0:32, 3600:0").unwrap(), two_segments());
        assert!(parse_segments("0-32").is_err());
        assert!(parse_segments("x:1").is_err());
    }

    #[test]
    fn test_validate_segments() {
        assert!(validate_segments(&two_segments()).is_ok());
        assert!(validate_segments(&[]).is_err());

        let unordered = [ScheduleSegment::new(10, 1.0), ScheduleSegment::new(5, 1.0)];
        assert!(matches!(
            validate_segments(&unordered),
            Err(EvnexError::InvalidInput(_))
        ));

        let negative = [ScheduleSegment::new(0, -1.0)];
        assert!(validate_segments(&negative).is_err());
    }
}
