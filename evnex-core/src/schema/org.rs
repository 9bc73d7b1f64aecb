//! Organisation records and organisation-level summaries

use crate::schema::cost::Cost;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organisation as listed on the user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgBrief {
    pub id: String,
    pub is_default: bool,
    pub role: i64,
    pub created_date: DateTime<Utc>,
    pub name: String,
    pub slug: String,
    pub tier: i64,
    /// Free-form tier metadata, passed through untouched
    #[serde(default)]
    pub tier_details: serde_json::Value,
    pub updated_date: DateTime<Utc>,
}

/// One bucket of the organisation insight report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgInsightEntry {
    /// Carbon offset in kg
    pub carbon_offset: f64,
    pub costs: Vec<Cost>,
    /// Total charging duration in seconds
    pub duration: i64,
    /// Energy delivered in Wh
    pub power_usage: f64,
    pub start_date: DateTime<Utc>,
    pub sessions: i64,
}

/// Charge point counts per status bucket for an organisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgStatusSummary {
    pub available: u32,
    pub charging: u32,
    pub disabled: u32,
    pub faulted: u32,
    pub occupied: u32,
    pub offline: u32,
    pub reserved: u32,
}

impl OrgStatusSummary {
    /// Total number of charge points counted
    pub fn total(&self) -> u32 {
        self.available
            + self.charging
            + self.disabled
            + self.faulted
            + self.occupied
            + self.offline
            + self.reserved
    }
}
