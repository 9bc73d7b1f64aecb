//! Product code decoding
//!
//! Charge points report a product code such as `E2-2-5-SN` (E2 series) or
//! `X7-T2SW` (X series). Unknown codes and unknown table entries are passed
//! through rather than rejected.

use serde::Serialize;

const NOT_APPLICABLE: &str = "N/A";
const UNKNOWN: &str = "Unknown";

/// Decoded product code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub connector: String,
    pub cable_length: String,
    pub colour: String,
    /// X series only
    pub power: String,
    /// X series only
    pub power_sensor: String,
    /// X series only
    pub configuration: String,
}

impl ModelInfo {
    fn unknown() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            connector: UNKNOWN.to_string(),
            cable_length: UNKNOWN.to_string(),
            colour: UNKNOWN.to_string(),
            power: NOT_APPLICABLE.to_string(),
            power_sensor: NOT_APPLICABLE.to_string(),
            configuration: NOT_APPLICABLE.to_string(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.name != UNKNOWN
    }
}

fn lookup(table: &[(&str, &str)], key: &str) -> String {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
        .unwrap_or_else(|| key.to_string())
}

const E2_NAMES: &[(&str, &str)] = &[("E2", "E2 Plus"), ("E2C", "E2 Core")];
const E2_CONNECTORS: &[(&str, &str)] = &[("1", "Type 1"), ("2", "Type 2")];
const E2_CABLES: &[(&str, &str)] = &[("5", "5 metres"), ("8", "8 metres")];
const E2_COLOURS: &[(&str, &str)] = &[
    ("SN", "Snow"),
    ("ST", "Stone"),
    ("SA", "Sand"),
    ("VO", "Volcanic"),
];

const X_POWER: &[(&str, &str)] = &[("7", "7 kW"), ("22", "22 kW")];
const X_POWER_SENSORS: &[(&str, &str)] = &[("T", "External PS"), ("P", "Onboard PS")];
const X_CONNECTORS: &[(&str, &str)] = &[("1", "Type 1"), ("2", "Type 2")];
const X_CONFIGURATIONS: &[(&str, &str)] = &[("S", "Socket"), ("T", "5m Tether")];
const X_COLOURS: &[(&str, &str)] = &[("W", "White"), ("G", "Grey")];

/// Decode a product code
pub fn parse_model(code: &str) -> ModelInfo {
    let code = code.trim();
    let parsed = if code.starts_with("E2") {
        parse_e2(code)
    } else if code.starts_with('X') {
        parse_x(code)
    } else {
        None
    };
    parsed.unwrap_or_else(ModelInfo::unknown)
}

fn parse_e2(code: &str) -> Option<ModelInfo> {
    let (prefix, rest) = code.split_once('-')?;
    // Separators inside the variant part are optional: E2-2-5-SN, E2-25SN
    let variant: Vec<char> = rest.chars().filter(|c| *c != '-').collect();
    if variant.len() < 4 {
        return None;
    }
    let colour: String = variant[variant.len() - 2..].iter().collect();

    Some(ModelInfo {
        name: lookup(E2_NAMES, prefix),
        connector: lookup(E2_CONNECTORS, &variant[0].to_string()),
        cable_length: lookup(E2_CABLES, &variant[1].to_string()),
        colour: lookup(E2_COLOURS, &colour),
        power: NOT_APPLICABLE.to_string(),
        power_sensor: NOT_APPLICABLE.to_string(),
        configuration: NOT_APPLICABLE.to_string(),
    })
}

fn parse_x(code: &str) -> Option<ModelInfo> {
    let (series, rest) = code.split_once('-')?;
    let power_key = &series[1..];
    let chars: Vec<String> = rest.chars().take(4).map(String::from).collect();
    if chars.len() < 4 {
        return None;
    }

    Some(ModelInfo {
        name: format!("X{}", power_key),
        connector: lookup(X_CONNECTORS, &chars[1]),
        cable_length: NOT_APPLICABLE.to_string(),
        colour: lookup(X_COLOURS, &chars[3]),
        power: lookup(X_POWER, power_key),
        power_sensor: lookup(X_POWER_SENSORS, &chars[0]),
        configuration: lookup(X_CONFIGURATIONS, &chars[2]),
    })
}
