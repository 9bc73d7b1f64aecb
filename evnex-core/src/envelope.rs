//! Response envelopes and the typed decoder
//!
//! The EVNEX API wraps payloads in different envelopes depending on the API
//! revision an endpoint belongs to:
//!
//! - v2: `{"data": T}`
//! - v3: `{"data": {"id", "type", "attributes": T, "relationships"}, "included": [...]}`
//! - a few v3 command endpoints answer with `T` directly
//!
//! Each client operation names its [`Envelope`] explicitly. Decoding either
//! yields a fully validated record or an [`EvnexError::SchemaValidation`]
//! carrying the fragment that failed; nothing falls back to defaults.

use crate::error::{EvnexError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope shape of an endpoint's response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// The record is the top-level JSON value
    Bare,
    /// `{"data": T}`
    V2,
    /// JSON:API style `{"data": {"id", "type", "attributes": T, ...}}`
    V3,
}

/// v2 list payload: `{"items": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

/// Reference to a related resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// `{"data": {"id", "type"}}` wrapper used inside `relationships`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipLink {
    pub data: Option<ResourceRef>,
}

/// Relationships a v3 resource may declare
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationships {
    pub charge_point: Option<RelationshipLink>,
    pub location: Option<RelationshipLink>,
    pub organisation: Option<RelationshipLink>,
}

/// A decoded v3 resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource<T> {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: T,
    #[serde(default)]
    pub relationships: Relationships,
}

#[derive(Deserialize)]
struct ResourceHeader {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    relationships: Relationships,
}

/// Decode `payload` as `T` inside the given envelope.
///
/// `context` names the operation and ends up in validation errors.
pub fn decode<T: DeserializeOwned>(envelope: Envelope, payload: Value, context: &str) -> Result<T> {
    match envelope {
        Envelope::Bare => from_fragment(payload, context),
        Envelope::V2 => from_fragment(take_data(payload, context)?, context),
        Envelope::V3 => decode_resource(payload, context).map(|resource| resource.attributes),
    }
}

/// Decode a single v3 resource, keeping its id, type and relationships.
///
/// `included` is never inspected.
pub fn decode_resource<T: DeserializeOwned>(payload: Value, context: &str) -> Result<Resource<T>> {
    resource_from(take_data(payload, context)?, context)
}

/// Decode a v3 collection document `{"data": [resource, ...]}`.
pub fn decode_collection<T: DeserializeOwned>(
    payload: Value,
    context: &str,
) -> Result<Vec<Resource<T>>> {
    match take_data(payload, context)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| resource_from(item, context))
            .collect(),
        other => Err(schema_error(
            context,
            "expected `data` to be an array of resources",
            other,
        )),
    }
}

fn take_data(payload: Value, context: &str) -> Result<Value> {
    match payload {
        Value::Object(mut object) => match object.remove("data") {
            Some(data) => Ok(data),
            None => Err(schema_error(
                context,
                "missing `data` envelope",
                Value::Object(object),
            )),
        },
        other => Err(schema_error(context, "expected a JSON object envelope", other)),
    }
}

fn resource_from<T: DeserializeOwned>(value: Value, context: &str) -> Result<Resource<T>> {
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(schema_error(
                context,
                "expected a resource object",
                other,
            ))
        }
    };

    let attributes = match object.remove("attributes") {
        Some(attributes) => from_fragment::<T>(attributes, context)?,
        None => {
            return Err(schema_error(
                context,
                "resource has no `attributes`",
                Value::Object(object),
            ))
        }
    };

    let header: ResourceHeader = from_fragment(Value::Object(object), context)?;

    Ok(Resource {
        id: header.id,
        kind: header.kind,
        attributes,
        relationships: header.relationships,
    })
}

fn from_fragment<T: DeserializeOwned>(fragment: Value, context: &str) -> Result<T> {
    match T::deserialize(&fragment) {
        Ok(value) => Ok(value),
        Err(e) => Err(schema_error(context, e.to_string(), fragment)),
    }
}

fn schema_error(context: &str, message: impl Into<String>, payload: Value) -> EvnexError {
    EvnexError::SchemaValidation {
        context: context.to_string(),
        message: message.into(),
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Probe {
        charge_now: bool,
    }

    #[test]
    fn test_decode_v2() {
        let payload = json!({"data": {"chargeNow": true}});
        let probe: Probe = decode(Envelope::V2, payload, "probe").unwrap();
        assert_eq!(probe, Probe { charge_now: true });
    }

    #[test]
    fn test_decode_v2_items() {
        let payload = json!({"data": {"items": [{"chargeNow": true}, {"chargeNow": false}]}});
        let items: Items<Probe> = decode(Envelope::V2, payload, "probe").unwrap();
        assert_eq!(items.items.len(), 2);
        assert!(!items.items[1].charge_now);
    }

    #[test]
    fn test_decode_v2_missing_data() {
        let payload = json!({"chargeNow": true});
        let err = decode::<Probe>(Envelope::V2, payload, "probe").unwrap_err();
        match err {
            EvnexError::SchemaValidation {
                context, payload, ..
            } => {
                assert_eq!(context, "probe");
                assert_eq!(payload, json!({"chargeNow": true}));
            }
            other => panic!("Expected SchemaValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bare() {
        let payload = json!({"chargeNow": false, "extra": 1});
        let probe: Probe = decode(Envelope::Bare, payload, "probe").unwrap();
        assert!(!probe.charge_now);
    }

    #[test]
    fn test_decode_v3_ignores_included() {
        let attributes = json!({"name": "Garage", "maxCurrent": 32.0});
        let without_included = json!({
            "data": {
                "id": "x",
                "type": "charge-point",
                "attributes": attributes,
                "relationships": {}
            }
        });
        let with_included = json!({
            "data": {
                "id": "x",
                "type": "charge-point",
                "attributes": attributes,
                "relationships": {}
            },
            "included": [{"id": "loc-1", "type": "location", "attributes": {"name": "Home"}}]
        });
        let with_garbage_included = json!({
            "data": {
                "id": "x",
                "type": "charge-point",
                "attributes": attributes,
                "relationships": {}
            },
            "included": "not even a list"
        });

        let a: Value = decode(Envelope::V3, without_included, "detail").unwrap();
        let b: Value = decode(Envelope::V3, with_included, "detail").unwrap();
        let c: Value = decode(Envelope::V3, with_garbage_included, "detail").unwrap();
        assert_eq!(a, attributes);
        assert_eq!(b, attributes);
        assert_eq!(c, attributes);
    }

    #[test]
    fn test_decode_resource_keeps_header() {
        let payload = json!({
            "data": {
                "id": "cp-1",
                "type": "charge-point",
                "attributes": {"chargeNow": true},
                "relationships": {
                    "organisation": {"data": {"id": "org-1", "type": "organisation"}}
                }
            }
        });
        let resource: Resource<Probe> = decode_resource(payload, "detail").unwrap();
        assert_eq!(resource.id, "cp-1");
        assert_eq!(resource.kind, "charge-point");
        let org = resource.relationships.organisation.unwrap().data.unwrap();
        assert_eq!(org.id, "org-1");
        assert!(resource.relationships.location.is_none());
    }

    #[test]
    fn test_decode_v3_missing_relationships() {
        let payload = json!({
            "data": {"id": "cp-1", "type": "charge-point", "attributes": {"chargeNow": true}}
        });
        let resource: Resource<Probe> = decode_resource(payload, "detail").unwrap();
        assert_eq!(resource.relationships, Relationships::default());
    }

    #[test]
    fn test_decode_v3_bad_attributes_carries_fragment() {
        let payload = json!({
            "data": {
                "id": "cp-1",
                "type": "charge-point",
                "attributes": {"chargeNow": "yes please"},
                "relationships": {}
            }
        });
        let err = decode::<Probe>(Envelope::V3, payload, "override").unwrap_err();
        match err {
            EvnexError::SchemaValidation { payload, message, .. } => {
                assert_eq!(payload, json!({"chargeNow": "yes please"}));
                assert!(!message.is_empty());
            }
            other => panic!("Expected SchemaValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_v3_rejects_collection() {
        let payload = json!({"data": [{"id": "1", "type": "t", "attributes": {"chargeNow": true}}]});
        assert!(decode::<Probe>(Envelope::V3, payload, "probe").is_err());
    }

    #[test]
    fn test_decode_collection() {
        let payload = json!({
            "data": [
                {"id": "s-1", "type": "session", "attributes": {"chargeNow": true}},
                {"id": "s-2", "type": "session", "attributes": {"chargeNow": false}, "relationships": {}}
            ]
        });
        let sessions: Vec<Resource<Probe>> = decode_collection(payload, "sessions").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "s-1");
        assert!(!sessions[1].attributes.charge_now);
    }

    #[test]
    fn test_decode_collection_rejects_object() {
        let payload = json!({"data": {"id": "s-1", "type": "session", "attributes": {}}});
        let err = decode_collection::<Probe>(payload, "sessions").unwrap_err();
        assert!(matches!(err, EvnexError::SchemaValidation { .. }));
    }

    #[test]
    fn test_non_object_envelope() {
        let err = decode::<Probe>(Envelope::V2, json!([1, 2, 3]), "probe").unwrap_err();
        assert!(matches!(err, EvnexError::SchemaValidation { .. }));
    }
}
