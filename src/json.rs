// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! JSON representation of map data and operations.
//!
//! The server's JSON form keys every map field by name *and* kind, using a
//! type suffix: `visits_counter`, `active_flag`, `greeting_register`,
//! `tags_set`, `profile_map`. [`MapData`] converts to and from that shape,
//! and an [`Operation`] converts into the body of a map update request:
//!
//! ```json
//! {
//!   "update": {
//!     "profile_map": {
//!       "update": { "logins_counter": { "increment": 1 } }
//!     }
//!   }
//! }
//! ```
//!
//! Blobs are rendered as JSON strings when their bytes are valid UTF-8 and
//! as base64 strings otherwise.
//!
//! NOTE: decoding takes string bytes verbatim; a non-UTF-8 blob therefore
//! does not round-trip through JSON. Text payloads, the overwhelmingly
//! common case, round-trip exactly.
use crate::{
    ops::{Action, Operation, Payload},
    snapshot::MapData,
    values::{Blob, ValueKind},
};
use serde_json::{Map, Value, json};
use std::{error, fmt};

fn kind_suffix(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Counter => "counter",
        ValueKind::Flag => "flag",
        ValueKind::Register => "register",
        ValueKind::Set => "set",
        ValueKind::Map => "map",
    }
}

fn suffixed(name: &str, kind: ValueKind) -> String {
    format!("{name}_{}", kind_suffix(kind))
}

fn split_field(field: &str) -> Option<(&str, ValueKind)> {
    let (name, suffix) = field.rsplit_once('_')?;
    let kind = match suffix {
        "counter" => ValueKind::Counter,
        "flag" => ValueKind::Flag,
        "register" => ValueKind::Register,
        "set" => ValueKind::Set,
        "map" => ValueKind::Map,
        _ => return None,
    };
    Some((name, kind))
}

fn blob_to_json(blob: &Blob) -> Value {
    match blob.as_str() {
        Some(text) => text.into(),
        None => base64::Engine::encode(&base64::engine::general_purpose::STANDARD, blob.as_bytes())
            .into(),
    }
}

impl From<&Blob> for Value {
    fn from(blob: &Blob) -> Self {
        blob_to_json(blob)
    }
}

impl MapData {
    /// The server JSON form of this map, with type-suffixed field names.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (name, value) in &self.counters {
            object.insert(suffixed(name, ValueKind::Counter), (*value).into());
        }
        for (name, value) in &self.flags {
            object.insert(suffixed(name, ValueKind::Flag), (*value).into());
        }
        for (name, value) in &self.registers {
            object.insert(suffixed(name, ValueKind::Register), blob_to_json(value));
        }
        for (name, members) in &self.sets {
            object.insert(
                suffixed(name, ValueKind::Set),
                members.iter().map(blob_to_json).collect(),
            );
        }
        for (name, data) in &self.maps {
            object.insert(suffixed(name, ValueKind::Map), data.to_json());
        }
        Value::Object(object)
    }

    /// Decodes the server JSON form.
    pub fn from_json(value: &Value) -> Result<Self, JsonError> {
        let Some(object) = value.as_object() else {
            return Err(JsonError::NotAnObject);
        };

        let mut data = Self::default();
        for (field, value) in object {
            let Some((name, kind)) = split_field(field) else {
                return Err(JsonError::UnknownField(field.clone()));
            };
            match kind {
                ValueKind::Counter => {
                    let Some(v) = value.as_i64() else {
                        return Err(JsonError::invalid(field, "an integer"));
                    };
                    data.counters.insert(name.to_string(), v);
                }
                ValueKind::Flag => {
                    let Some(v) = value.as_bool() else {
                        return Err(JsonError::invalid(field, "a boolean"));
                    };
                    data.flags.insert(name.to_string(), v);
                }
                ValueKind::Register => {
                    let Some(v) = value.as_str() else {
                        return Err(JsonError::invalid(field, "a string"));
                    };
                    data.registers.insert(name.to_string(), v.into());
                }
                ValueKind::Set => {
                    let Some(elements) = value.as_array() else {
                        return Err(JsonError::invalid(field, "an array"));
                    };
                    let members = elements
                        .iter()
                        .map(|element| {
                            element
                                .as_str()
                                .map(Blob::from)
                                .ok_or_else(|| JsonError::invalid(field, "an array of strings"))
                        })
                        .collect::<Result<_, _>>()?;
                    data.sets.insert(name.to_string(), members);
                }
                ValueKind::Map => {
                    data.maps.insert(name.to_string(), Self::from_json(value)?);
                }
            }
        }
        Ok(data)
    }
}

/// Converts an [`Operation`] into the JSON body of a map update request.
impl From<&Operation> for Value {
    fn from(op: &Operation) -> Self {
        // operations are stamped by their collection before serialization
        let field = suffixed(op.name().unwrap_or_default(), op.kind());
        match op.action() {
            Action::Remove => json!({ "remove": [field] }),
            Action::Update(payload) => json!({ "update": { field: payload_to_json(payload) } }),
        }
    }
}

fn payload_to_json(payload: &Payload) -> Value {
    match payload {
        Payload::Increment(amount) => json!({ "increment": amount }),
        Payload::Flag(true) => "enable".into(),
        Payload::Flag(false) => "disable".into(),
        Payload::Assign(value) => blob_to_json(value),
        Payload::Members { add, remove } => {
            let mut object = Map::new();
            if !add.is_empty() {
                object.insert("add".to_string(), add.iter().map(blob_to_json).collect());
            }
            if !remove.is_empty() {
                object.insert(
                    "remove".to_string(),
                    remove.iter().map(blob_to_json).collect(),
                );
            }
            Value::Object(object)
        }
        Payload::Entry(inner) => Value::from(&**inner),
    }
}

/// Errors decoding the server JSON form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonError {
    /// The value was not a JSON object.
    NotAnObject,
    /// A field name did not carry a recognized type suffix.
    UnknownField(String),
    /// A field's value did not match its suffix's type.
    InvalidValue {
        field: String,
        expected: &'static str,
    },
}

impl JsonError {
    fn invalid(field: &str, expected: &'static str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            expected,
        }
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "map data must be a JSON object"),
            Self::UnknownField(field) => {
                write!(f, "field {field:?} carries no recognized type suffix")
            }
            Self::InvalidValue { field, expected } => {
                write!(f, "field {field:?} must hold {expected}")
            }
        }
    }
}

impl error::Error for JsonError {}
