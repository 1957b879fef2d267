use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Self-describing value tree carried as method-call arguments and
/// response payloads.
///
/// Mirrors the type set of the standard method codec: null, booleans,
/// 32/64-bit integers, doubles, UTF-8 strings, typed numeric buffers,
/// heterogeneous lists and string-keyed maps. Maps are string-keyed by
/// contract; the wire decoder rejects anything else.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    String(String),
    /// Raw byte buffer (wire tag: uint8 list).
    Bytes(Vec<u8>),
    Int32List(Vec<i32>),
    Int64List(Vec<i64>),
    Float64List(Vec<f64>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view over both integer widths.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(n) => Some(i64::from(*n)),
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(x) => Some(*x),
            Value::I32(n) => Some(f64::from(*n)),
            Value::I64(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Map lookup shorthand; `None` for non-maps and missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::I32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::F64(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

// JSON interop: hosts that speak JSON-RPC can bridge payloads without
// hand-building trees. Typed buffers widen to plain JSON arrays; JSON
// integers outside i64 fall back to doubles.
impl From<Value> for JsonValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::I32(n) => JsonValue::from(n),
            Value::I64(n) => JsonValue::from(n),
            Value::F64(x) => JsonValue::from(x),
            Value::String(s) => JsonValue::String(s),
            Value::Bytes(bytes) => JsonValue::from(bytes),
            Value::Int32List(ns) => JsonValue::from(ns),
            Value::Int64List(ns) => JsonValue::from(ns),
            Value::Float64List(xs) => JsonValue::from(xs),
            Value::List(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
            Value::Map(entries) => JsonValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else {
                    Value::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I32(n) => serializer.serialize_i32(*n),
            Value::I64(n) => serializer.serialize_i64(*n),
            Value::F64(x) => serializer.serialize_f64(*x),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Value::Int32List(ns) => ns.serialize(serializer),
            Value::Int64List(ns) => ns.serialize(serializer),
            Value::Float64List(xs) => xs.serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

// Self-describing formats only; typed buffers come back as plain lists,
// which is the same widening the JSON interop applies.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        JsonValue::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::I32(7).as_i64(), Some(7));
        assert_eq!(Value::I64(1 << 40).as_i64(), Some(1 << 40));
        assert_eq!(Value::F64(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn test_map_get() {
        let mut m = BTreeMap::new();
        m.insert("pin".to_string(), Value::I32(17));
        let v = Value::Map(m);
        assert_eq!(v.get("pin").and_then(Value::as_i64), Some(17));
        assert!(v.get("missing").is_none());
        assert!(Value::Null.get("pin").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let mut m = BTreeMap::new();
        m.insert("label".to_string(), Value::from("gpio"));
        m.insert("pins".to_string(), Value::List(vec![Value::I64(4), Value::I64(17)]));
        let v = Value::Map(m);

        let j = JsonValue::from(v.clone());
        assert_eq!(j, json!({"label": "gpio", "pins": [4, 17]}));
        assert_eq!(Value::from(j), v);
    }

    #[test]
    fn test_json_number_widening() {
        let big = json!(u64::MAX);
        match Value::from(big) {
            Value::F64(x) => assert!(x > 0.0),
            other => panic!("expected F64, got {:?}", other),
        }
    }

    #[test]
    fn test_serde_serialize() {
        let v = Value::List(vec![Value::Null, Value::Bool(false), Value::from("x")]);
        let s = serde_json::to_string(&v).unwrap();
        assert_eq!(s, "[null,false,\"x\"]");

        let back: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(back, v);
    }
}
