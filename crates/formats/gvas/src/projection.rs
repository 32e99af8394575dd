//! JSON projection of a decoded tree, for inspection.
//!
//! The projection is lossy: string widths, the empty-string sentinel and
//! map reserved fields are dropped, and without tags there is no way back
//! to the wire format. Property lists become objects in wire order.

use serde_json::{json, Map, Number};

use crate::decode::hex;
use crate::options::ProjectionOptions;
use crate::value::{PropertyList, Value};

pub fn to_json(value: &Value, options: &ProjectionOptions) -> serde_json::Value {
    match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(v) => json!(v),
        Value::Byte(v) => json!(v),
        Value::Int8(v) => json!(v),
        Value::Int16(v) => json!(v),
        Value::UInt16(v) => json!(v),
        Value::Int(v) => json!(v),
        Value::UInt32(v) => json!(v),
        Value::Int64(v) => json!(v),
        Value::UInt64(v) => json!(v),
        Value::Float(v) => float(f64::from(*v)),
        Value::Double(v) => float(*v),
        Value::Name(s) | Value::Str(s) => json!(s.as_str()),
        Value::Text(text) => serde_json::to_value(text).unwrap_or_default(),
        Value::Guid(guid) => json!(guid.to_string()),
        Value::Bytes(raw) => json!({ "$bytes": hex(raw) }),
        Value::Faulted(raw) => json!({ "$faulted": hex(raw) }),
        Value::Array(items) => items.iter().map(|v| to_json(v, options)).collect(),
        Value::Map(map) => map
            .entries
            .iter()
            .map(|e| json!({ "key": to_json(&e.key, options), "value": to_json(&e.value, options) }))
            .collect(),
        Value::Set(set) => json!({
            "removed": set.removed.iter().map(|v| to_json(v, options)).collect::<Vec<_>>(),
            "added": set.added.iter().map(|v| to_json(v, options)).collect::<Vec<_>>()
        }),
        Value::Struct(list) => list_to_json(list, options),
        Value::Record(record) => record
            .iter()
            .map(|(k, v)| (k.to_string(), to_json(v, options)))
            .collect::<Map<_, _>>()
            .into(),
    }
}

fn list_to_json(list: &PropertyList, options: &ProjectionOptions) -> serde_json::Value {
    let mut out = Map::new();
    if options.include_tags {
        out.insert(
            options.tags_key.clone(),
            serde_json::to_value(&list.tags).unwrap_or_default(),
        );
    }
    for (tag, value) in list.iter() {
        let projected = value.map_or(serde_json::Value::Null, |v| to_json(v, options));
        out.insert(tag.name.to_string(), projected);
    }
    out.into()
}

/// Non-finite floats have no JSON form.
fn float(v: f64) -> serde_json::Value {
    Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
}
