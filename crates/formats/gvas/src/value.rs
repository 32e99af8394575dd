use std::collections::HashMap;

use serde::Serialize;

use crate::string::FString;
use crate::tag::{Guid, PropertyTag};
use crate::text::Text;

/// A decoded property value.
///
/// Values form a tree. Property lists keep their tags alongside the values
/// (see [`PropertyList`]) since the tags cannot be recovered from the values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum Value {
    /// Nothing decoded yet.
    #[default]
    None,
    Bool(bool),
    Byte(u8),
    Int8(i8),
    Int16(i16),
    UInt16(u16),
    Int(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    /// Names, enum values and object references.
    Name(FString),
    Str(FString),
    Text(Text),
    Guid(Guid),
    /// Opaque byte range, re-emitted verbatim.
    Bytes(Vec<u8>),
    /// Placeholder for a property whose decode faulted. Holds the raw bytes
    /// of the property's declared extent and is re-emitted verbatim.
    Faulted(Vec<u8>),
    Array(Vec<Value>),
    Map(MapValue),
    Set(SetValue),
    /// Generic struct, serialized as a property list.
    Struct(PropertyList),
    /// Natively serialized struct: ordered named fields.
    Record(Record),
}

impl Value {
    /// Variant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::UInt16(_) => "uint16",
            Value::Int(_) => "int",
            Value::UInt32(_) => "uint32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Name(_) => "name",
            Value::Str(_) => "string",
            Value::Text(_) => "text",
            Value::Guid(_) => "guid",
            Value::Bytes(_) => "bytes",
            Value::Faulted(_) => "faulted",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Struct(_) => "struct",
            Value::Record(_) => "record",
        }
    }

    pub fn as_struct(&self) -> Option<&PropertyList> {
        match self {
            Value::Struct(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Name(s) | Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v.into()),
            Value::Int8(v) => Some(v.into()),
            Value::Int16(v) => Some(v.into()),
            Value::UInt16(v) => Some(v.into()),
            Value::Int(v) => Some(v.into()),
            Value::UInt32(v) => Some(v.into()),
            Value::Int64(v) => Some(v),
            Value::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }
}

/// Map contents: ordered key/value pairs. Keys may be structs, so the map
/// is not indexed by key.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MapValue {
    /// Leading 32-bit field of unestablished meaning, kept as read.
    pub reserved: i32,
    pub entries: Vec<MapEntry>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MapEntry {
    pub key: Value,
    pub value: Value,
}

/// Set contents, stored as a diff against the defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SetValue {
    pub removed: Vec<Value>,
    pub added: Vec<Value>,
}

/// Tagged property list.
///
/// `tags` holds the wire order and metadata; `values` is keyed by tag name
/// (static array elements carry an `[index]` suffix, repeated names `#n`).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PropertyList {
    pub tags: Vec<PropertyTag>,
    pub values: HashMap<String, Value>,
    /// Four bytes following the terminator of a top-level list.
    pub trailer: Option<i32>,
}

impl PropertyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.values.get_mut(name)
    }

    pub fn tag(&self, name: &str) -> Option<&PropertyTag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Append a property. A name already in the list gets a `#n` suffix
    /// (see [`PropertyTag::repeat`]), so a repeated property keeps its own
    /// tag and value. Use [`PropertyList::get_mut`] to replace a value.
    pub fn push(&mut self, mut tag: PropertyTag, value: Value) {
        let base = tag.name.clone();
        let mut repeat = 0;
        while self.values.contains_key(tag.name.as_str()) {
            repeat += 1;
            tag.name = base.with_repeat_suffix(repeat);
        }
        if repeat > 0 {
            tag.repeat = repeat;
        }
        self.values.insert(tag.name.as_str().to_string(), value);
        self.tags.push(tag);
    }

    /// Properties in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyTag, Option<&Value>)> {
        self.tags
            .iter()
            .map(|tag| (tag, self.values.get(tag.name.as_str())))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Ordered named fields of a natively serialized struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Field slot, appended as [`Value::None`] if missing.
    pub fn field_mut(&mut self, name: &str) -> &mut Value {
        let index = match self.fields.iter().position(|(k, _)| k == name) {
            Some(index) => index,
            None => {
                self.fields.push((name.to_string(), Value::None));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index].1
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        *self.field_mut(&name) = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.fields.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}
