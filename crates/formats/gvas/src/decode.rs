//! Decoder: bytes to a value tree.
//!
//! Tags describe every property, but a few encodings are still ambiguous
//! without the game's class metadata: untyped byte properties, structs that
//! may be native-serialized, and map or set elements whose struct type is
//! not recorded. Those are resolved by speculative reads that restore the
//! cursor on failure, and by falling back to opaque byte ranges that the
//! encoder re-emits verbatim.
//!
//! Property-level faults are recoverable: the decoder reports them, skips
//! to the property's declared end and carries on. Every recovered fault is
//! logged and collected; see [`Decoder::faults`].

use std::fmt;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::cursor::{forward_archive, Reader};
use crate::error::{Error, Result};
use crate::natives;
use crate::options::DecodeOptions;
use crate::registry::{PropertyArchive, Registry};
use crate::slot;
use crate::string::FString;
use crate::tag::{ElementSlot, PropertyKind, PropertyTag, PropertyType};
use crate::value::{MapEntry, MapValue, PropertyList, SetValue, Value};

/// What went wrong with a recovered property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    /// The value decoded, but not to the size its tag declares.
    SizeMismatch,
    /// The value failed to decode.
    ValueError,
    /// Structured decoding was abandoned and the value kept as raw bytes.
    OpaqueFallback,
    /// A tag flag byte other than 0 or 1, which re-encodes as 1.
    NonCanonicalFlag,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FaultKind::SizeMismatch => "size mismatch",
            FaultKind::ValueError => "value error",
            FaultKind::OpaqueFallback => "opaque fallback",
            FaultKind::NonCanonicalFlag => "non-canonical flag",
        })
    }
}

/// A recovered decode fault.
#[derive(Debug, Clone, Serialize)]
pub struct Fault {
    pub property: String,
    pub type_name: String,
    pub kind: FaultKind,
    pub tag_start: usize,
    pub value_start: usize,
    pub declared_end: usize,
    pub message: String,
    /// The property's raw value bytes.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{:#x}..{:#x}]: {}: {}",
            self.type_name, self.property, self.value_start, self.declared_end, self.kind, self.message
        )
    }
}

/// Lowercase hex, no separators.
pub(crate) fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

pub struct Decoder<'a> {
    reader: Reader<'a>,
    registry: &'a Registry,
    options: DecodeOptions,
    faults: Vec<Fault>,
}

forward_archive!(Decoder<'_>, reader);

impl PropertyArchive for Decoder<'_> {
    fn registry(&self) -> &Registry {
        self.registry
    }

    fn property_list(&mut self, slot: &mut Value, trailer: bool) -> Result<()> {
        *slot = Value::Struct(self.read_property_list(trailer)?);
        Ok(())
    }
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8], registry: &'a Registry, options: DecodeOptions) -> Self {
        Self {
            reader: Reader::new(data),
            registry,
            options,
            faults: Vec::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.reader.position()
    }

    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    pub fn is_eof(&self) -> bool {
        self.reader.is_eof()
    }

    /// Faults recovered so far.
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    pub fn into_faults(self) -> Vec<Fault> {
        self.faults
    }

    /// Read a property list up to its "None" terminator, plus the trailing
    /// four bytes of a top-level list.
    pub fn read_property_list(&mut self, trailer: bool) -> Result<PropertyList> {
        let mut list = self.read_properties(None)?;
        if trailer {
            list.trailer = Some(self.reader.read_i32()?);
        }
        Ok(list)
    }

    /// Properties until the terminator. With `probe`, every tag is first
    /// checked for plausibility against the enclosing value's end, and an
    /// implausible one fails the list as [`Error::ProbeFailed`].
    fn read_properties(&mut self, probe: Option<(&FString, usize)>) -> Result<PropertyList> {
        let mut list = PropertyList::new();
        loop {
            if let Some((struct_name, bound)) = probe {
                if !self.probe_tag(bound) {
                    return Err(Error::ProbeFailed {
                        struct_name: struct_name.to_string(),
                        offset: self.reader.position(),
                    });
                }
            }
            let Some(mut tag) = PropertyTag::read(&mut self.reader)? else {
                break;
            };
            self.check_flags(&tag)?;
            let value = self.read_property(&mut tag)?;
            list.push(tag, value);
        }
        Ok(list)
    }

    /// Whether a plausible tag starts here. Never moves the cursor.
    fn probe_tag(&self, bound: usize) -> bool {
        let mut r = self.reader.clone();
        match PropertyTag::read(&mut r) {
            Ok(None) => true,
            Ok(Some(tag)) => {
                let kind = tag.kind();
                let type_name = kind.name();
                !tag.name.is_empty()
                    && r.position() < bound
                    && type_name.bytes().all(|b| b.is_ascii_alphabetic())
                    && type_name.find("Property").is_some_and(|at| at >= 3)
            }
            Err(_) => false,
        }
    }

    /// Report bool and has-guid bytes the encoder cannot reproduce.
    fn check_flags(&mut self, tag: &PropertyTag) -> Result<()> {
        let flags = [tag.offsets.bool_value, Some(tag.offsets.guid_flag)];
        for at in flags.into_iter().flatten() {
            let &[byte] = self.reader.peek_range(at, at + 1) else {
                continue;
            };
            if byte > 1 {
                let message = format!("flag byte {byte:#04x} at {at:#x} is written back as 0x01");
                self.report(fault(tag, FaultKind::NonCanonicalFlag, message, vec![byte]))?;
            }
        }
        Ok(())
    }

    /// Decode one property value and check it fills exactly the size its
    /// tag declares. Recoverable failures resynchronize at the declared end.
    fn read_property(&mut self, tag: &mut PropertyTag) -> Result<Value> {
        let declared_end = tag.declared_end();
        let err = match self.read_value(tag) {
            Ok(value) if self.reader.position() == declared_end => return Ok(value),
            Ok(_) => Error::SizeMismatch {
                property: tag.name.to_string(),
                expected: declared_end,
                actual: self.reader.position(),
            },
            Err(err) => err,
        };
        if !err.is_recoverable() || tag.size < 0 || declared_end > self.reader.len() {
            return Err(err);
        }

        let value_start = tag.offsets.value_start;
        if value_start < self.reader.len() {
            self.reader.seek(value_start)?;
        }
        let raw = self.read_raw(tag.size)?;

        let (kind, value) = match err {
            Error::ProbeFailed { .. } => (FaultKind::OpaqueFallback, Value::Bytes(raw.clone())),
            Error::SizeMismatch { .. } => (FaultKind::SizeMismatch, Value::Faulted(raw.clone())),
            _ => (FaultKind::ValueError, Value::Faulted(raw.clone())),
        };
        self.report(fault(tag, kind, err.to_string(), raw))?;
        Ok(value)
    }

    fn read_value(&mut self, tag: &mut PropertyTag) -> Result<Value> {
        let r = &mut self.reader;
        let value = match &tag.ty {
            PropertyType::Bool(v) => Value::Bool(*v),
            PropertyType::Byte(None) => return self.read_byte(tag.size),
            PropertyType::Byte(Some(_))
            | PropertyType::Enum(_)
            | PropertyType::Name
            | PropertyType::Object => Value::Name(FString::read(r)?),
            PropertyType::Int8 => Value::Int8(r.read_i8()?),
            PropertyType::Int16 => Value::Int16(r.read_i16()?),
            PropertyType::UInt16 => Value::UInt16(r.read_u16()?),
            PropertyType::Int => Value::Int(r.read_i32()?),
            PropertyType::UInt32 => Value::UInt32(r.read_u32()?),
            PropertyType::Int64 => Value::Int64(r.read_i64()?),
            PropertyType::UInt64 => Value::UInt64(r.read_u64()?),
            PropertyType::Float => Value::Float(r.read_f32()?),
            PropertyType::Double => Value::Double(r.read_f64()?),
            PropertyType::Str => Value::Str(FString::read(r)?),
            PropertyType::Text => {
                let mut v = Value::None;
                slot::text(self, &mut v)?;
                v
            }
            PropertyType::SoftObject => {
                let mut v = Value::None;
                natives::soft_object_path(self, &mut v)?;
                v
            }
            PropertyType::MulticastInlineDelegate | PropertyType::MulticastSparseDelegate => {
                let mut v = Value::None;
                natives::multicast_delegate(self, &mut v)?;
                v
            }
            PropertyType::Struct { name, .. } => {
                let name = name.clone();
                return self.read_struct(&name, tag);
            }
            PropertyType::Array(inner) => {
                let inner = inner.clone();
                return self.read_array(tag, &inner);
            }
            PropertyType::Map(key, value) => {
                let (key, value) = (key.clone(), value.clone());
                return self.read_map(tag, &key, &value);
            }
            PropertyType::Set(inner) => {
                let inner = inner.clone();
                return self.read_set(tag, &inner);
            }
            PropertyType::Other(type_name) => {
                let message = format!("unsupported property type {type_name}, kept as raw bytes");
                let raw = self.read_raw(tag.size)?;
                self.report(fault(tag, FaultKind::OpaqueFallback, message, raw.clone()))?;
                Value::Bytes(raw)
            }
        };
        Ok(value)
    }

    /// Byte property without an enum name: a raw byte, an enum value
    /// stored by name, an 8-byte integer, or an opaque range.
    fn read_byte(&mut self, size: i32) -> Result<Value> {
        if size == 1 {
            return Ok(Value::Byte(self.reader.read_u8()?));
        }

        let name = self.speculate(|d| {
            let name = FString::read(&mut d.reader)?;
            if is_enum_name(name.as_str()) {
                Ok(name)
            } else {
                Err(Error::Parse {
                    context: "byte property",
                    message: format!("{:?} is not an enum name", name.as_str()),
                })
            }
        });
        if let Ok(name) = name {
            return Ok(Value::Name(name));
        }

        if size == 8 {
            Ok(Value::Int64(self.reader.read_i64()?))
        } else {
            Ok(Value::Bytes(self.read_raw(size)?))
        }
    }

    fn read_struct(&mut self, name: &FString, tag: &PropertyTag) -> Result<Value> {
        if let Some(native) = self.registry.resolve(name.as_str()) {
            let mut v = Value::None;
            native(self, &mut v)?;
            return Ok(v);
        }
        let list = self.read_properties(Some((name, tag.declared_end())))?;
        Ok(Value::Struct(list))
    }

    fn read_array(&mut self, tag: &mut PropertyTag, inner: &PropertyKind) -> Result<Value> {
        let count = self.read_count()?;
        let mut element = if *inner == PropertyKind::Struct {
            let element = PropertyTag::read(&mut self.reader)?.ok_or_else(|| Error::Parse {
                context: "struct array",
                message: format!("{}: element tag is a list terminator", tag.name),
            })?;
            self.check_flags(&element)?;
            element
        } else {
            tag.element(inner, ElementSlot::ArrayItem { count })
        };

        let items = self.read_elements(&mut element, count)?;
        if *inner == PropertyKind::Struct {
            tag.element = Some(Box::new(element));
        }
        Ok(Value::Array(items))
    }

    fn read_map(&mut self, tag: &PropertyTag, key: &PropertyKind, value: &PropertyKind) -> Result<Value> {
        let attempt = self.speculate(|d| {
            let reserved = d.reader.read_i32()?;
            let count = d.read_count()?;
            let mut key_tag = tag.element(key, ElementSlot::MapKey);
            let mut value_tag = tag.element(value, ElementSlot::MapValue);
            let mut entries = Vec::new();
            for _ in 0..count {
                entries.push(MapEntry {
                    key: d.read_value(&mut key_tag)?,
                    value: d.read_value(&mut value_tag)?,
                });
            }
            Ok(Value::Map(MapValue { reserved, entries }))
        });
        self.or_opaque(tag, "map", attempt)
    }

    fn read_set(&mut self, tag: &PropertyTag, inner: &PropertyKind) -> Result<Value> {
        let attempt = self.speculate(|d| {
            let mut item = tag.element(inner, ElementSlot::SetItem);
            let count = d.read_count()?;
            let removed = d.read_elements(&mut item, count)?;
            let count = d.read_count()?;
            let added = d.read_elements(&mut item, count)?;
            Ok(Value::Set(SetValue { removed, added }))
        });
        self.or_opaque(tag, "set", attempt)
    }

    fn read_elements(&mut self, element: &mut PropertyTag, count: i32) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(self.read_value(element)?);
        }
        Ok(items)
    }

    /// Element count of a container. Every element takes at least one
    /// byte, so counts beyond the remaining data are rejected up front.
    fn read_count(&mut self) -> Result<i32> {
        let offset = self.reader.position();
        let count = self.reader.read_i32()?;
        if count < 0 {
            return Err(Error::NegativeCount { offset, count });
        }
        if count as usize > self.reader.remaining() {
            return Err(Error::Parse {
                context: "container",
                message: format!(
                    "count {count} at {offset:#x} exceeds the {} bytes left",
                    self.reader.remaining()
                ),
            });
        }
        Ok(count)
    }

    /// Keep a failed container decode as the raw bytes of the whole value.
    /// The cursor is back at the value start when `attempt` failed.
    fn or_opaque(&mut self, tag: &PropertyTag, what: &str, attempt: Result<Value>) -> Result<Value> {
        let err = match attempt {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_recoverable() => return Err(err),
            Err(err) => err,
        };
        let raw = self.read_raw(tag.size)?;
        let message = format!("{what} kept as raw bytes: {err}");
        self.report(fault(tag, FaultKind::OpaqueFallback, message, raw.clone()))?;
        Ok(Value::Bytes(raw))
    }

    /// Run `f`; if it fails, restore the cursor and drop any faults it
    /// reported.
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.reader.clone();
        let faults = self.faults.len();
        let out = f(self);
        if out.is_err() {
            self.reader = snapshot;
            self.faults.truncate(faults);
        }
        out
    }

    fn read_raw(&mut self, size: i32) -> Result<Vec<u8>> {
        let offset = self.reader.position();
        let len = usize::try_from(size).map_err(|_| Error::Parse {
            context: "property size",
            message: format!("negative size {size} at {offset:#x}"),
        })?;
        Ok(self.reader.read_bytes(len)?.to_vec())
    }

    fn report(&mut self, fault: Fault) -> Result<()> {
        warn!(
            property = %fault.property,
            ty = %fault.type_name,
            kind = %fault.kind,
            tag_start = fault.tag_start,
            value_start = fault.value_start,
            declared_end = fault.declared_end,
            "{}",
            fault.message
        );
        if fault.bytes.len() <= self.options.dump_limit {
            debug!(property = %fault.property, "value bytes: {}", hex(&fault.bytes));
        }

        if self.options.fail_fast {
            error!(property = %fault.property, "aborting on first fault");
            return Err(Error::FailFast(Box::new(fault)));
        }
        self.faults.push(fault);
        Ok(())
    }
}

fn fault(tag: &PropertyTag, kind: FaultKind, message: String, bytes: Vec<u8>) -> Fault {
    Fault {
        property: tag.name.to_string(),
        type_name: tag.kind().name().to_string(),
        kind,
        tag_start: tag.offsets.start,
        value_start: tag.offsets.value_start,
        declared_end: tag.declared_end(),
        message,
        bytes,
    }
}

/// Enum values stored by name: `[A-Za-z0-9_:]+`.
fn is_enum_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b':')
}
