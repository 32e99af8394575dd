//! Encoder: a value tree back to bytes.
//!
//! Tags are written as recorded, with placeholder sizes that are
//! backpatched once each value is written. Opaque and faulted values are
//! re-emitted verbatim, so a tree decoded from a well-formed file encodes to
//! the identical bytes.

use crate::cursor::{forward_archive, Writer};
use crate::error::{Error, Result};
use crate::natives;
use crate::patch::SizeField;
use crate::registry::{PropertyArchive, Registry};
use crate::slot::{self, mismatch};
use crate::string::FString;
use crate::tag::{ElementSlot, PropertyKind, PropertyTag, PropertyType};
use crate::value::{PropertyList, Value};

pub struct Encoder<'a> {
    writer: Writer,
    registry: &'a Registry,
}

forward_archive!(Encoder<'_>, writer);

impl PropertyArchive for Encoder<'_> {
    fn registry(&self) -> &Registry {
        self.registry
    }

    fn property_list(&mut self, slot: &mut Value, trailer: bool) -> Result<()> {
        match slot {
            Value::Struct(list) => self.write_property_list(list, trailer),
            other => Err(mismatch("property list", "struct", other)),
        }
    }
}

impl<'a> Encoder<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            writer: Writer::new(),
            registry,
        }
    }

    pub fn position(&self) -> usize {
        self.writer.position()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.writer.into_bytes()
    }

    /// Write every property in tag order, the terminator, and for a
    /// top-level list the trailing four bytes.
    ///
    /// Values are borrowed mutably only so native serializers can share
    /// the decode path; the list is left as it was.
    pub fn write_property_list(&mut self, list: &mut PropertyList, trailer: bool) -> Result<()> {
        for tag in &list.tags {
            let value = list.values.get_mut(tag.name.as_str()).ok_or_else(|| Error::Parse {
                context: "property list",
                message: format!("no value for property {}", tag.name),
            })?;
            self.write_property(tag, value)?;
        }
        PropertyTag::write_terminator(&mut self.writer)?;
        if trailer {
            self.writer.write_i32(list.trailer.unwrap_or(0));
        }
        Ok(())
    }

    fn write_property(&mut self, tag: &PropertyTag, value: &mut Value) -> Result<()> {
        let offsets = tag.write(&mut self.writer)?;
        if let (Some(at), Value::Bool(v)) = (offsets.bool_value, &*value) {
            let byte = u8::from(*v);
            self.writer.go_back(at, |w, _| {
                w.write_u8(byte);
                Ok(())
            })?;
        }
        self.write_value(tag, value)?;
        SizeField::at(offsets.size_field).patch(&mut self.writer, offsets.value_start)?;
        Ok(())
    }

    fn write_value(&mut self, tag: &PropertyTag, value: &mut Value) -> Result<()> {
        if let Value::Bytes(raw) | Value::Faulted(raw) = value {
            self.writer.write_bytes(raw);
            return Ok(());
        }
        match &tag.ty {
            PropertyType::Text => return slot::text(self, value),
            PropertyType::SoftObject => return natives::soft_object_path(self, value),
            PropertyType::MulticastInlineDelegate | PropertyType::MulticastSparseDelegate => {
                return natives::multicast_delegate(self, value)
            }
            PropertyType::Struct { name, .. } => return self.write_struct(name, value),
            _ => {}
        }

        let w = &mut self.writer;
        match (&tag.ty, value) {
            (PropertyType::Bool(_), Value::Bool(_)) => {}

            (PropertyType::Byte(_), Value::Byte(v)) => w.write_u8(*v),
            (PropertyType::Byte(_), Value::Int64(v)) => w.write_i64(*v),
            (
                PropertyType::Byte(_)
                | PropertyType::Enum(_)
                | PropertyType::Name
                | PropertyType::Object
                | PropertyType::Str,
                Value::Name(s) | Value::Str(s),
            ) => s.write(w)?,

            (PropertyType::Int8, Value::Int8(v)) => w.write_i8(*v),
            (PropertyType::Int16, Value::Int16(v)) => w.write_i16(*v),
            (PropertyType::UInt16, Value::UInt16(v)) => w.write_u16(*v),
            (PropertyType::Int, Value::Int(v)) => w.write_i32(*v),
            (PropertyType::UInt32, Value::UInt32(v)) => w.write_u32(*v),
            (PropertyType::Int64, Value::Int64(v)) => w.write_i64(*v),
            (PropertyType::UInt64, Value::UInt64(v)) => w.write_u64(*v),
            (PropertyType::Float, Value::Float(v)) => w.write_f32(*v),
            (PropertyType::Double, Value::Double(v)) => w.write_f64(*v),

            (PropertyType::Array(inner), Value::Array(items)) => self.write_array(tag, inner, items)?,
            (PropertyType::Map(key, val), Value::Map(map)) => {
                w.write_i32(map.reserved);
                self.write_count(map.entries.len())?;
                let key_tag = tag.element(key, ElementSlot::MapKey);
                let value_tag = tag.element(val, ElementSlot::MapValue);
                for entry in &mut map.entries {
                    self.write_value(&key_tag, &mut entry.key)?;
                    self.write_value(&value_tag, &mut entry.value)?;
                }
            }
            (PropertyType::Set(inner), Value::Set(set)) => {
                let item = tag.element(inner, ElementSlot::SetItem);
                for items in [&mut set.removed, &mut set.added] {
                    self.write_count(items.len())?;
                    for v in items.iter_mut() {
                        self.write_value(&item, v)?;
                    }
                }
            }

            (ty, other) => {
                return Err(mismatch(tag.name.as_str(), expected(ty), other));
            }
        }
        Ok(())
    }

    fn write_struct(&mut self, name: &FString, value: &mut Value) -> Result<()> {
        if let Some(native) = self.registry.resolve(name.as_str()) {
            return native(self, value);
        }
        match value {
            Value::Struct(list) => self.write_property_list(list, false),
            other => Err(mismatch(name.as_str(), "struct", other)),
        }
    }

    fn write_array(&mut self, tag: &PropertyTag, inner: &PropertyKind, items: &mut [Value]) -> Result<()> {
        let count = self.write_count(items.len())?;
        if *inner != PropertyKind::Struct {
            let element = tag.element(inner, ElementSlot::ArrayItem { count });
            for item in items.iter_mut() {
                self.write_value(&element, item)?;
            }
            return Ok(());
        }

        // One tag for all elements, sized to cover them all.
        let element = tag
            .element
            .as_deref()
            .ok_or_else(|| Error::MissingElementTag {
                property: tag.name.to_string(),
            })?;
        let offsets = element.write(&mut self.writer)?;
        for item in items.iter_mut() {
            self.write_value(element, item)?;
        }
        SizeField::at(offsets.size_field).patch(&mut self.writer, offsets.value_start)?;
        Ok(())
    }

    fn write_count(&mut self, len: usize) -> Result<i32> {
        let count = i32::try_from(len).map_err(|_| Error::Parse {
            context: "container",
            message: format!("{len} elements do not fit a 32-bit count"),
        })?;
        self.writer.write_i32(count);
        Ok(count)
    }
}

/// Value variant a tag type is written from, for mismatch errors.
fn expected(ty: &PropertyType) -> &'static str {
    match ty {
        PropertyType::Bool(_) => "bool",
        PropertyType::Byte(_) => "byte, name or int64",
        PropertyType::Enum(_) | PropertyType::Name | PropertyType::Object => "name",
        PropertyType::Int8 => "int8",
        PropertyType::Int16 => "int16",
        PropertyType::UInt16 => "uint16",
        PropertyType::Int => "int",
        PropertyType::UInt32 => "uint32",
        PropertyType::Int64 => "int64",
        PropertyType::UInt64 => "uint64",
        PropertyType::Float => "float",
        PropertyType::Double => "double",
        PropertyType::Str => "string",
        PropertyType::Text => "text",
        PropertyType::SoftObject => "record",
        PropertyType::MulticastInlineDelegate | PropertyType::MulticastSparseDelegate => "array",
        PropertyType::Struct { .. } => "struct",
        PropertyType::Array(_) => "array",
        PropertyType::Map(..) => "map",
        PropertyType::Set(_) => "set",
        PropertyType::Other(_) => "bytes",
    }
}
