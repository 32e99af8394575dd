//! In-place value slots for codecs written once against [`Archive`].
//!
//! A reading archive replaces the slot with what it decodes; a writing
//! archive encodes the slot's current contents and fails with
//! [`Error::TypeMismatch`] if the slot holds the wrong kind of value.

use crate::cursor::Archive;
use crate::error::{Error, Result};
use crate::string::FString;
use crate::tag::Guid;
use crate::text::Text;
use crate::value::{Record, Value};

pub(crate) fn mismatch(context: &str, expected: &'static str, found: &Value) -> Error {
    Error::TypeMismatch {
        context: context.to_string(),
        expected,
        found: found.kind_name(),
    }
}

macro_rules! scalar_slot {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $variant:ident) => {
        $(#[$doc])*
        pub fn $name<A: Archive + ?Sized>(ar: &mut A, slot: &mut Value) -> Result<()> {
            let mut v: $ty = match slot {
                Value::$variant(v) => *v,
                _ if ar.is_reading() => Default::default(),
                other => return Err(mismatch(stringify!($name), stringify!($name), other)),
            };
            ar.$name(&mut v)?;
            *slot = Value::$variant(v);
            Ok(())
        }
    };
}

scalar_slot!(
    /// Raw byte.
    u8, u8, Byte
);
scalar_slot!(i8, i8, Int8);
scalar_slot!(u16, u16, UInt16);
scalar_slot!(i16, i16, Int16);
scalar_slot!(u32, u32, UInt32);
scalar_slot!(
    /// Signed 32-bit integer, also used for the 4-byte bools of native structs.
    i32, i32, Int
);
scalar_slot!(u64, u64, UInt64);
scalar_slot!(i64, i64, Int64);
scalar_slot!(f32, f32, Float);
scalar_slot!(f64, f64, Double);

fn fstring_slot<A: Archive + ?Sized>(
    ar: &mut A,
    slot: &mut Value,
    wrap: fn(FString) -> Value,
    expected: &'static str,
) -> Result<()> {
    let mut s = match slot {
        Value::Name(s) | Value::Str(s) => std::mem::take(s),
        _ if ar.is_reading() => FString::Null,
        other => return Err(mismatch("string", expected, other)),
    };
    ar.fstring(&mut s)?;
    *slot = wrap(s);
    Ok(())
}

/// Name, serialized as a length-prefixed string.
pub fn name<A: Archive + ?Sized>(ar: &mut A, slot: &mut Value) -> Result<()> {
    fstring_slot(ar, slot, Value::Name, "name")
}

pub fn string<A: Archive + ?Sized>(ar: &mut A, slot: &mut Value) -> Result<()> {
    fstring_slot(ar, slot, Value::Str, "string")
}

pub fn text<A: Archive + ?Sized>(ar: &mut A, slot: &mut Value) -> Result<()> {
    if ar.is_reading() {
        *slot = Value::Text(Text::default());
    }
    match slot {
        Value::Text(text) => text.archive(ar),
        other => Err(mismatch("text", "text", other)),
    }
}

pub fn guid<A: Archive + ?Sized>(ar: &mut A, slot: &mut Value) -> Result<()> {
    if ar.is_reading() {
        *slot = Value::Guid(Guid::default());
    }
    match slot {
        Value::Guid(guid) => guid.archive(ar),
        other => Err(mismatch("guid", "guid", other)),
    }
}

/// Fixed-length raw byte range.
pub fn bytes<A: Archive + ?Sized>(ar: &mut A, slot: &mut Value, len: usize) -> Result<()> {
    if ar.is_reading() {
        *slot = Value::Bytes(Vec::new());
    }
    match slot {
        Value::Bytes(raw) => ar.bytes(raw, len),
        other => Err(mismatch("bytes", "bytes", other)),
    }
}

/// Record slot for a native struct. Reading starts from an empty record.
pub fn record<'v, A: Archive + ?Sized>(ar: &A, slot: &'v mut Value) -> Result<&'v mut Record> {
    if ar.is_reading() {
        *slot = Value::Record(Record::new());
    }
    match slot {
        Value::Record(record) => Ok(record),
        other => Err(mismatch("record", "record", other)),
    }
}

/// Count-prefixed array whose elements are serialized by `elem`.
pub fn array<A, F>(ar: &mut A, slot: &mut Value, elem: F) -> Result<()>
where
    A: Archive + ?Sized,
    F: FnMut(&mut A, &mut Value) -> Result<()>,
{
    if ar.is_reading() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => seq(ar, items, elem),
        other => Err(mismatch("array", "array", other)),
    }
}

/// Count-prefixed sequence of arbitrary items.
///
/// The count is a 32-bit integer. Reading pushes items one at a time so a
/// corrupt count fails on the first out-of-bounds read rather than
/// allocating up front.
pub fn seq<A, T, F>(ar: &mut A, items: &mut Vec<T>, mut elem: F) -> Result<()>
where
    A: Archive + ?Sized,
    T: Default,
    F: FnMut(&mut A, &mut T) -> Result<()>,
{
    let offset = ar.position();
    let mut count = i32::try_from(items.len()).map_err(|_| Error::Parse {
        context: "array",
        message: format!("{} elements do not fit a 32-bit count", items.len()),
    })?;
    ar.i32(&mut count)?;

    if ar.is_reading() {
        let count = usize::try_from(count).map_err(|_| Error::NegativeCount { offset, count })?;
        items.clear();
        for _ in 0..count {
            let mut item = T::default();
            elem(ar, &mut item)?;
            items.push(item);
        }
    } else {
        for item in items.iter_mut() {
            elem(ar, item)?;
        }
    }
    Ok(())
}
