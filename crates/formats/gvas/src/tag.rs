//! Property tags: the self-describing header in front of every value.
//!
//! Wire layout of a tag:
//!
//! ```text
//! name            fstring   ("None" terminates a property list, nothing follows)
//! type            fstring   e.g. "IntProperty"
//! size            i32       byte length of the value
//! array_index     i32       position within a static array
//! extras          per type  struct name + guid | bool byte | enum name | inner type(s)
//! has_guid        u8
//! guid            16 bytes  only if has_guid != 0
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

use crate::cursor::{Archive, Reader, Writer};
use crate::error::Result;
use crate::patch::SizeField;
use crate::string::FString;

/// Name of the sentinel tag ending a property list.
pub const TERMINATOR: &str = "None";

/// 128-bit identifier, stored as four little-endian `u32`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u32; 4]);

impl Guid {
    pub fn archive<A: Archive + ?Sized>(&mut self, ar: &mut A) -> Result<()> {
        for part in &mut self.0 {
            ar.u32(part)?;
        }
        Ok(())
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let mut guid = Guid::default();
        guid.archive(r)?;
        Ok(guid)
    }

    fn write(&self, w: &mut Writer) {
        for part in self.0 {
            w.write_u32(part);
        }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:08X}-{b:08X}-{c:08X}-{d:08X}")
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Property type, as named on the wire, without its type-specific extras.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Bool,
    Byte,
    Enum,
    Int8,
    Int16,
    UInt16,
    Int,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Name,
    Str,
    Text,
    Object,
    SoftObject,
    MulticastInlineDelegate,
    MulticastSparseDelegate,
    Struct,
    Array,
    Map,
    Set,
    /// Unrecognized type name, kept verbatim.
    Other(FString),
}

impl PropertyKind {
    pub fn from_name(name: &FString) -> Self {
        match name.as_str() {
            "BoolProperty" => PropertyKind::Bool,
            "ByteProperty" => PropertyKind::Byte,
            "EnumProperty" => PropertyKind::Enum,
            "Int8Property" => PropertyKind::Int8,
            "Int16Property" => PropertyKind::Int16,
            "UInt16Property" => PropertyKind::UInt16,
            "IntProperty" => PropertyKind::Int,
            "UInt32Property" => PropertyKind::UInt32,
            "Int64Property" => PropertyKind::Int64,
            "UInt64Property" => PropertyKind::UInt64,
            "FloatProperty" => PropertyKind::Float,
            "DoubleProperty" => PropertyKind::Double,
            "NameProperty" => PropertyKind::Name,
            "StrProperty" => PropertyKind::Str,
            "TextProperty" => PropertyKind::Text,
            "ObjectProperty" => PropertyKind::Object,
            "SoftObjectProperty" => PropertyKind::SoftObject,
            "MulticastInlineDelegateProperty" => PropertyKind::MulticastInlineDelegate,
            "MulticastSparseDelegateProperty" => PropertyKind::MulticastSparseDelegate,
            "StructProperty" => PropertyKind::Struct,
            "ArrayProperty" => PropertyKind::Array,
            "MapProperty" => PropertyKind::Map,
            "SetProperty" => PropertyKind::Set,
            _ => PropertyKind::Other(name.clone()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PropertyKind::Bool => "BoolProperty",
            PropertyKind::Byte => "ByteProperty",
            PropertyKind::Enum => "EnumProperty",
            PropertyKind::Int8 => "Int8Property",
            PropertyKind::Int16 => "Int16Property",
            PropertyKind::UInt16 => "UInt16Property",
            PropertyKind::Int => "IntProperty",
            PropertyKind::UInt32 => "UInt32Property",
            PropertyKind::Int64 => "Int64Property",
            PropertyKind::UInt64 => "UInt64Property",
            PropertyKind::Float => "FloatProperty",
            PropertyKind::Double => "DoubleProperty",
            PropertyKind::Name => "NameProperty",
            PropertyKind::Str => "StrProperty",
            PropertyKind::Text => "TextProperty",
            PropertyKind::Object => "ObjectProperty",
            PropertyKind::SoftObject => "SoftObjectProperty",
            PropertyKind::MulticastInlineDelegate => "MulticastInlineDelegateProperty",
            PropertyKind::MulticastSparseDelegate => "MulticastSparseDelegateProperty",
            PropertyKind::Struct => "StructProperty",
            PropertyKind::Array => "ArrayProperty",
            PropertyKind::Map => "MapProperty",
            PropertyKind::Set => "SetProperty",
            PropertyKind::Other(name) => name.as_str(),
        }
    }

    /// Name as written on the wire.
    fn wire_name(&self) -> FString {
        match self {
            PropertyKind::Other(name) => name.clone(),
            kind => FString::new(kind.name()),
        }
    }

    /// Element types whose elements all have the same encoded width.
    pub fn is_fixed_width(&self) -> bool {
        matches!(
            self,
            PropertyKind::Bool
                | PropertyKind::Byte
                | PropertyKind::Int8
                | PropertyKind::Int16
                | PropertyKind::UInt16
                | PropertyKind::Int
                | PropertyKind::UInt32
                | PropertyKind::Int64
                | PropertyKind::UInt64
                | PropertyKind::Float
                | PropertyKind::Double
        )
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PropertyKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Property type together with the extras its tag carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyType {
    /// Bool values live in the tag, not in the value stream.
    Bool(bool),
    /// `None` when the wire enum name is the literal "None".
    Byte(Option<FString>),
    Enum(Option<FString>),
    Int8,
    Int16,
    UInt16,
    Int,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Name,
    Str,
    Text,
    Object,
    SoftObject,
    MulticastInlineDelegate,
    MulticastSparseDelegate,
    Struct { name: FString, guid: Guid },
    Array(PropertyKind),
    Set(PropertyKind),
    Map(PropertyKind, PropertyKind),
    Other(FString),
}

impl PropertyType {
    /// Type for `kind` with empty extras.
    pub fn of(kind: &PropertyKind) -> Self {
        match kind {
            PropertyKind::Bool => PropertyType::Bool(false),
            PropertyKind::Byte => PropertyType::Byte(None),
            PropertyKind::Enum => PropertyType::Enum(None),
            PropertyKind::Int8 => PropertyType::Int8,
            PropertyKind::Int16 => PropertyType::Int16,
            PropertyKind::UInt16 => PropertyType::UInt16,
            PropertyKind::Int => PropertyType::Int,
            PropertyKind::UInt32 => PropertyType::UInt32,
            PropertyKind::Int64 => PropertyType::Int64,
            PropertyKind::UInt64 => PropertyType::UInt64,
            PropertyKind::Float => PropertyType::Float,
            PropertyKind::Double => PropertyType::Double,
            PropertyKind::Name => PropertyType::Name,
            PropertyKind::Str => PropertyType::Str,
            PropertyKind::Text => PropertyType::Text,
            PropertyKind::Object => PropertyType::Object,
            PropertyKind::SoftObject => PropertyType::SoftObject,
            PropertyKind::MulticastInlineDelegate => PropertyType::MulticastInlineDelegate,
            PropertyKind::MulticastSparseDelegate => PropertyType::MulticastSparseDelegate,
            PropertyKind::Struct => PropertyType::Struct {
                name: FString::Null,
                guid: Guid::default(),
            },
            PropertyKind::Array => PropertyType::Array(PropertyKind::Other(FString::Null)),
            PropertyKind::Set => PropertyType::Set(PropertyKind::Other(FString::Null)),
            PropertyKind::Map => PropertyType::Map(
                PropertyKind::Other(FString::Null),
                PropertyKind::Other(FString::Null),
            ),
            PropertyKind::Other(name) => PropertyType::Other(name.clone()),
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyType::Bool(_) => PropertyKind::Bool,
            PropertyType::Byte(_) => PropertyKind::Byte,
            PropertyType::Enum(_) => PropertyKind::Enum,
            PropertyType::Int8 => PropertyKind::Int8,
            PropertyType::Int16 => PropertyKind::Int16,
            PropertyType::UInt16 => PropertyKind::UInt16,
            PropertyType::Int => PropertyKind::Int,
            PropertyType::UInt32 => PropertyKind::UInt32,
            PropertyType::Int64 => PropertyKind::Int64,
            PropertyType::UInt64 => PropertyKind::UInt64,
            PropertyType::Float => PropertyKind::Float,
            PropertyType::Double => PropertyKind::Double,
            PropertyType::Name => PropertyKind::Name,
            PropertyType::Str => PropertyKind::Str,
            PropertyType::Text => PropertyKind::Text,
            PropertyType::Object => PropertyKind::Object,
            PropertyType::SoftObject => PropertyKind::SoftObject,
            PropertyType::MulticastInlineDelegate => PropertyKind::MulticastInlineDelegate,
            PropertyType::MulticastSparseDelegate => PropertyKind::MulticastSparseDelegate,
            PropertyType::Struct { .. } => PropertyKind::Struct,
            PropertyType::Array(_) => PropertyKind::Array,
            PropertyType::Set(_) => PropertyKind::Set,
            PropertyType::Map(..) => PropertyKind::Map,
            PropertyType::Other(name) => PropertyKind::Other(name.clone()),
        }
    }
}

/// Byte positions recorded while reading or writing a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagOffsets {
    /// First byte of the tag.
    pub start: usize,
    /// The tag's `size` field.
    pub size_field: usize,
    /// First byte of the value.
    pub value_start: usize,
    /// The captured bool byte of a bool tag.
    pub bool_value: Option<usize>,
    /// The has-guid byte.
    pub guid_flag: usize,
}

/// Role of a synthesized container element tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSlot {
    /// Element of an array holding `count` items.
    ArrayItem { count: i32 },
    MapKey,
    MapValue,
    SetItem,
}

impl ElementSlot {
    /// Bytes of container header preceding the elements.
    fn header(self) -> i32 {
        match self {
            ElementSlot::ArrayItem { .. } => 4,
            ElementSlot::MapKey | ElementSlot::MapValue | ElementSlot::SetItem => 8,
        }
    }

    /// Suffix of the field-scoped registry key for struct elements.
    pub fn struct_role(self) -> Option<&'static str> {
        match self {
            ElementSlot::ArrayItem { .. } => None,
            ElementSlot::MapKey => Some("KeyStructType"),
            ElementSlot::MapValue => Some("ValueStructType"),
            ElementSlot::SetItem => Some("InnerStructType"),
        }
    }
}

/// Metadata preceding a property value.
///
/// Tags are read-only during encoding: writing a tag returns fresh
/// [`TagOffsets`] instead of updating the recorded ones.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyTag {
    /// Property name. Static array elements past the first carry an
    /// `[index]` suffix and repeated names a `#n` suffix, so every tag has
    /// a distinct key in its [`PropertyList`].
    ///
    /// [`PropertyList`]: crate::value::PropertyList
    pub name: FString,
    /// `n` of the `#n` suffix; 0 for the first tag of a name.
    #[serde(skip_serializing_if = "is_first")]
    pub repeat: u32,
    #[serde(rename = "type")]
    pub ty: PropertyType,
    /// Declared value size. Recomputed on write.
    pub size: i32,
    pub array_index: i32,
    pub guid: Option<Guid>,
    /// Positions from the read that produced this tag.
    #[serde(skip)]
    pub offsets: TagOffsets,
    /// Shared element tag of a struct array.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<PropertyTag>>,
}

impl PartialEq for PropertyTag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.size == other.size
            && self.array_index == other.array_index
            && self.repeat == other.repeat
            && self.guid == other.guid
            && self.element == other.element
    }
}

impl PropertyTag {
    /// A tag for a newly introduced property.
    pub fn new(name: impl Into<FString>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            repeat: 0,
            ty,
            size: 0,
            array_index: 0,
            guid: None,
            offsets: TagOffsets::default(),
            element: None,
        }
    }

    pub fn kind(&self) -> PropertyKind {
        self.ty.kind()
    }

    /// Name without the repeat and static array suffixes.
    pub fn wire_name(&self) -> FString {
        let mut name = self.name.clone();
        if self.repeat > 0 {
            name = name.strip_repeat_suffix(self.repeat);
        }
        if self.array_index > 0 {
            name = name.strip_index_suffix();
        }
        name
    }

    /// Offset one past the declared end of the value.
    pub fn declared_end(&self) -> usize {
        self.offsets
            .value_start
            .saturating_add(usize::try_from(self.size).unwrap_or(0))
    }

    /// Read a tag. Returns `None` for the list terminator.
    pub fn read(r: &mut Reader<'_>) -> Result<Option<Self>> {
        let start = r.position();
        let mut name = FString::read(r)?;
        if name == TERMINATOR {
            return Ok(None);
        }

        let kind = PropertyKind::from_name(&FString::read(r)?);
        let size_field = r.position();
        let size = r.read_i32()?;
        let array_index = r.read_i32()?;
        if array_index > 0 {
            name = name.with_index_suffix(array_index);
        }

        let mut bool_value = None;
        let ty = match kind {
            PropertyKind::Struct => PropertyType::Struct {
                name: FString::read(r)?,
                guid: Guid::read(r)?,
            },
            PropertyKind::Bool => {
                bool_value = Some(r.position());
                PropertyType::Bool(r.read_u8()? != 0)
            }
            PropertyKind::Byte => PropertyType::Byte(read_enum_name(r)?),
            PropertyKind::Enum => PropertyType::Enum(read_enum_name(r)?),
            PropertyKind::Array => PropertyType::Array(read_kind(r)?),
            PropertyKind::Set => PropertyType::Set(read_kind(r)?),
            PropertyKind::Map => PropertyType::Map(read_kind(r)?, read_kind(r)?),
            other => PropertyType::of(&other),
        };

        let guid_flag = r.position();
        let guid = match r.read_u8()? {
            0 => None,
            _ => Some(Guid::read(r)?),
        };

        Ok(Some(Self {
            name,
            repeat: 0,
            ty,
            size,
            array_index,
            guid,
            offsets: TagOffsets {
                start,
                size_field,
                value_start: r.position(),
                bool_value,
                guid_flag,
            },
            element: None,
        }))
    }

    /// Write the tag with a placeholder size, returning where things landed.
    ///
    /// The caller patches the size once the value is written (see
    /// [`SizeField`]).
    pub fn write(&self, w: &mut Writer) -> Result<TagOffsets> {
        let start = w.position();
        self.wire_name().write(w)?;
        self.kind().wire_name().write(w)?;
        let size_field = SizeField::reserve(w).offset();
        w.write_i32(self.array_index);

        let mut bool_value = None;
        match &self.ty {
            PropertyType::Struct { name, guid } => {
                name.write(w)?;
                guid.write(w);
            }
            PropertyType::Bool(v) => {
                bool_value = Some(w.position());
                w.write_u8(u8::from(*v));
            }
            PropertyType::Byte(enum_name) | PropertyType::Enum(enum_name) => match enum_name {
                Some(name) => name.write(w)?,
                None => FString::new(TERMINATOR).write(w)?,
            },
            PropertyType::Array(inner) | PropertyType::Set(inner) => inner.wire_name().write(w)?,
            PropertyType::Map(key, value) => {
                key.wire_name().write(w)?;
                value.wire_name().write(w)?;
            }
            _ => {}
        }

        let guid_flag = w.position();
        match &self.guid {
            Some(guid) => {
                w.write_u8(1);
                guid.write(w);
            }
            None => w.write_u8(0),
        }

        Ok(TagOffsets {
            start,
            size_field,
            value_start: w.position(),
            bool_value,
            guid_flag,
        })
    }

    pub fn write_terminator(w: &mut Writer) -> Result<()> {
        FString::new(TERMINATOR).write(w)
    }

    /// Synthesize the tag used to decode and encode container elements of
    /// type `kind`, which the wire format does not tag individually.
    ///
    /// Bool array items are single bytes and bool map or set elements are
    /// 32-bit ints. Struct map and set elements are named
    /// `<property>:<role>` so the registry can resolve them per field.
    pub fn element(&self, kind: &PropertyKind, slot: ElementSlot) -> PropertyTag {
        let header = slot.header();
        let mut size = self.size.saturating_sub(header);

        let ty = match (kind, slot) {
            (PropertyKind::Bool, ElementSlot::ArrayItem { .. }) => PropertyType::Byte(None),
            (PropertyKind::Bool, _) => PropertyType::Int,
            (PropertyKind::Struct, _) => {
                let name = match slot.struct_role() {
                    Some(role) => FString::new(format!("{}:{role}", self.wire_name())),
                    None => FString::Null,
                };
                PropertyType::Struct {
                    name,
                    guid: Guid::default(),
                }
            }
            (kind, _) => PropertyType::of(kind),
        };

        if let ElementSlot::ArrayItem { count } = slot {
            if count > 0 && kind.is_fixed_width() {
                size /= count;
            }
        }

        let value_start = self.offsets.value_start + header.max(0) as usize;
        PropertyTag {
            name: self.name.clone(),
            repeat: 0,
            ty,
            size,
            array_index: 0,
            guid: None,
            offsets: TagOffsets {
                value_start,
                ..TagOffsets::default()
            },
            element: None,
        }
    }
}

fn is_first(repeat: &u32) -> bool {
    *repeat == 0
}

fn read_enum_name(r: &mut Reader<'_>) -> Result<Option<FString>> {
    let name = FString::read(r)?;
    Ok((name != TERMINATOR).then_some(name))
}

fn read_kind(r: &mut Reader<'_>) -> Result<PropertyKind> {
    Ok(PropertyKind::from_name(&FString::read(r)?))
}
