use serde::Serialize;

use crate::cursor::Archive;
use crate::error::{Error, Result};
use crate::slot::seq;
use crate::string::FString;

/// Size of the opaque number-formatting options blob.
const FORMAT_OPTIONS_LEN: usize = 25;

/// Localizable text, stored together with the history it was built from.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Text {
    pub flags: u32,
    pub history: TextHistory,
}

/// How a [`Text`] was constructed. The wire discriminant is an `i8`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TextHistory {
    /// -1: culture-invariant, optionally carrying a literal.
    None { culture_invariant: Option<FString> },
    /// 0: localized string table lookup with a source fallback.
    Base {
        namespace: FString,
        key: FString,
        source: FString,
    },
    /// 1: format pattern with named arguments.
    NamedFormat {
        format: Box<Text>,
        arguments: Vec<(FString, FormatArgument)>,
    },
    /// 2: format pattern with positional arguments.
    OrderedFormat {
        format: Box<Text>,
        arguments: Vec<FormatArgument>,
    },
    /// 4: number rendered as text.
    AsNumber {
        source: FormatArgument,
        format_options: Option<Vec<u8>>,
        culture_name: FString,
    },
    /// 11: entry of a named string table.
    StringTableEntry { table_id: FString, key: FString },
}

impl Default for TextHistory {
    fn default() -> Self {
        TextHistory::None {
            culture_invariant: None,
        }
    }
}

impl TextHistory {
    pub fn kind(&self) -> i8 {
        match self {
            TextHistory::None { .. } => -1,
            TextHistory::Base { .. } => 0,
            TextHistory::NamedFormat { .. } => 1,
            TextHistory::OrderedFormat { .. } => 2,
            TextHistory::AsNumber { .. } => 4,
            TextHistory::StringTableEntry { .. } => 11,
        }
    }

    /// Default-filled history for a wire discriminant.
    fn from_kind(kind: i8) -> Option<Self> {
        Some(match kind {
            -1 => TextHistory::default(),
            0 => TextHistory::Base {
                namespace: FString::Null,
                key: FString::Null,
                source: FString::Null,
            },
            1 => TextHistory::NamedFormat {
                format: Box::default(),
                arguments: Vec::new(),
            },
            2 => TextHistory::OrderedFormat {
                format: Box::default(),
                arguments: Vec::new(),
            },
            4 => TextHistory::AsNumber {
                source: FormatArgument::default(),
                format_options: None,
                culture_name: FString::Null,
            },
            11 => TextHistory::StringTableEntry {
                table_id: FString::Null,
                key: FString::Null,
            },
            _ => return None,
        })
    }
}

/// Argument value of a formatted text. The wire discriminant is an `i8`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormatArgument {
    Int(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    Text(Box<Text>),
}

impl Default for FormatArgument {
    fn default() -> Self {
        FormatArgument::Int(0)
    }
}

impl FormatArgument {
    pub fn kind(&self) -> i8 {
        match self {
            FormatArgument::Int(_) => 0,
            FormatArgument::UInt(_) => 1,
            FormatArgument::Float(_) => 2,
            FormatArgument::Double(_) => 3,
            FormatArgument::Text(_) => 4,
        }
    }

    pub fn archive<A: Archive + ?Sized>(&mut self, ar: &mut A) -> Result<()> {
        let offset = ar.position();
        let mut kind = self.kind();
        ar.i8(&mut kind)?;
        if ar.is_reading() {
            *self = match kind {
                0 => FormatArgument::Int(0),
                1 => FormatArgument::UInt(0),
                2 => FormatArgument::Float(0.0),
                3 => FormatArgument::Double(0.0),
                4 => FormatArgument::Text(Box::default()),
                _ => return Err(Error::UnknownFormatArgument { offset, kind }),
            };
        }
        match self {
            FormatArgument::Int(v) => ar.i64(v),
            FormatArgument::UInt(v) => ar.u64(v),
            FormatArgument::Float(v) => ar.f32(v),
            FormatArgument::Double(v) => ar.f64(v),
            FormatArgument::Text(text) => text.archive(ar),
        }
    }
}

/// Optional field preceded by a 32-bit presence flag.
fn optional<A, T, F>(ar: &mut A, v: &mut Option<T>, f: F) -> Result<()>
where
    A: Archive + ?Sized,
    T: Default,
    F: FnOnce(&mut A, &mut T) -> Result<()>,
{
    let offset = ar.position();
    let mut present = u32::from(v.is_some());
    ar.u32(&mut present)?;
    if ar.is_reading() {
        if present > 1 {
            return Err(Error::Parse {
                context: "text",
                message: format!("presence flag {present} at {offset:#x} is neither 0 nor 1"),
            });
        }
        *v = (present == 1).then(T::default);
    }
    match v {
        Some(inner) => f(ar, inner),
        None => Ok(()),
    }
}

impl Text {
    /// A culture-invariant literal.
    pub fn literal(s: impl Into<FString>) -> Self {
        Text {
            flags: 0,
            history: TextHistory::None {
                culture_invariant: Some(s.into()),
            },
        }
    }

    pub fn archive<A: Archive + ?Sized>(&mut self, ar: &mut A) -> Result<()> {
        ar.u32(&mut self.flags)?;

        let offset = ar.position();
        let mut kind = self.history.kind();
        ar.i8(&mut kind)?;
        if ar.is_reading() {
            self.history = TextHistory::from_kind(kind)
                .ok_or(Error::UnknownTextHistory { offset, kind })?;
        }

        match &mut self.history {
            TextHistory::None { culture_invariant } => {
                optional(ar, culture_invariant, |ar, s| ar.fstring(s))
            }
            TextHistory::Base {
                namespace,
                key,
                source,
            } => {
                ar.fstring(namespace)?;
                ar.fstring(key)?;
                ar.fstring(source)
            }
            TextHistory::NamedFormat { format, arguments } => {
                format.archive(ar)?;
                seq(ar, arguments, |ar, (name, arg)| {
                    ar.fstring(name)?;
                    arg.archive(ar)
                })
            }
            TextHistory::OrderedFormat { format, arguments } => {
                format.archive(ar)?;
                seq(ar, arguments, |ar, arg| arg.archive(ar))
            }
            TextHistory::AsNumber {
                source,
                format_options,
                culture_name,
            } => {
                source.archive(ar)?;
                optional(ar, format_options, |ar, blob| {
                    ar.bytes(blob, FORMAT_OPTIONS_LEN)
                })?;
                ar.fstring(culture_name)
            }
            TextHistory::StringTableEntry { table_id, key } => {
                ar.fstring(table_id)?;
                ar.fstring(key)
            }
        }
    }
}
