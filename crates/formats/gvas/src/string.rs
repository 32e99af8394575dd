use std::fmt;

use serde::{Serialize, Serializer};

use crate::cursor::{Reader, Writer};
use crate::error::{Error, Result};

/// A length-prefixed string as stored on the wire.
///
/// The length is a signed 32-bit count. Non-negative lengths prefix
/// single-byte (Latin-1) text, negative lengths prefix UTF-16LE code units;
/// both include a null terminator. The variant records which encoding was
/// read so unmodified strings re-encode byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FString {
    /// Length 0, no bytes.
    #[default]
    Null,
    /// Length 1 followed by a lone null byte. Distinct from [`FString::Null`]
    /// even though both read as "".
    Empty,
    /// Single-byte text.
    Narrow(String),
    /// UTF-16 text.
    Wide(String),
}

impl FString {
    /// Build a string, picking the narrowest encoding that can hold it.
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            FString::Null
        } else if is_latin1(&s) {
            FString::Narrow(s)
        } else {
            FString::Wide(s)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FString::Null | FString::Empty => "",
            FString::Narrow(s) | FString::Wide(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Same encoding, different text.
    fn map(&self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            FString::Wide(s) => FString::Wide(f(s)),
            other => FString::new(f(other.as_str())),
        }
    }

    /// Append the `[index]` suffix used to tell static array elements apart.
    pub fn with_index_suffix(&self, index: i32) -> Self {
        self.map(|s| format!("{s}[{index}]"))
    }

    /// Remove a trailing `[digits]` suffix, if any.
    pub fn strip_index_suffix(&self) -> Self {
        let s = self.as_str();
        match index_suffix_start(s) {
            Some(at) => self.map(|s| s[..at].to_string()),
            None => self.clone(),
        }
    }

    /// Append the `#n` suffix used to tell repeated names apart.
    pub fn with_repeat_suffix(&self, n: u32) -> Self {
        self.map(|s| format!("{s}#{n}"))
    }

    /// Remove a trailing `#n` suffix, if present.
    pub fn strip_repeat_suffix(&self, n: u32) -> Self {
        let suffix = format!("#{n}");
        match self.as_str().strip_suffix(suffix.as_str()) {
            Some(base) => {
                let len = base.len();
                self.map(|s| s[..len].to_string())
            }
            None => self.clone(),
        }
    }

    /// Decode a string at the reader's position.
    pub fn read(r: &mut Reader<'_>) -> Result<Self> {
        let offset = r.position();
        let len = r.read_i32()?;
        if len >= 0 {
            let len = len as usize;
            if len == 0 {
                return Ok(FString::Null);
            }
            let bytes = r.read_bytes(len)?;
            if len == 1 {
                return Ok(FString::Empty);
            }
            // Drop the null terminator.
            let text = bytes[..len - 1].iter().map(|&b| b as char).collect();
            Ok(FString::Narrow(text))
        } else {
            let units = len.unsigned_abs() as usize;
            let bytes = r.read_bytes(units * 2)?;
            let code: Vec<u16> = bytes
                .chunks_exact(2)
                .take(units - 1)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&code)
                .map(FString::Wide)
                .map_err(|source| Error::InvalidString { offset, source })
        }
    }

    /// Encode at the writer's position.
    ///
    /// Narrow strings holding characters outside Latin-1 are written as UTF-16.
    pub fn write(&self, w: &mut Writer) -> Result<()> {
        match self {
            FString::Null => w.write_i32(0),
            FString::Empty => {
                w.write_i32(1);
                w.write_u8(0);
            }
            FString::Narrow(s) if s.is_empty() => w.write_i32(0),
            FString::Narrow(s) if is_latin1(s) => {
                w.write_i32(length_prefix(s.chars().count() + 1)?);
                for c in s.chars() {
                    w.write_u8(c as u8);
                }
                w.write_u8(0);
            }
            FString::Narrow(s) | FString::Wide(s) => {
                let units: Vec<u16> = s.encode_utf16().collect();
                w.write_i32(-length_prefix(units.len() + 1)?);
                for unit in units {
                    w.write_u16(unit);
                }
                w.write_u16(0);
            }
        }
        Ok(())
    }
}

fn is_latin1(s: &str) -> bool {
    s.chars().all(|c| (c as u32) < 0x100)
}

fn length_prefix(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::Parse {
        context: "string",
        message: format!("{len} characters do not fit a 32-bit length"),
    })
}

fn index_suffix_start(s: &str) -> Option<usize> {
    let body = s.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let digits = &body[open + 1..];
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(open)
}

impl fmt::Display for FString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FString {
    fn from(s: &str) -> Self {
        FString::new(s)
    }
}

impl From<String> for FString {
    fn from(s: String) -> Self {
        FString::new(s)
    }
}

impl PartialEq<str> for FString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for FString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Serialize for FString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
