//! Top-level decode and encode of a whole save file.

use tracing::debug;

use crate::decode::{Decoder, Fault};
use crate::encode::Encoder;
use crate::error::{Error, Result};
use crate::options::DecodeOptions;
use crate::registry::Registry;
use crate::value::{PropertyList, Value};

/// Result of a decode that ran to completion.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub value: Value,
    /// Faults recovered along the way. Empty for a clean decode.
    pub faults: Vec<Fault>,
}

impl Decoded {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Decode `data` as the top-level structure registered under `entry`.
///
/// The structure must consume the whole buffer.
pub fn decode(
    data: &[u8],
    entry: &str,
    registry: &Registry,
    options: DecodeOptions,
) -> Result<Decoded> {
    let f = registry
        .entry_point(entry)
        .ok_or_else(|| Error::UnknownEntryPoint {
            name: entry.to_string(),
        })?;

    let mut decoder = Decoder::new(data, registry, options);
    let mut value = Value::None;
    f(&mut decoder, &mut value)?;
    finish(decoder, value)
}

/// Encode `value` as the top-level structure registered under `entry`.
///
/// The tree is borrowed mutably because natives share one body for both
/// directions; it is left unchanged.
pub fn encode(value: &mut Value, entry: &str, registry: &Registry) -> Result<Vec<u8>> {
    let f = registry
        .entry_point(entry)
        .ok_or_else(|| Error::UnknownEntryPoint {
            name: entry.to_string(),
        })?;

    let mut encoder = Encoder::new(registry);
    f(&mut encoder, value)?;
    Ok(encoder.into_bytes())
}

/// Decode a bare top-level property list (with its trailing four bytes).
pub fn decode_property_list(
    data: &[u8],
    registry: &Registry,
    options: DecodeOptions,
) -> Result<Decoded> {
    let mut decoder = Decoder::new(data, registry, options);
    let list = decoder.read_property_list(true)?;
    finish(decoder, Value::Struct(list))
}

pub fn encode_property_list(list: &mut PropertyList, registry: &Registry) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(registry);
    encoder.write_property_list(list, true)?;
    Ok(encoder.into_bytes())
}

/// Whether re-encoding a clean decode of `data` reproduces it exactly.
pub fn verify_round_trip(data: &[u8], entry: &str, registry: &Registry) -> Result<bool> {
    let mut decoded = decode(data, entry, registry, DecodeOptions::default())?;
    let encoded = encode(&mut decoded.value, entry, registry)?;
    Ok(encoded == data)
}

fn finish(decoder: Decoder<'_>, value: Value) -> Result<Decoded> {
    if !decoder.is_eof() {
        return Err(Error::TrailingData {
            offset: decoder.position(),
            remaining: decoder.remaining(),
        });
    }
    let faults = decoder.into_faults();
    debug!(faults = faults.len(), "decode finished");
    Ok(Decoded { value, faults })
}
