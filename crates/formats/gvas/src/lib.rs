//! Reader/writer for reflection-tagged property save files.
//!
//! Decodes a save blob into a value tree and encodes the tree back to the
//! identical bytes. Layered bottom-up:
//! - **Cursor** (`cursor`, `string`, `text`): little-endian primitives,
//!   length-prefixed strings and localizable text behind one [`Archive`]
//!   interface shared by reading and writing
//! - **Properties** (`tag`, `decode`, `encode`, `patch`): tagged property
//!   lists, the heuristics for ambiguous encodings, and size backpatching
//! - **Structs** (`registry`, `natives`, `schema`): native struct layouts
//!   and named top-level entry points
//!
//! ```no_run
//! # fn main() -> gvas::Result<()> {
//! let data = std::fs::read("Player.sav").expect("read save");
//! let registry = gvas::schema::registry()?;
//! let mut decoded = gvas::decode(&data, "File_Data_Player", &registry, Default::default())?;
//! let bytes = gvas::encode(&mut decoded.value, "File_Data_Player", &registry)?;
//! assert_eq!(bytes, data);
//! # Ok(())
//! # }
//! ```

pub mod cursor;
pub mod decode;
pub mod encode;
pub mod entry;
pub mod error;
pub mod natives;
pub mod options;
pub mod patch;
pub mod projection;
pub mod registry;
pub mod schema;
pub mod slot;
pub mod string;
pub mod tag;
pub mod text;
pub mod value;

pub use cursor::{Archive, Reader, Writer};
pub use decode::{Decoder, Fault, FaultKind};
pub use encode::Encoder;
pub use entry::{
    decode, decode_property_list, encode, encode_property_list, verify_round_trip, Decoded,
};
pub use error::{Error, Result};
pub use options::{DecodeOptions, ProjectionOptions};
pub use registry::{NativeFn, PropertyArchive, Registry};
pub use string::FString;
pub use tag::{Guid, PropertyKind, PropertyTag, PropertyType};
pub use text::{FormatArgument, Text, TextHistory};
pub use value::{MapEntry, MapValue, PropertyList, Record, SetValue, Value};
