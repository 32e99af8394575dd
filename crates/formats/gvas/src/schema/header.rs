//! Save-game header preceding the top-level property list.

use crate::error::Result;
use crate::registry::PropertyArchive;
use crate::slot;
use crate::value::Value;

pub fn save_game_header(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::i32(ar, rec.field_mut("FileTypeTag"))?;
    slot::i32(ar, rec.field_mut("SaveGameFileVersion"))?;
    package_file_version(ar, rec.field_mut("PackageFileUEVersion"))?;
    engine_version(ar, rec.field_mut("SavedEngineVersion"))?;
    slot::i32(ar, rec.field_mut("CustomVersionFormat"))?;
    slot::array(ar, rec.field_mut("CustomVersions"), |ar, item| custom_version(ar, item))?;
    slot::string(ar, rec.field_mut("SaveGameClassName"))
}

fn package_file_version(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::i32(ar, rec.field_mut("FileVersionUE4"))?;
    slot::i32(ar, rec.field_mut("FileVersionUE5"))
}

fn engine_version(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::u16(ar, rec.field_mut("Major"))?;
    slot::u16(ar, rec.field_mut("Minor"))?;
    slot::u16(ar, rec.field_mut("Patch"))?;
    slot::u32(ar, rec.field_mut("Changelist"))?;
    slot::string(ar, rec.field_mut("Branch"))
}

fn custom_version(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::guid(ar, rec.field_mut("Key"))?;
    slot::i32(ar, rec.field_mut("Version"))
}
