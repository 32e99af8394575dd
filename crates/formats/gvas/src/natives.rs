//! Native serializers for the engine's built-in fixed-layout structs.

use crate::error::Result;
use crate::registry::{PropertyArchive, Registry};
use crate::slot;
use crate::value::Value;

pub(crate) fn register_core(registry: &mut Registry) {
    registry.insert_native("Guid", guid);
    registry.insert_native("LinearColor", linear_color);
    registry.insert_native("IntPoint", int_point);
    registry.insert_native("SoftObjectPath", soft_object_path);
    registry.insert_native("GameplayTagContainer", gameplay_tag_container);

    // Primitive encodings that wrapper structs alias onto.
    registry.insert_native("Name", name);
    registry.insert_native("Int64", int64);
    registry.insert_alias("GameplayTag", "Name");
    registry.insert_alias("DateTime", "Int64");
}

pub fn name(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::name(ar, v)
}

pub fn int64(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::i64(ar, v)
}

pub fn guid(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::guid(ar, v)
}

pub fn linear_color(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    for channel in ["R", "G", "B", "A"] {
        slot::f32(ar, rec.field_mut(channel))?;
    }
    Ok(())
}

pub fn int_point(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::i32(ar, rec.field_mut("X"))?;
    slot::i32(ar, rec.field_mut("Y"))
}

/// Deferred asset reference: package, asset name and sub-object path.
pub fn soft_object_path(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::string(ar, rec.field_mut("PackageName"))?;
    slot::name(ar, rec.field_mut("AssetName"))?;
    slot::string(ar, rec.field_mut("SubPathString"))
}

pub fn gameplay_tag_container(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::array(ar, v, slot::name)
}

/// Bound object and function of a script delegate.
pub fn script_delegate(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::name(ar, rec.field_mut("Object"))?;
    slot::name(ar, rec.field_mut("FunctionName"))
}

/// Invocation list of a multicast delegate property.
pub fn multicast_delegate(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::array(ar, v, |ar, item| script_delegate(ar, item))
}
