//! Save-file layouts of Titan Quest II, built on the core codec.
//!
//! Every save file is a header followed by a top-level property list; the
//! shared settings file appends settings sections. The game's native
//! structs and the element types of a few known map and set fields are
//! registered here.

pub mod header;
pub mod tq2;

use crate::error::Result;
use crate::registry::{PropertyArchive, Registry};
use crate::slot;
use crate::value::Value;

/// Entry points whose files are a header and one property list.
pub const PROPERTY_FILES: &[&str] = &[
    "File_Data_Player",
    "File_Data_PlayerLocal",
    "File_Data_WorldCampaign",
    "File_Data_WorldFluff",
    "File_Header",
    "File_PublicCrossCharacterSaveData",
];

pub const SHARED_GAME_SETTINGS: &str = "File_SharedGameSettings";

/// Core registry plus the game's structs and entry points.
pub fn registry() -> Result<Registry> {
    let mut registry = Registry::with_core();
    register(&mut registry)?;
    Ok(registry)
}

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register_native("SaveGameData", tq2::save_game_data)?;
    registry.register_native("TQ2FogOfWarPackedData", tq2::fog_of_war_packed_data)?;
    registry.register_native("GrimAppearanceHandle", tq2::appearance_handle)?;
    registry.register_native("GrimItemInstanceHandle", tq2::item_instance_handle)?;
    registry.register_native("GrimPtr_IntClassNameProps", tq2::instanced_ptr)?;
    registry.register_native("GrimDialogueVariableValue", tq2::dialogue_variable_value)?;

    for ptr in [
        "GrimInstancedAppearancePtr",
        "GrimArchetypeInstancedBaseMeshEntrySelectorPtr",
        "GrimArchetypeInstancedMaterialOverrideSelectorPtr",
        "GrimDialogueVariablesSaveStatePtr",
    ] {
        registry.register_alias(ptr, "GrimPtr_IntClassNameProps")?;
    }
    for path in [
        "TQ2MasteryDescriptionPtr",
        "GrimItemDescriptionPtr",
        "TQ2MasteryDescriptionSoftPtr",
    ] {
        registry.register_alias(path, "SoftObjectPath")?;
    }

    // Struct elements of containers are untyped on the wire.
    registry.register_alias("m_EquippedAppearances:ValueStructType", "GrimAppearanceHandle")?;
    registry.register_alias("m_VisitedTorches:InnerStructType", "Guid")?;
    registry.register_alias("m_CollectedItems:InnerStructType", "SoftObjectPath")?;
    registry.register_alias("m_VariableValues:ValueStructType", "GrimDialogueVariableValue")?;

    for name in PROPERTY_FILES {
        registry.register_entry_point(*name, property_file)?;
    }
    registry.register_entry_point(SHARED_GAME_SETTINGS, shared_game_settings)?;
    Ok(())
}

fn property_file(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    header::save_game_header(ar, rec.field_mut("Header"))?;
    ar.property_list(rec.field_mut("Data"), true)
}

fn shared_game_settings(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    header::save_game_header(ar, rec.field_mut("Header"))?;
    ar.property_list(rec.field_mut("Data"), true)?;
    slot::array(ar, rec.field_mut("Sections"), |ar, section| {
        tq2::settings_section(ar, section)
    })
}
