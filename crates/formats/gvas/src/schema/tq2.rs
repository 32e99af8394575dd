//! Native structs of Titan Quest II saves.

use crate::error::{Error, Result};
use crate::natives;
use crate::registry::{NativeFn, PropertyArchive};
use crate::slot;
use crate::value::Value;

/// True when the flag field just serialized into `v` is non-zero.
fn flag(v: Option<&Value>) -> bool {
    v.and_then(Value::as_i64).is_some_and(|n| n != 0)
}

/// Object name, class and a size-prefixed top-level property list.
pub fn save_game_data(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::name(ar, rec.field_mut("Name"))?;
    slot::name(ar, rec.field_mut("Class"))?;

    let size_at = ar.position();
    let mut size = 0i32;
    ar.i32(&mut size)?;
    ar.property_list(rec.field_mut("Data"), true)?;
    ar.patch_size(size_at, size_at + 4)
}

pub fn fog_of_war_packed_data(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::array(ar, rec.field_mut("CompressedData"), slot::u8)?;
    slot::i32(ar, rec.field_mut("TextureSize"))?;
    slot::u8(ar, rec.field_mut("Unknown"))
}

/// Either up to two property lists or, with neither, an appearance path.
pub fn appearance_handle(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::i32(ar, rec.field_mut("DataSize"))?;

    slot::i32(ar, rec.field_mut("bHasData1"))?;
    let has_data1 = flag(rec.get("bHasData1"));
    if has_data1 {
        ar.property_list(rec.field_mut("Data1"), true)?;
    }

    slot::i32(ar, rec.field_mut("bHasData2"))?;
    let has_data2 = flag(rec.get("bHasData2"));
    if has_data2 {
        ar.property_list(rec.field_mut("Data2"), true)?;
    }

    if !has_data1 && !has_data2 {
        slot::string(ar, rec.field_mut("pAppearance"))?;
    }
    Ok(())
}

pub fn item_instance_handle(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    natives::soft_object_path(ar, rec.field_mut("ObjectPath"))?;
    slot::i32(ar, rec.field_mut("bHasData"))?;
    if flag(rec.get("bHasData")) {
        ar.property_list(rec.field_mut("Data"), true)?;
    }
    Ok(())
}

/// Instanced object pointer: class name, then name and properties unless
/// the class is "None".
pub fn instanced_ptr(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::i32(ar, rec.field_mut("Unknown"))?;
    slot::name(ar, rec.field_mut("Class"))?;
    if rec.get("Class").and_then(Value::as_str) != Some("None") {
        slot::name(ar, rec.field_mut("Name"))?;
        ar.property_list(rec.field_mut("Data"), true)?;
    }
    Ok(())
}

/// Dialogue variable: a type byte selecting an int, int64 or string value.
pub fn dialogue_variable_value(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::u8(ar, rec.field_mut("Type"))?;
    match rec.get("Type").and_then(Value::as_i64) {
        Some(0) => slot::i32(ar, rec.field_mut("Value")),
        Some(1) => slot::i64(ar, rec.field_mut("Value")),
        Some(3) => slot::string(ar, rec.field_mut("Value")),
        _ => Ok(()),
    }
}

/// Array of untyped property lists.
pub fn preferences_by_target(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::array(ar, v, |ar, item| ar.property_list(item, false))
}

fn setting_f32(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::f32(ar, v)
}

fn setting_u8(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::u8(ar, v)
}

fn setting_i32(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::i32(ar, v)
}

fn setting_name(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    slot::name(ar, v)
}

/// Known game settings and their encodings. Settings are stored by name
/// without a type, so an unlisted name cannot be decoded.
const SETTINGS: &[(&str, NativeFn)] = &[
    ("m_StickDeadZone", setting_f32),
    ("m_HasShownFirstTimeSettingsPrompt", setting_u8),
    ("m_CursorScale", setting_f32),
    ("m_ItemColorScheme", setting_name),
    ("m_AlwaysShowStatsOnOrbs", setting_u8),
    ("m_ShowReservationOnOrbs", setting_u8),
    ("m_OverheadVisibilityPreferences", preferences_by_target),
    ("m_ColorBlindMode", setting_name),
    ("m_ColorBlindStrength", setting_i32),
    ("m_EnableTutorials", setting_u8),
    ("m_EnableFailedAbilityFeedback", setting_u8),
    ("m_HideHelmet", setting_u8),
    ("m_EnableAutoEquip", setting_u8),
    ("m_AllowQuickDialogueSkipping", setting_u8),
    ("m_FCTShowDamage", setting_u8),
    ("m_FCTShowHeal", setting_u8),
    ("m_FCTShowImmune", setting_u8),
    ("m_FCTShowXP", setting_u8),
    ("m_LootPlateVisibility", setting_name),
    ("m_LootPlateVisibleInCombat", setting_u8),
    ("m_LootPlateInteractability", setting_name),
    ("m_LootPlateInteractableInCombat", setting_u8),
    ("m_LootTooltipVisibility", setting_name),
    ("m_LootTooltipVisibleInCombat", setting_u8),
    ("m_TelemetryConsent", setting_name),
    ("m_CurrentInputPreset", setting_name),
    ("m_InputBehaviorLMB", setting_name),
    ("m_KeepTargetForRepeatedCasts", setting_u8),
    ("m_UseFreeAimForStationaryCasts", setting_u8),
];

fn setting(name: &str) -> Result<NativeFn> {
    SETTINGS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, f)| *f)
        .ok_or_else(|| Error::Parse {
            context: "settings section",
            message: format!("unknown setting {name}"),
        })
}

/// One setting: its name, then a value whose encoding the name selects.
fn setting_entry(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::name(ar, rec.field_mut("Name"))?;
    let name = rec.get("Name").and_then(Value::as_str).unwrap_or_default();
    let f = setting(name)?;
    f(ar, rec.field_mut("Value"))
}

/// Named group of settings. The count is taken from `Properties` when
/// writing, and each setting keeps the name string as read.
pub fn settings_section(ar: &mut dyn PropertyArchive, v: &mut Value) -> Result<()> {
    let rec = slot::record(ar, v)?;
    slot::string(ar, rec.field_mut("Name"))?;
    slot::array(ar, rec.field_mut("Properties"), |ar, item| setting_entry(ar, item))
}
