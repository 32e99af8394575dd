//! Decode hand-built save bytes and check the encoder reproduces them.

use gvas::{
    decode, decode_property_list, encode, encode_property_list, verify_round_trip, DecodeOptions,
    Error, FString, FaultKind, Guid, PropertyList, PropertyType, Registry, Value,
};

/// Byte builder for the wire format.
#[derive(Default)]
struct Bytes(Vec<u8>);

impl Bytes {
    fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn str(self, s: &str) -> Self {
        self.i32(s.len() as i32 + 1).raw(s.as_bytes()).raw(&[0])
    }

    /// Tag through the has-guid byte. `extras` are the type-specific fields.
    fn tag(self, name: &str, ty: &str, size: usize, index: i32, extras: Bytes) -> Self {
        self.str(name)
            .str(ty)
            .i32(size as i32)
            .i32(index)
            .raw(&extras.0)
            .raw(&[0])
    }

    fn prop(self, name: &str, ty: &str, extras: Bytes, value: Bytes) -> Self {
        let size = value.0.len();
        self.tag(name, ty, size, 0, extras).raw(&value.0)
    }

    fn end(self) -> Self {
        self.str("None")
    }

    fn top(self) -> Vec<u8> {
        self.end().i32(0).0
    }
}

fn b() -> Bytes {
    Bytes::default()
}

fn struct_extras(name: &str) -> Bytes {
    b().str(name).raw(&[0; 16])
}

fn registry() -> Registry {
    Registry::with_core()
}

fn decode_list(data: &[u8]) -> (PropertyList, Vec<gvas::Fault>) {
    let decoded = decode_property_list(data, &registry(), DecodeOptions::default()).unwrap();
    match decoded.value {
        Value::Struct(list) => (list, decoded.faults),
        other => panic!("expected a property list, got {}", other.kind_name()),
    }
}

fn assert_reencodes(data: &[u8]) -> PropertyList {
    let (mut list, faults) = decode_list(data);
    let encoded = encode_property_list(&mut list, &registry()).unwrap();
    assert_eq!(encoded, data, "re-encode differs; faults: {faults:?}");
    list
}

#[test]
fn scalars_and_strings() {
    let data = b()
        .prop("Level", "IntProperty", b(), b().i32(7))
        .prop("Speed", "FloatProperty", b(), b().f32(1.5))
        .prop("Hero", "StrProperty", b(), b().str("Bob"))
        .prop("Zone", "NameProperty", b(), b().str("Delta"))
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(list.len(), 4);
    assert_eq!(list.get("Level"), Some(&Value::Int(7)));
    assert_eq!(list.get("Speed"), Some(&Value::Float(1.5)));
    assert_eq!(list.get("Hero").and_then(Value::as_str), Some("Bob"));
    assert_eq!(list.get("Zone"), Some(&Value::Name("Delta".into())));
    assert_eq!(list.trailer, Some(0));
    let names: Vec<_> = list.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Level", "Speed", "Hero", "Zone"]);
}

#[test]
fn bool_lives_in_tag() {
    let data = b()
        .tag("bAlive", "BoolProperty", 0, 0, b().raw(&[1]))
        .tag("bDead", "BoolProperty", 0, 0, b().raw(&[0]))
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(list.get("bAlive"), Some(&Value::Bool(true)));
    assert_eq!(list.get("bDead"), Some(&Value::Bool(false)));
}

#[test]
fn edited_bool_is_written_into_tag() {
    let data = b().tag("bAlive", "BoolProperty", 0, 0, b().raw(&[1])).top();
    let (mut list, _) = decode_list(&data);
    *list.get_mut("bAlive").unwrap() = Value::Bool(false);

    let encoded = encode_property_list(&mut list, &registry()).unwrap();
    let expected = b().tag("bAlive", "BoolProperty", 0, 0, b().raw(&[0])).top();
    assert_eq!(encoded, expected);
}

#[test]
fn nested_generic_struct() {
    let inner = b()
        .prop("X", "IntProperty", b(), b().i32(1))
        .prop("Label", "StrProperty", b(), b().str("hi"))
        .end();
    let data = b()
        .prop("Stats", "StructProperty", struct_extras("CharacterStats"), inner)
        .top();

    let list = assert_reencodes(&data);
    let stats = list.get("Stats").and_then(Value::as_struct).unwrap();
    assert_eq!(stats.get("X"), Some(&Value::Int(1)));
    assert_eq!(stats.trailer, None);
    assert!(matches!(
        &list.tag("Stats").unwrap().ty,
        PropertyType::Struct { name, .. } if name == "CharacterStats"
    ));
}

#[test]
fn native_structs_resolve_through_registry() {
    let data = b()
        .prop(
            "Id",
            "StructProperty",
            struct_extras("Guid"),
            b().u32(1).u32(2).u32(3).u32(4),
        )
        .prop(
            "Tint",
            "StructProperty",
            struct_extras("LinearColor"),
            b().f32(1.0).f32(0.5).f32(0.25).f32(1.0),
        )
        .prop(
            "Tags",
            "StructProperty",
            struct_extras("GameplayTagContainer"),
            b().i32(2).str("Ability.Fire").str("Ability.Ice"),
        )
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(list.get("Id"), Some(&Value::Guid(Guid([1, 2, 3, 4]))));
    let tint = list.get("Tint").and_then(Value::as_record).unwrap();
    assert_eq!(tint.get("G"), Some(&Value::Float(0.5)));
    assert_eq!(
        list.get("Tags"),
        Some(&Value::Array(vec![
            Value::Name("Ability.Fire".into()),
            Value::Name("Ability.Ice".into()),
        ]))
    );
}

#[test]
fn unregistered_native_struct_falls_back_to_bytes() {
    let data = b()
        .prop(
            "Location",
            "StructProperty",
            struct_extras("Vector"),
            b().f32(1.0).f32(2.0).f32(3.0),
        )
        .prop("After", "IntProperty", b(), b().i32(9))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert!(matches!(list.get("Location"), Some(Value::Bytes(raw)) if raw.len() == 12));
    assert_eq!(list.get("After"), Some(&Value::Int(9)));
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::OpaqueFallback);
    assert_eq!(faults[0].property, "Location");
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn int_array() {
    let data = b()
        .prop(
            "Levels",
            "ArrayProperty",
            b().str("IntProperty"),
            b().i32(3).i32(10).i32(20).i32(30),
        )
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(
        list.get("Levels"),
        Some(&Value::Array(vec![Value::Int(10), Value::Int(20), Value::Int(30)]))
    );
}

#[test]
fn bool_array_items_are_bytes() {
    let data = b()
        .prop("Flags", "ArrayProperty", b().str("BoolProperty"), b().i32(2).raw(&[1, 0]))
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(
        list.get("Flags"),
        Some(&Value::Array(vec![Value::Byte(1), Value::Byte(0)]))
    );
}

#[test]
fn struct_array_shares_one_element_tag() {
    let element = |x: i32| b().prop("X", "IntProperty", b(), b().i32(x)).end();
    let items = b().raw(&element(1).0).raw(&element(2).0);
    let items_len = items.0.len();
    let value = b()
        .i32(2)
        .tag("Points", "StructProperty", items_len, 0, struct_extras("PointData"))
        .raw(&items.0);
    let data = b()
        .prop("Points", "ArrayProperty", b().str("StructProperty"), value)
        .top();

    let list = assert_reencodes(&data);
    let tag = list.tag("Points").unwrap();
    let element_tag = tag.element.as_deref().unwrap();
    assert_eq!(element_tag.size as usize, items_len);
    match list.get("Points") {
        Some(Value::Array(items)) => {
            assert_eq!(items.len(), 2);
            let second = items[1].as_struct().unwrap();
            assert_eq!(second.get("X"), Some(&Value::Int(2)));
        }
        other => panic!("expected array, got {other:?}"),
    }
}

#[test]
fn struct_array_without_element_tag_fails_to_encode() {
    let data = b()
        .prop("Points", "ArrayProperty", b().str("StructProperty"), b().i32(0).tag(
            "Points",
            "StructProperty",
            0,
            0,
            struct_extras("PointData"),
        ))
        .top();
    let (mut list, _) = decode_list(&data);
    list.tags[0].element = None;

    let err = encode_property_list(&mut list, &registry()).unwrap_err();
    assert!(matches!(err, Error::MissingElementTag { property } if property == "Points"));
}

#[test]
fn map_bool_values_are_ints() {
    let value = b().i32(0).i32(1).str("a").i32(1);
    let data = b()
        .prop(
            "Seen",
            "MapProperty",
            b().str("StrProperty").str("BoolProperty"),
            value,
        )
        .top();

    let list = assert_reencodes(&data);
    match list.get("Seen") {
        Some(Value::Map(map)) => {
            assert_eq!(map.reserved, 0);
            assert_eq!(map.entries.len(), 1);
            assert_eq!(map.entries[0].key.as_str(), Some("a"));
            assert_eq!(map.entries[0].value, Value::Int(1));
        }
        other => panic!("expected map, got {other:?}"),
    }
}

#[test]
fn map_reserved_field_is_preserved() {
    let value = b().i32(5).i32(1).i32(3).i32(4);
    let data = b()
        .prop("Counts", "MapProperty", b().str("IntProperty").str("IntProperty"), value)
        .top();

    let list = assert_reencodes(&data);
    assert!(matches!(list.get("Counts"), Some(Value::Map(map)) if map.reserved == 5));
}

#[test]
fn undecodable_map_is_kept_opaque() {
    // Value struct type is unknown and its bytes are not a property list.
    let value = b().i32(0).i32(1).i32(7).raw(&[0xab; 12]);
    let data = b()
        .prop(
            "Mystery",
            "MapProperty",
            b().str("IntProperty").str("StructProperty"),
            value,
        )
        .prop("After", "IntProperty", b(), b().i32(1))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert!(matches!(list.get("Mystery"), Some(Value::Bytes(raw)) if raw.len() == 24));
    assert_eq!(list.get("After"), Some(&Value::Int(1)));
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::OpaqueFallback);
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn set_holds_removed_and_added() {
    let value = b().i32(0).i32(2).i32(1).i32(2);
    let data = b()
        .prop("Unlocked", "SetProperty", b().str("IntProperty"), value)
        .top();

    let list = assert_reencodes(&data);
    match list.get("Unlocked") {
        Some(Value::Set(set)) => {
            assert!(set.removed.is_empty());
            assert_eq!(set.added, vec![Value::Int(1), Value::Int(2)]);
        }
        other => panic!("expected set, got {other:?}"),
    }
}

#[test]
fn static_array_elements_get_index_suffix() {
    let data = b()
        .tag("Slot", "IntProperty", 4, 0, b())
        .i32(10)
        .tag("Slot", "IntProperty", 4, 1, b())
        .i32(11)
        .tag("Slot", "IntProperty", 4, 2, b())
        .i32(12)
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(list.len(), 3);
    assert_eq!(list.get("Slot"), Some(&Value::Int(10)));
    assert_eq!(list.get("Slot[1]"), Some(&Value::Int(11)));
    assert_eq!(list.get("Slot[2]"), Some(&Value::Int(12)));
}

#[test]
fn byte_property_heuristics() {
    let data = b()
        .prop("Raw", "ByteProperty", b().str("None"), b().raw(&[42]))
        .prop("Mode", "ByteProperty", b().str("None"), b().str("EColor::Red"))
        .prop("Wide", "ByteProperty", b().str("None"), b().raw(&[0xff; 8]))
        .prop("Odd", "ByteProperty", b().str("None"), b().raw(&[1, 2, 3]))
        .prop("Typed", "ByteProperty", b().str("EMode"), b().str("EMode::Fast"))
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(list.get("Raw"), Some(&Value::Byte(42)));
    assert_eq!(list.get("Mode"), Some(&Value::Name("EColor::Red".into())));
    assert_eq!(list.get("Wide"), Some(&Value::Int64(-1)));
    assert_eq!(list.get("Odd"), Some(&Value::Bytes(vec![1, 2, 3])));
    assert_eq!(list.get("Typed"), Some(&Value::Name("EMode::Fast".into())));
    assert_eq!(
        list.tag("Typed").unwrap().ty,
        PropertyType::Byte(Some("EMode".into()))
    );
}

#[test]
fn size_mismatch_is_recovered() {
    let data = b()
        .tag("Broken", "IntProperty", 8, 0, b())
        .raw(&[1, 0, 0, 0, 2, 0, 0, 0])
        .prop("Next", "IntProperty", b(), b().i32(3))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert_eq!(
        list.get("Broken"),
        Some(&Value::Faulted(vec![1, 0, 0, 0, 2, 0, 0, 0]))
    );
    assert_eq!(list.get("Next"), Some(&Value::Int(3)));
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::SizeMismatch);
    assert_eq!(faults[0].property, "Broken");
    assert_eq!(faults[0].declared_end - faults[0].value_start, 8);
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn fail_fast_aborts_on_first_fault() {
    let data = b()
        .tag("Broken", "IntProperty", 8, 0, b())
        .raw(&[0; 8])
        .top();

    let err = decode_property_list(&data, &registry(), DecodeOptions::fail_fast()).unwrap_err();
    match err {
        Error::FailFast(fault) => assert_eq!(fault.kind, FaultKind::SizeMismatch),
        other => panic!("expected fail-fast abort, got {other}"),
    }
}

#[test]
fn unknown_property_type_is_opaque() {
    let data = b()
        .prop("Path", "FieldPathProperty", b(), b().raw(&[9, 8, 7]))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert_eq!(list.get("Path"), Some(&Value::Bytes(vec![9, 8, 7])));
    assert_eq!(faults.len(), 1);
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn empty_string_encodings_are_distinct() {
    let data = b()
        .prop("A", "StrProperty", b(), b().i32(0))
        .prop("B", "StrProperty", b(), b().i32(1).raw(&[0]))
        .top();

    let list = assert_reencodes(&data);
    assert_eq!(list.get("A"), Some(&Value::Str(FString::Null)));
    assert_eq!(list.get("B"), Some(&Value::Str(FString::Empty)));
}

#[test]
fn added_property_gets_its_size_computed() {
    let data = b().prop("Level", "IntProperty", b(), b().i32(1)).top();
    let (mut list, _) = decode_list(&data);
    list.push(
        gvas::PropertyTag::new("Name", PropertyType::Str),
        Value::Str("Io".into()),
    );

    let encoded = encode_property_list(&mut list, &registry()).unwrap();
    let expected = b()
        .prop("Level", "IntProperty", b(), b().i32(1))
        .prop("Name", "StrProperty", b(), b().str("Io"))
        .top();
    assert_eq!(encoded, expected);
}

fn header() -> Bytes {
    b().i32(0x5341_5647)
        .i32(3)
        .i32(522)
        .i32(1009)
        .u16(5)
        .u16(4)
        .u16(2)
        .u32(12345)
        .str("++UE5+Release-5.4")
        .i32(3)
        .i32(1)
        .u32(1)
        .u32(2)
        .u32(3)
        .u32(4)
        .i32(17)
        .str("/Script/TQ2.PlayerSave")
}

fn player_file() -> Vec<u8> {
    let data = b()
        .prop("Level", "IntProperty", b(), b().i32(12))
        .prop("Gold", "Int64Property", b(), b().raw(&500i64.to_le_bytes()))
        .prop("Hero", "StrProperty", b(), b().str("Ajax"))
        .top();
    header().raw(&data).0
}

#[test]
fn player_file_round_trips() {
    let registry = gvas::schema::registry().unwrap();
    let file = player_file();

    let mut decoded = decode(&file, "File_Data_Player", &registry, DecodeOptions::default()).unwrap();
    assert!(decoded.is_clean());
    let root = decoded.value.as_record().unwrap();
    let header = root.get("Header").and_then(Value::as_record).unwrap();
    assert_eq!(header.get("SaveGameFileVersion"), Some(&Value::Int(3)));
    assert_eq!(
        header.get("SaveGameClassName").and_then(Value::as_str),
        Some("/Script/TQ2.PlayerSave")
    );
    let data = root.get("Data").and_then(Value::as_struct).unwrap();
    assert_eq!(data.get("Gold"), Some(&Value::Int64(500)));

    assert_eq!(encode(&mut decoded.value, "File_Data_Player", &registry).unwrap(), file);
    assert!(verify_round_trip(&file, "File_Data_Player", &registry).unwrap());
}

#[test]
fn trailing_bytes_are_an_error() {
    let registry = gvas::schema::registry().unwrap();
    let mut file = player_file();
    file.push(0);

    let err = decode(&file, "File_Data_Player", &registry, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::TrailingData { remaining: 1, .. }));
}

#[test]
fn unknown_entry_point_is_rejected() {
    let registry = gvas::schema::registry().unwrap();
    let err = decode(&player_file(), "File_Nope", &registry, DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnknownEntryPoint { name } if name == "File_Nope"));
}

fn decode_with_schema(data: &[u8]) -> (PropertyList, Vec<gvas::Fault>) {
    let registry = gvas::schema::registry().unwrap();
    let decoded = decode_property_list(data, &registry, DecodeOptions::default()).unwrap();
    match decoded.value {
        Value::Struct(list) => (list, decoded.faults),
        other => panic!("expected a property list, got {}", other.kind_name()),
    }
}

#[test]
fn repeated_property_names_are_all_kept() {
    let data = b()
        .prop("A", "IntProperty", b(), b().i32(1))
        .prop("A", "IntProperty", b(), b().i32(2))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert!(faults.is_empty());
    assert_eq!(list.len(), 2);
    assert_eq!(list.get("A"), Some(&Value::Int(1)));
    assert_eq!(list.get("A#1"), Some(&Value::Int(2)));
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn irregular_bool_byte_is_reported() {
    let data = b().tag("bAlive", "BoolProperty", 0, 0, b().raw(&[2])).top();

    let (mut list, faults) = decode_list(&data);
    assert_eq!(list.get("bAlive"), Some(&Value::Bool(true)));
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::NonCanonicalFlag);
    assert_eq!(faults[0].bytes, vec![2]);

    let expected = b().tag("bAlive", "BoolProperty", 0, 0, b().raw(&[1])).top();
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), expected);
}

#[test]
fn irregular_text_presence_flag_is_kept_verbatim() {
    // Flags, culture-invariant history, then a presence flag of 2.
    let data = b()
        .prop("Title", "TextProperty", b(), b().u32(0).raw(&[0xff]).u32(2))
        .prop("Next", "IntProperty", b(), b().i32(4))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert!(matches!(list.get("Title"), Some(Value::Faulted(raw)) if raw.len() == 9));
    assert_eq!(list.get("Next"), Some(&Value::Int(4)));
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::ValueError);
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn undecodable_set_is_kept_opaque() {
    let value = b().i32(0).i32(1).raw(&[0xab; 16]);
    let data = b()
        .prop("Visited", "SetProperty", b().str("StructProperty"), value)
        .prop("After", "IntProperty", b(), b().i32(1))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert!(matches!(list.get("Visited"), Some(Value::Bytes(raw)) if raw.len() == 24));
    assert_eq!(list.get("After"), Some(&Value::Int(1)));
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::OpaqueFallback);
    assert_eq!(faults[0].property, "Visited");
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn set_struct_items_resolve_through_field_alias() {
    let value = b()
        .i32(0)
        .i32(2)
        .u32(1)
        .u32(2)
        .u32(3)
        .u32(4)
        .u32(5)
        .u32(6)
        .u32(7)
        .u32(8);
    let data = b()
        .prop("m_VisitedTorches", "SetProperty", b().str("StructProperty"), value)
        .top();

    let (mut list, faults) = decode_with_schema(&data);
    assert!(faults.is_empty(), "{faults:?}");
    match list.get("m_VisitedTorches") {
        Some(Value::Set(set)) => assert_eq!(
            set.added,
            vec![Value::Guid(Guid([1, 2, 3, 4])), Value::Guid(Guid([5, 6, 7, 8]))]
        ),
        other => panic!("expected set, got {other:?}"),
    }
    let registry = gvas::schema::registry().unwrap();
    assert_eq!(encode_property_list(&mut list, &registry).unwrap(), data);
}

#[test]
fn map_values_can_be_property_lists() {
    let score = |v: i32| b().prop("Score", "IntProperty", b(), b().i32(v)).end();
    let value = b()
        .i32(0)
        .i32(2)
        .i32(1)
        .raw(&score(10).0)
        .i32(2)
        .raw(&score(20).0);
    let data = b()
        .prop(
            "Scores",
            "MapProperty",
            b().str("IntProperty").str("StructProperty"),
            value,
        )
        .top();

    let list = assert_reencodes(&data);
    match list.get("Scores") {
        Some(Value::Map(map)) => {
            assert_eq!(map.entries.len(), 2);
            assert_eq!(map.entries[1].key, Value::Int(2));
            let second = map.entries[1].value.as_struct().unwrap();
            assert_eq!(second.get("Score"), Some(&Value::Int(20)));
        }
        other => panic!("expected map, got {other:?}"),
    }
}

fn save_game_data(title: &str) -> Vec<u8> {
    let inner = b().prop("Title", "StrProperty", b(), b().str(title)).top();
    let value = b()
        .str("PlayerSave_0")
        .str("/Script/TQ2.PlayerSave")
        .i32(inner.len() as i32)
        .raw(&inner);
    b().prop("SaveGame", "StructProperty", struct_extras("SaveGameData"), value)
        .prop("After", "IntProperty", b(), b().i32(6))
        .top()
}

#[test]
fn nested_save_game_data_size_is_patched() {
    let data = save_game_data("Io");
    let (mut list, faults) = decode_with_schema(&data);
    assert!(faults.is_empty(), "{faults:?}");
    assert_eq!(list.get("After"), Some(&Value::Int(6)));

    let registry = gvas::schema::registry().unwrap();
    assert_eq!(encode_property_list(&mut list, &registry).unwrap(), data);

    let Some(Value::Record(save)) = list.get_mut("SaveGame") else {
        panic!("SaveGameData should decode to a record");
    };
    let Value::Struct(inner) = save.field_mut("Data") else {
        panic!("SaveGameData should hold a property list");
    };
    *inner.get_mut("Title").unwrap() = Value::Str("A longer title".into());
    assert_eq!(
        encode_property_list(&mut list, &registry).unwrap(),
        save_game_data("A longer title")
    );
}

#[test]
fn shared_game_settings_round_trips() {
    let registry = gvas::schema::registry().unwrap();
    let data = b().prop("Volume", "FloatProperty", b(), b().f32(0.5)).top();
    let file = header()
        .raw(&data)
        .i32(1)
        .str("Gameplay")
        .i32(2)
        .str("m_CursorScale")
        .f32(1.5)
        .str("m_EnableTutorials")
        .raw(&[1])
        .0;

    let mut decoded =
        decode(&file, "File_SharedGameSettings", &registry, DecodeOptions::default()).unwrap();
    assert!(decoded.is_clean());
    let root = decoded.value.as_record().unwrap();
    let Some(Value::Array(sections)) = root.get("Sections") else {
        panic!("sections should decode to an array");
    };
    assert_eq!(sections.len(), 1);
    let section = sections[0].as_record().unwrap();
    assert_eq!(section.get("Name").and_then(Value::as_str), Some("Gameplay"));
    let Some(Value::Array(settings)) = section.get("Properties") else {
        panic!("settings should decode to an array");
    };
    let scale = settings[0].as_record().unwrap();
    assert_eq!(scale.get("Name").and_then(Value::as_str), Some("m_CursorScale"));
    assert_eq!(scale.get("Value"), Some(&Value::Float(1.5)));

    assert_eq!(
        encode(&mut decoded.value, "File_SharedGameSettings", &registry).unwrap(),
        file
    );
}

#[test]
fn size_fault_inside_struct_array_element_is_contained() {
    let broken = b()
        .tag("X", "IntProperty", 8, 0, b())
        .raw(&[1, 0, 0, 0, 2, 0, 0, 0])
        .end();
    let good = b().prop("X", "IntProperty", b(), b().i32(3)).end();
    let items = b().raw(&broken.0).raw(&good.0);
    let value = b()
        .i32(2)
        .tag("Points", "StructProperty", items.0.len(), 0, struct_extras("PointData"))
        .raw(&items.0);
    let data = b()
        .prop("Points", "ArrayProperty", b().str("StructProperty"), value)
        .prop("After", "IntProperty", b(), b().i32(9))
        .top();

    let (mut list, faults) = decode_list(&data);
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].kind, FaultKind::SizeMismatch);
    assert_eq!(faults[0].property, "X");
    match list.get("Points") {
        Some(Value::Array(items)) => {
            let first = items[0].as_struct().unwrap();
            assert!(matches!(first.get("X"), Some(Value::Faulted(raw)) if raw.len() == 8));
            let second = items[1].as_struct().unwrap();
            assert_eq!(second.get("X"), Some(&Value::Int(3)));
        }
        other => panic!("expected array, got {other:?}"),
    }
    assert_eq!(list.get("After"), Some(&Value::Int(9)));
    assert_eq!(encode_property_list(&mut list, &registry()).unwrap(), data);
}

#[test]
fn encode_leaves_tree_unchanged() {
    let registry = gvas::schema::registry().unwrap();
    let file = player_file();
    let mut decoded = decode(&file, "File_Data_Player", &registry, DecodeOptions::default()).unwrap();
    let before = decoded.value.clone();

    encode(&mut decoded.value, "File_Data_Player", &registry).unwrap();
    assert_eq!(decoded.value, before);
}
