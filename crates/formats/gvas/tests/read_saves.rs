use gvas::{decode, encode, schema, DecodeOptions};

fn load_if_exists(path: &str) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}

fn save_dir() -> String {
    std::env::var("GVAS_SAVE_DIR")
        .unwrap_or_else(|_| format!("{}/TQ2/Saved/SaveGames", env!("HOME")))
}

fn check_round_trip(file: &str, entry: &str) {
    let path = format!("{}/{file}", save_dir());
    let Some(data) = load_if_exists(&path) else {
        eprintln!("skipping: {path} not found");
        return;
    };
    let registry = schema::registry().expect("failed to build registry");
    let mut decoded = decode(&data, entry, &registry, DecodeOptions::default())
        .unwrap_or_else(|e| panic!("failed to decode {path}: {e}"));
    for fault in &decoded.faults {
        eprintln!("{file}: {fault}");
    }

    let encoded = encode(&mut decoded.value, entry, &registry).expect("failed to re-encode");
    assert_eq!(encoded.len(), data.len());
    assert!(encoded == data, "{file}: re-encoded bytes differ");
}

#[test]
fn player_save() {
    check_round_trip("Player.sav", "File_Data_Player");
}

#[test]
fn player_local_save() {
    check_round_trip("PlayerLocal.sav", "File_Data_PlayerLocal");
}

#[test]
fn world_campaign_save() {
    check_round_trip("WorldCampaign.sav", "File_Data_WorldCampaign");
}

#[test]
fn shared_game_settings() {
    check_round_trip("SharedGameSettings.sav", "File_SharedGameSettings");
}
