use std::fs;

use tactics_storage::discovery::candidates;
use tactics_storage::locate_root_in;

#[test]
fn candidates_follow_launcher_search_order() {
    let home = std::path::Path::new("/home/player");
    let all = candidates(home);
    assert_eq!(all.len(), 7);
    assert_eq!(all[0], home.join(".minecraft/models/ai_enhanced"));
    assert_eq!(all[2], home.join(".local/share/PrismLauncher/instances/models/ai_enhanced"));
    assert_eq!(all[6], std::path::PathBuf::from("models/ai_enhanced"));
}

#[test]
fn defaults_to_vanilla_location_when_nothing_exists() {
    let home = tempfile::tempdir().unwrap();
    let root = locate_root_in(home.path());
    if !std::path::Path::new("models/ai_enhanced").exists() {
        assert_eq!(root, home.path().join(".minecraft/models/ai_enhanced"));
    }
}

#[test]
fn prefers_first_existing_launcher_directory() {
    let home = tempfile::tempdir().unwrap();
    let multimc = home.path().join(".multimc/instances/models/ai_enhanced");
    let atl = home.path().join("ATLauncher/instances/models/ai_enhanced");
    fs::create_dir_all(&multimc).unwrap();
    fs::create_dir_all(&atl).unwrap();
    assert_eq!(locate_root_in(home.path()), multimc);
}
