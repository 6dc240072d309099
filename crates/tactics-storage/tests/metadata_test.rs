use proptest::prelude::*;
use tactics_storage::MetadataFile;

#[test]
fn missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let meta = MetadataFile::new(dir.path().join("model_metadata.properties"));
    assert!(meta.read().unwrap().is_empty());
    assert_eq!(meta.last_save("random_forest"), None);
    assert_eq!(meta.version(), None);
}

#[test]
fn later_saves_overwrite_only_their_component() {
    let dir = tempfile::tempdir().unwrap();
    let meta = MetadataFile::new(dir.path().join("model_metadata.properties"));
    meta.record_saves(["gradient_boosting", "random_forest"], 100).unwrap();
    meta.record_saves(["random_forest"], 250).unwrap();

    assert_eq!(meta.last_save("gradient_boosting"), Some(100));
    assert_eq!(meta.last_save("random_forest"), Some(250));
    assert!(!dir.path().join("model_metadata.properties.tmp").exists());
}

proptest! {
    #[test]
    fn recorded_timestamps_read_back(
        saves in prop::collection::vec(("[a-z_]{1,12}", 0i64..i64::MAX), 1..8)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let meta = MetadataFile::new(dir.path().join("model_metadata.properties"));
        for (component, millis) in &saves {
            meta.record_saves([component.as_str()], *millis).unwrap();
        }
        for (component, _) in &saves {
            let last = saves.iter().rev().find(|(c, _)| c == component).map(|(_, m)| *m);
            prop_assert_eq!(meta.last_save(component), last);
        }
        let version = meta.version();
        prop_assert_eq!(version.as_deref(), Some("1.0.0"));
    }
}
