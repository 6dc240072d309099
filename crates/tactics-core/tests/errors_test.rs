use tactics_core::errors::*;

#[test]
fn storage_errors_convert_into_tactics_error() {
    let err: TacticsError = StorageError::malformed("bad magic").into();
    assert!(matches!(err, TacticsError::Storage(_)));
    assert!(err.to_string().contains("bad magic"));
}

#[test]
fn start_fresh_and_fatal_are_distinguished() {
    let fresh: TacticsError = StorageError::LoadFailedStartFresh {
        component: "random_forest".into(),
        reason: "checksum mismatch".into(),
    }
    .into();
    assert!(fresh.is_start_fresh());
    assert!(!fresh.is_fatal());

    let fatal: TacticsError = StorageError::DirectoryUnavailable {
        path: "/nope".into(),
        reason: "permission denied".into(),
    }
    .into();
    assert!(fatal.is_fatal());
    assert!(!fatal.is_start_fresh());
}

#[test]
fn retryable_sync_errors() {
    assert!(SyncError::Network {
        reason: "reset".into()
    }
    .is_retryable());
    assert!(SyncError::Timeout { secs: 30 }.is_retryable());
    assert!(SyncError::RemoteRejected {
        status: 503,
        reason: "unavailable".into()
    }
    .is_retryable());
    assert!(!SyncError::RemoteRejected {
        status: 400,
        reason: "bad request".into()
    }
    .is_retryable());
    assert!(!SyncError::Disabled.is_retryable());
}

#[test]
fn learning_error_messages_name_the_dimensions() {
    let err = LearningError::DimensionMismatch {
        expected: 15,
        actual: 3,
    };
    let msg = err.to_string();
    assert!(msg.contains("15"));
    assert!(msg.contains('3'));
}

#[test]
fn serde_json_errors_become_serialization_errors() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
    let err: TacticsError = parse.unwrap_err().into();
    assert!(matches!(err, TacticsError::Serialization(_)));
}

#[test]
fn io_helper_records_the_path() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err = StorageError::io(std::path::Path::new("/tmp/x.model"), &io);
    assert!(err.to_string().contains("/tmp/x.model"));
}
