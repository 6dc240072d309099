/// Tactics core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the feature layout produced by the encoder.
/// Bump whenever a position changes meaning.
pub const ENCODER_VERSION: u32 = 1;

/// Number of positions in an encoded feature vector.
pub const FEATURE_DIMENSION: usize = 15;

/// Magic bytes at the start of every encoded model snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"TACS";

/// Current snapshot format version. Readers reject anything newer.
pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

/// Metadata format version written alongside component timestamps.
pub const METADATA_FORMAT_VERSION: &str = "1.0.0";

/// Stable model file names.
pub mod files {
    pub const POLICY_MODEL: &str = "policy.model";
    pub const TARGET_MODEL: &str = "target.model";
    pub const BOOSTING_MODEL: &str = "boosting.model";
    pub const FOREST_MODEL: &str = "forest.model";
    pub const KNOWLEDGE_BASE: &str = "knowledge.dat";
    pub const METADATA: &str = "model_metadata.properties";
    pub const BACKUP_DIR: &str = "backups";
    pub const BACKUP_PREFIX: &str = "backup_";
    pub const TMP_DIR: &str = "tmp";
}

/// Health ratio denominator offset, avoids division by zero.
pub const HEALTH_RATIO_EPSILON: f32 = 0.1;

/// Length of a full day in host time units.
pub const TICKS_PER_DAY: u32 = 24_000;
