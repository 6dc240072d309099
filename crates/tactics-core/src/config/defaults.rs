//! Default values shared by the config sections.

// Learning
pub const DEFAULT_NUM_ACTIONS: usize = 10;
pub const DEFAULT_HIDDEN_SIZE: usize = 64;
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;
pub const DEFAULT_APPROXIMATOR_BATCH_SIZE: usize = 32;
pub const DEFAULT_TARGET_SYNC_INTERVAL: u32 = 10;
pub const DEFAULT_MIN_TRAINING_EXAMPLES: usize = 10;

// Gradient boosting
pub const DEFAULT_BOOSTING_BATCH_SIZE: usize = 100;
pub const DEFAULT_BOOSTING_MAX_DEPTH: usize = 6;
pub const DEFAULT_BOOSTING_LEARNING_RATE: f32 = 0.1;
pub const DEFAULT_BOOSTING_ROUNDS: usize = 10;

// Random forest
pub const DEFAULT_FOREST_BATCH_SIZE: usize = 200;
pub const DEFAULT_FOREST_TREES: usize = 100;
pub const DEFAULT_FOREST_MAX_DEPTH: usize = 20;

pub const DEFAULT_MIN_SAMPLES_LEAF: usize = 2;

// Storage
pub const DEFAULT_MAX_BACKUPS: usize = 5;
pub const DEFAULT_COMPRESS_MODELS: bool = true;

// Sync
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1_024;
pub const DEFAULT_COMPRESSION_THRESHOLD_BYTES: usize = 512;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Activity
pub const DEFAULT_INACTIVITY_THRESHOLD_SECS: u64 = 60;

// Runtime
/// 10 minutes at 20 ticks per second.
pub const DEFAULT_AUTOSAVE_INTERVAL_TICKS: u64 = 12_000;
pub const DEFAULT_CYCLE_TIMEOUT_SECS: u64 = 120;
