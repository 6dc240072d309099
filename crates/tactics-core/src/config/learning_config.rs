use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::BackendKind;

/// Learning subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Number of distinct tactics an agent can choose from.
    pub num_actions: usize,
    /// Hidden layer width of the function approximator.
    pub hidden_size: usize,
    /// Step size for approximator weight updates.
    pub learning_rate: f32,
    /// Examples buffered per subject type before the approximator trains.
    pub approximator_batch_size: usize,
    /// Batches between target network syncs.
    pub target_sync_interval: u32,
    /// Below this many buffered examples, a training request is skipped.
    pub min_training_examples: usize,
    /// Order in which backends are asked for a decision.
    pub backend_priority: Vec<BackendKind>,
    /// Seed for weight initialization and sampling. `None` uses entropy.
    pub seed: Option<u64>,
    pub boosting: BoostingConfig,
    pub forest: ForestConfig,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            num_actions: defaults::DEFAULT_NUM_ACTIONS,
            hidden_size: defaults::DEFAULT_HIDDEN_SIZE,
            learning_rate: defaults::DEFAULT_LEARNING_RATE,
            approximator_batch_size: defaults::DEFAULT_APPROXIMATOR_BATCH_SIZE,
            target_sync_interval: defaults::DEFAULT_TARGET_SYNC_INTERVAL,
            min_training_examples: defaults::DEFAULT_MIN_TRAINING_EXAMPLES,
            backend_priority: vec![
                BackendKind::FunctionApproximator,
                BackendKind::GradientBoosting,
                BackendKind::RandomForest,
            ],
            seed: None,
            boosting: BoostingConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

/// Gradient-boosted trees (ensemble backend A).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub batch_size: usize,
    pub max_depth: usize,
    pub learning_rate: f32,
    pub rounds: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::DEFAULT_BOOSTING_BATCH_SIZE,
            max_depth: defaults::DEFAULT_BOOSTING_MAX_DEPTH,
            learning_rate: defaults::DEFAULT_BOOSTING_LEARNING_RATE,
            rounds: defaults::DEFAULT_BOOSTING_ROUNDS,
            min_samples_leaf: defaults::DEFAULT_MIN_SAMPLES_LEAF,
        }
    }
}

/// Random forest (ensemble backend B).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub batch_size: usize,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::DEFAULT_FOREST_BATCH_SIZE,
            n_trees: defaults::DEFAULT_FOREST_TREES,
            max_depth: defaults::DEFAULT_FOREST_MAX_DEPTH,
            min_samples_leaf: defaults::DEFAULT_MIN_SAMPLES_LEAF,
        }
    }
}
