//! From-scratch function approximator with a frozen target network.
//!
//! One network pair is shared by every subject type (the subject is itself
//! a feature); buffers are kept per subject. Training runs on a clone of the
//! policy network and swaps it in afterwards, so `predict` only ever waits
//! on a brief read lock.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tactics_core::config::LearningConfig;
use tactics_core::constants::{files, FEATURE_DIMENSION};
use tactics_core::errors::{LearningError, TacticsResult};
use tactics_core::{
    BackendKind, FeatureVector, Label, LearningPhase, ModelSnapshot, PredictorBackend,
    TrainingExample, TrainingStatus,
};
use tracing::{debug, warn};

use crate::buffer::TrainingBuffer;
use crate::in_flight::InFlight;
use crate::network::FeedForwardNetwork;

const FILES: &[&str] = &[files::POLICY_MODEL, files::TARGET_MODEL];

#[derive(Debug, Clone)]
struct NetworkPair {
    policy: FeedForwardNetwork,
    target: FeedForwardNetwork,
    batches_since_sync: u32,
    trained: bool,
}

pub struct FunctionApproximator {
    num_actions: usize,
    batch_size: usize,
    min_examples: usize,
    target_sync_interval: u32,
    networks: RwLock<NetworkPair>,
    training: Mutex<()>,
    buffers: DashMap<String, TrainingBuffer>,
    in_flight: InFlight,
}

impl FunctionApproximator {
    pub fn new(config: &LearningConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let policy = FeedForwardNetwork::new(
            FEATURE_DIMENSION,
            config.hidden_size,
            config.num_actions,
            config.learning_rate,
            &mut rng,
        );
        let target = policy.clone();
        Self {
            num_actions: config.num_actions,
            batch_size: config.approximator_batch_size,
            min_examples: config.min_training_examples.min(config.approximator_batch_size),
            target_sync_interval: config.target_sync_interval.max(1),
            networks: RwLock::new(NetworkPair {
                policy,
                target,
                batches_since_sync: 0,
                trained: false,
            }),
            training: Mutex::new(()),
            buffers: DashMap::new(),
            in_flight: InFlight::default(),
        }
    }

    /// Raw per-action scores from the policy network.
    pub fn scores(&self, features: &FeatureVector) -> Option<Vec<f32>> {
        let pair = self.networks.read().unwrap_or_else(PoisonError::into_inner);
        pair.policy.forward(features.as_slice()).ok().map(|a| a.output)
    }

    /// Copy of the live network, for inspection and tests.
    pub fn policy_network(&self) -> FeedForwardNetwork {
        self.read_pair().policy.clone()
    }

    pub fn target_network(&self) -> FeedForwardNetwork {
        self.read_pair().target.clone()
    }

    fn read_pair(&self) -> NetworkPair {
        self.networks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn target_vector(
        &self,
        target: &FeedForwardNetwork,
        example: &TrainingExample,
    ) -> Result<Vec<f32>, LearningError> {
        let action = example.label().action();
        if action >= self.num_actions {
            return Err(LearningError::InvalidAction {
                action,
                num_actions: self.num_actions,
            });
        }
        match example.label() {
            Label::Reward { action, value } => {
                let mut t = target.forward(example.features().as_slice())?.output;
                t[action] = value;
                Ok(t)
            }
            Label::Action(action) => {
                let mut t = vec![0.0; self.num_actions];
                t[action] = 1.0;
                Ok(t)
            }
        }
    }

    fn fit(&self, examples: &[TrainingExample]) -> TrainingStatus {
        let _serial = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pair = self.read_pair();

        let mut total_loss = 0.0;
        let mut fitted = 0usize;
        for example in examples {
            let step = self
                .target_vector(&pair.target, example)
                .and_then(|t| pair.policy.train(example.features().as_slice(), &t));
            match step {
                Ok(loss) => {
                    total_loss += loss;
                    fitted += 1;
                }
                Err(e) => warn!(error = %e, "approximator: skipping example"),
            }
        }
        if fitted == 0 {
            return TrainingStatus::Failed {
                reason: "no usable examples in batch".to_string(),
            };
        }

        pair.trained = true;
        pair.batches_since_sync += 1;
        if pair.batches_since_sync >= self.target_sync_interval {
            let policy = pair.policy.clone();
            if let Err(e) = pair.target.copy_weights_from(&policy) {
                warn!(error = %e, "approximator: target sync failed");
            }
            pair.batches_since_sync = 0;
            debug!("approximator: target network synced");
        }

        *self.networks.write().unwrap_or_else(PoisonError::into_inner) = pair;
        debug!(
            examples = fitted,
            mean_loss = total_loss / fitted as f32,
            "approximator: batch trained"
        );
        TrainingStatus::Trained { examples: fitted }
    }
}

impl PredictorBackend for FunctionApproximator {
    fn kind(&self) -> BackendKind {
        BackendKind::FunctionApproximator
    }

    fn file_names(&self) -> &'static [&'static str] {
        FILES
    }

    fn is_available(&self) -> bool {
        true
    }

    fn predict(&self, _subject: &str, features: &FeatureVector) -> Option<usize> {
        let pair = self.networks.read().unwrap_or_else(PoisonError::into_inner);
        if !pair.trained {
            return None;
        }
        match pair.policy.best_action(features.as_slice()) {
            Ok(action) => Some(action),
            Err(e) => {
                warn!(error = %e, "approximator: cannot predict");
                None
            }
        }
    }

    fn record_outcome(
        &self,
        subject: &str,
        features: FeatureVector,
        label: Label,
    ) -> TrainingStatus {
        let buffered = {
            let mut buffer = self
                .buffers
                .entry(subject.to_string())
                .or_insert_with(|| TrainingBuffer::new(self.batch_size));
            buffer.push(TrainingExample::new(features, label));
            buffer.len()
        };
        if buffered >= self.batch_size {
            self.train_batch(subject)
        } else {
            TrainingStatus::Buffered { buffered }
        }
    }

    fn train_batch(&self, subject: &str) -> TrainingStatus {
        let Some(_guard) = self.in_flight.try_begin(subject) else {
            debug!(subject, "approximator: training already in flight");
            return TrainingStatus::Busy;
        };
        let examples = match self.buffers.get(subject) {
            Some(buffer) => buffer.examples().to_vec(),
            None => Vec::new(),
        };
        if examples.len() < self.min_examples.max(1) {
            return TrainingStatus::Skipped {
                buffered: examples.len(),
                needed: self.min_examples.max(1),
            };
        }

        let status = self.fit(&examples);
        if status.is_trained() {
            if let Some(mut buffer) = self.buffers.get_mut(subject) {
                buffer.retain_recent_half();
            }
        }
        status
    }

    fn feature_importance(&self, _subject: &str) -> Vec<f32> {
        let pair = self.networks.read().unwrap_or_else(PoisonError::into_inner);
        if pair.trained {
            pair.policy.input_saliency()
        } else {
            Vec::new()
        }
    }

    fn phase(&self, subject: &str) -> LearningPhase {
        if self.read_pair().trained {
            LearningPhase::Trained
        } else if self.buffers.get(subject).is_some_and(|b| !b.is_empty()) {
            LearningPhase::Buffering
        } else {
            LearningPhase::Cold
        }
    }

    fn buffered_counts(&self) -> HashMap<String, usize> {
        self.buffers
            .iter()
            .map(|r| (r.key().clone(), r.len()))
            .collect()
    }

    fn snapshot(&self, now_millis: i64) -> TacticsResult<Vec<(&'static str, ModelSnapshot)>> {
        let pair = self.read_pair();
        Ok(vec![
            (
                files::POLICY_MODEL,
                ModelSnapshot::new(self.component(), now_millis, pair.policy.encode()),
            ),
            (
                files::TARGET_MODEL,
                ModelSnapshot::new(self.component(), now_millis, pair.target.encode()),
            ),
        ])
    }

    fn restore(&self, file_name: &str, snapshot: &ModelSnapshot) -> TacticsResult<()> {
        let network = FeedForwardNetwork::decode(&snapshot.payload)?;
        if network.input_size() != FEATURE_DIMENSION || network.output_size() != self.num_actions
        {
            return Err(LearningError::ModelDecode {
                backend: self.component().to_string(),
                reason: format!(
                    "stored network is {}x{}, expected {}x{}",
                    network.input_size(),
                    network.output_size(),
                    FEATURE_DIMENSION,
                    self.num_actions
                ),
            }
            .into());
        }

        let _serial = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pair = self.networks.write().unwrap_or_else(PoisonError::into_inner);
        match file_name {
            files::POLICY_MODEL => {
                pair.policy = network;
                pair.trained = true;
            }
            files::TARGET_MODEL => pair.target = network,
            other => {
                return Err(LearningError::ModelDecode {
                    backend: self.component().to_string(),
                    reason: format!("unknown file {other}"),
                }
                .into())
            }
        }
        Ok(())
    }
}
