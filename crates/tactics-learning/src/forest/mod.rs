//! Ensemble backend B: a random forest of linfa decision trees.
//!
//! Classes are action indices. Only positive outcomes become examples, so
//! the forest learns "which action worked" rather than reward magnitudes.
//! Trees are grown in parallel with rayon, each from its own seeded RNG.
//!
//! Built without the `random-forest` feature, the backend still exists but
//! reports itself unavailable and never links linfa.

use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;
use tactics_core::config::{ForestConfig, LearningConfig};
use tactics_core::constants::{files, FEATURE_DIMENSION};
use tactics_core::errors::{LearningError, TacticsResult};
use tactics_core::{
    BackendKind, FeatureVector, Label, LearningPhase, ModelSnapshot, PredictorBackend,
    TrainingExample, TrainingStatus,
};
use tracing::{debug, info, warn};

use crate::buffer::TrainingBuffer;
use crate::in_flight::InFlight;

#[cfg(feature = "random-forest")]
mod bagging;
#[cfg(feature = "random-forest")]
use bagging::ForestModel;
#[cfg(not(feature = "random-forest"))]
use compiled_out::ForestModel;

const FILES: &[&str] = &[files::FOREST_MODEL];

/// Index of the most voted class; ties go to the lower index.
fn majority(votes: &[usize]) -> usize {
    votes
        .iter()
        .enumerate()
        .fold((0, 0), |(best, best_votes), (class, v)| {
            if *v > best_votes {
                (class, *v)
            } else {
                (best, best_votes)
            }
        })
        .0
}

pub struct RandomForestBackend {
    available: bool,
    config: ForestConfig,
    num_actions: usize,
    min_examples: usize,
    seed: Option<u64>,
    buffers: DashMap<String, TrainingBuffer>,
    models: DashMap<String, ForestModel>,
    in_flight: InFlight,
}

impl RandomForestBackend {
    /// Available when built with the `random-forest` feature.
    pub fn new(config: &LearningConfig) -> Self {
        let available = cfg!(feature = "random-forest");
        if !available {
            info!("random forest backend compiled out");
        }
        Self::with_availability(config, available)
    }

    /// A backend that reports itself unavailable and ignores every call.
    pub fn unavailable(config: &LearningConfig) -> Self {
        Self::with_availability(config, false)
    }

    fn with_availability(config: &LearningConfig, available: bool) -> Self {
        Self {
            available,
            config: config.forest.clone(),
            num_actions: config.num_actions,
            min_examples: config.min_training_examples.max(1),
            seed: config.seed,
            buffers: DashMap::new(),
            models: DashMap::new(),
            in_flight: InFlight::default(),
        }
    }

    /// Share of trees voting for each action.
    pub fn predict_probabilities(
        &self,
        subject: &str,
        features: &FeatureVector,
    ) -> Option<Vec<f32>> {
        if !self.available {
            return None;
        }
        let model = self.models.get(subject)?;
        let votes = model.votes(features.as_slice());
        let total: usize = votes.iter().sum();
        if total == 0 {
            return None;
        }
        Some(votes.into_iter().map(|v| v as f32 / total as f32).collect())
    }

    /// Out-of-bag misclassification rate of the last fit, if any row was
    /// left out of every bootstrap sample at least once.
    pub fn oob_error(&self, subject: &str) -> Option<f32> {
        self.models.get(subject).and_then(|m| m.oob_error())
    }

    pub fn tree_count(&self, subject: &str) -> usize {
        self.models.get(subject).map_or(0, |m| m.tree_count())
    }
}

impl PredictorBackend for RandomForestBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::RandomForest
    }

    fn file_names(&self) -> &'static [&'static str] {
        if self.available {
            FILES
        } else {
            &[]
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn predict(&self, subject: &str, features: &FeatureVector) -> Option<usize> {
        if !self.available {
            return None;
        }
        let votes = self.models.get(subject)?.votes(features.as_slice());
        if votes.iter().all(|v| *v == 0) {
            return None;
        }
        Some(majority(&votes))
    }

    fn record_outcome(
        &self,
        subject: &str,
        features: FeatureVector,
        label: Label,
    ) -> TrainingStatus {
        if !self.available {
            return TrainingStatus::Unavailable;
        }
        if !label.is_positive() {
            return TrainingStatus::Ignored;
        }
        if features.len() != FEATURE_DIMENSION || label.action() >= self.num_actions {
            warn!(
                subject,
                width = features.len(),
                action = label.action(),
                "forest: ignoring malformed example"
            );
            return TrainingStatus::Ignored;
        }
        let buffered = {
            let mut buffer = self
                .buffers
                .entry(subject.to_string())
                .or_insert_with(|| TrainingBuffer::new(self.config.batch_size));
            buffer.push(TrainingExample::new(features, Label::Action(label.action())))
        };
        if buffered >= self.config.batch_size {
            self.train_batch(subject)
        } else {
            TrainingStatus::Buffered { buffered }
        }
    }

    fn train_batch(&self, subject: &str) -> TrainingStatus {
        if !self.available {
            return TrainingStatus::Unavailable;
        }
        let Some(_guard) = self.in_flight.try_begin(subject) else {
            debug!(subject, "forest: training already in flight");
            return TrainingStatus::Busy;
        };
        let examples = self
            .buffers
            .get(subject)
            .map(|b| b.examples().to_vec())
            .unwrap_or_default();
        if examples.len() < self.min_examples {
            return TrainingStatus::Skipped {
                buffered: examples.len(),
                needed: self.min_examples,
            };
        }

        let seed = match self.seed {
            Some(seed) => seed ^ examples.len() as u64,
            None => rand::random(),
        };
        let model = match ForestModel::fit(&examples, self.num_actions, &self.config, seed) {
            Ok(model) => model,
            Err(reason) => {
                warn!(subject, %reason, "forest: fit failed");
                return TrainingStatus::Failed { reason };
            }
        };
        debug!(
            subject,
            examples = examples.len(),
            trees = model.tree_count(),
            oob_error = model.oob_error(),
            "forest: model retrained"
        );
        self.models.insert(subject.to_string(), model);
        if let Some(mut buffer) = self.buffers.get_mut(subject) {
            buffer.retain_recent_half();
        }
        TrainingStatus::Trained {
            examples: examples.len(),
        }
    }

    fn feature_importance(&self, subject: &str) -> Vec<f32> {
        if !self.available {
            return Vec::new();
        }
        self.models
            .get(subject)
            .map(|m| m.importance().to_vec())
            .unwrap_or_default()
    }

    fn phase(&self, subject: &str) -> LearningPhase {
        if self.models.contains_key(subject) {
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
        if !self.available {
            return Ok(Vec::new());
        }
        let mut models = BTreeMap::new();
        for entry in self.models.iter() {
            models.insert(entry.key().clone(), serde_json::to_value(entry.value())?);
        }
        let payload = serde_json::to_vec(&models)?;
        Ok(vec![(
            files::FOREST_MODEL,
            ModelSnapshot::new(self.component(), now_millis, payload),
        )])
    }

    fn restore(&self, _file_name: &str, snapshot: &ModelSnapshot) -> TacticsResult<()> {
        if !self.available {
            return Ok(());
        }
        let models: BTreeMap<String, ForestModel> = serde_json::from_slice(&snapshot.payload)
            .map_err(|e| LearningError::ModelDecode {
                backend: self.component().to_string(),
                reason: e.to_string(),
            })?;
        self.models.clear();
        for (subject, model) in models {
            self.models.insert(subject, model);
        }
        Ok(())
    }
}

#[cfg(not(feature = "random-forest"))]
mod compiled_out {
    use serde::{Deserialize, Serialize};
    use tactics_core::config::ForestConfig;
    use tactics_core::TrainingExample;

    /// No forest model can exist without linfa.
    #[derive(Serialize, Deserialize)]
    pub(super) enum ForestModel {}

    impl ForestModel {
        pub(super) fn fit(
            _examples: &[TrainingExample],
            _num_classes: usize,
            _config: &ForestConfig,
            _seed: u64,
        ) -> Result<Self, String> {
            Err("built without the random-forest feature".to_string())
        }

        pub(super) fn votes(&self, _x: &[f32]) -> Vec<usize> {
            match *self {}
        }

        pub(super) fn tree_count(&self) -> usize {
            match *self {}
        }

        pub(super) fn oob_error(&self) -> Option<f32> {
            match *self {}
        }

        pub(super) fn importance(&self) -> &[f32] {
            match *self {}
        }
    }
}
