//! Ensemble backend A: per-action gradient-boosted regression trees (gbdt).
//!
//! Each action gets its own booster trained on the rewards observed when
//! that action was taken; prediction picks the action with the highest
//! predicted reward among those that have a model. Feature importance is
//! the permutation importance measured on the training rows.
//!
//! Built without the `gradient-boosting` feature, the backend reports
//! itself unavailable and never links gbdt.

use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;
use tactics_core::config::{BoostingConfig, LearningConfig};
use tactics_core::constants::{files, FEATURE_DIMENSION};
use tactics_core::errors::{LearningError, TacticsResult};
use tactics_core::{
    BackendKind, FeatureVector, Label, LearningPhase, ModelSnapshot, PredictorBackend,
    TrainingExample, TrainingStatus,
};
use tracing::{debug, info, warn};

use crate::buffer::TrainingBuffer;
use crate::in_flight::InFlight;

#[cfg(feature = "gradient-boosting")]
mod booster;
#[cfg(feature = "gradient-boosting")]
use booster::BoostedModel;
#[cfg(not(feature = "gradient-boosting"))]
use compiled_out::BoostedModel;

const FILES: &[&str] = &[files::BOOSTING_MODEL];

pub struct GradientBoostingBackend {
    available: bool,
    config: BoostingConfig,
    num_actions: usize,
    min_examples: usize,
    buffers: DashMap<String, TrainingBuffer>,
    models: DashMap<String, BoostedModel>,
    in_flight: InFlight,
}

impl GradientBoostingBackend {
    /// Available when built with the `gradient-boosting` feature.
    pub fn new(config: &LearningConfig) -> Self {
        let available = cfg!(feature = "gradient-boosting");
        if !available {
            info!("gradient boosting backend compiled out");
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
            config: config.boosting.clone(),
            num_actions: config.num_actions,
            min_examples: config.min_training_examples.max(1),
            buffers: DashMap::new(),
            models: DashMap::new(),
            in_flight: InFlight::default(),
        }
    }

    /// Predicted reward per action; `None` entries have no model yet.
    pub fn predicted_rewards(
        &self,
        subject: &str,
        features: &FeatureVector,
    ) -> Option<Vec<Option<f32>>> {
        if !self.available {
            return None;
        }
        self.models
            .get(subject)
            .map(|m| m.rewards(features.as_slice()))
    }
}

impl PredictorBackend for GradientBoostingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GradientBoosting
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
        let rewards = self.predicted_rewards(subject, features)?;
        rewards
            .iter()
            .enumerate()
            .filter_map(|(a, r)| r.map(|r| (a, r)))
            .fold(None, |best: Option<(usize, f32)>, (a, r)| match best {
                Some((_, br)) if br >= r => best,
                _ => Some((a, r)),
            })
            .map(|(a, _)| a)
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
        if features.len() != FEATURE_DIMENSION || label.action() >= self.num_actions {
            warn!(
                subject,
                width = features.len(),
                action = label.action(),
                "boosting: ignoring malformed example"
            );
            return TrainingStatus::Ignored;
        }
        let buffered = {
            let mut buffer = self
                .buffers
                .entry(subject.to_string())
                .or_insert_with(|| TrainingBuffer::new(self.config.batch_size));
            buffer.push(TrainingExample::new(features, label))
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
            debug!(subject, "boosting: training already in flight");
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

        let model = match BoostedModel::fit(&examples, self.num_actions, &self.config) {
            Ok(model) => model,
            Err(reason) => {
                warn!(subject, %reason, "boosting: fit failed");
                return TrainingStatus::Failed { reason };
            }
        };
        let actions = model.action_count();
        self.models.insert(subject.to_string(), model);
        if let Some(mut buffer) = self.buffers.get_mut(subject) {
            buffer.retain_recent_half();
        }
        debug!(
            subject,
            examples = examples.len(),
            actions,
            "boosting: model retrained"
        );
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
            files::BOOSTING_MODEL,
            ModelSnapshot::new(self.component(), now_millis, payload),
        )])
    }

    fn restore(&self, _file_name: &str, snapshot: &ModelSnapshot) -> TacticsResult<()> {
        if !self.available {
            return Ok(());
        }
        let models: BTreeMap<String, BoostedModel> = serde_json::from_slice(&snapshot.payload)
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

#[cfg(not(feature = "gradient-boosting"))]
mod compiled_out {
    use serde::{Deserialize, Serialize};
    use tactics_core::config::BoostingConfig;
    use tactics_core::TrainingExample;

    /// No boosted model can exist without gbdt.
    #[derive(Serialize, Deserialize)]
    pub(super) enum BoostedModel {}

    impl BoostedModel {
        pub(super) fn fit(
            _examples: &[TrainingExample],
            _num_actions: usize,
            _config: &BoostingConfig,
        ) -> Result<Self, String> {
            Err("built without the gradient-boosting feature".to_string())
        }

        pub(super) fn rewards(&self, _x: &[f32]) -> Vec<Option<f32>> {
            match *self {}
        }

        pub(super) fn action_count(&self) -> usize {
            match *self {}
        }

        pub(super) fn importance(&self) -> &[f32] {
            match *self {}
        }
    }
}
