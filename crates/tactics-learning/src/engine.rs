//! LearningEngine encodes situations, asks backends in priority order,
//! and fans outcomes out to every backend.

use std::sync::Arc;

use tactics_core::config::LearningConfig;
use tactics_core::{
    BackendKind, FeatureVector, Label, LearningPhase, PredictorBackend, Situation,
    TrainingStatus,
};
use tracing::debug;

use crate::approximator::FunctionApproximator;
use crate::boosting::GradientBoostingBackend;
use crate::encoder::FeatureEncoder;
use crate::forest::RandomForestBackend;
use crate::knowledge::TacticKnowledge;

/// Chosen action and the backend that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: usize,
    pub backend: BackendKind,
    pub features: FeatureVector,
}

/// One named entry of a feature importance ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRank {
    pub name: &'static str,
    pub importance: f32,
}

pub struct LearningEngine {
    encoder: FeatureEncoder,
    backends: Vec<Arc<dyn PredictorBackend>>,
    knowledge: TacticKnowledge,
}

impl LearningEngine {
    /// Build every backend named in `backend_priority`, in that order.
    /// Duplicates are ignored; an empty list falls back to the default order.
    pub fn new(config: &LearningConfig) -> Self {
        let mut order: Vec<BackendKind> = Vec::new();
        for kind in &config.backend_priority {
            if !order.contains(kind) {
                order.push(*kind);
            }
        }
        if order.is_empty() {
            order = LearningConfig::default().backend_priority;
        }

        let backends = order
            .into_iter()
            .map(|kind| -> Arc<dyn PredictorBackend> {
                match kind {
                    BackendKind::FunctionApproximator => {
                        Arc::new(FunctionApproximator::new(config))
                    }
                    BackendKind::GradientBoosting => {
                        Arc::new(GradientBoostingBackend::new(config))
                    }
                    BackendKind::RandomForest => Arc::new(RandomForestBackend::new(config)),
                }
            })
            .collect();
        Self::with_backends(backends)
    }

    /// Use caller-supplied backends, already in priority order.
    pub fn with_backends(backends: Vec<Arc<dyn PredictorBackend>>) -> Self {
        Self {
            encoder: FeatureEncoder::new(),
            backends,
            knowledge: TacticKnowledge::new(),
        }
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn backends(&self) -> &[Arc<dyn PredictorBackend>] {
        &self.backends
    }

    pub fn backend(&self, kind: BackendKind) -> Option<&Arc<dyn PredictorBackend>> {
        self.backends.iter().find(|b| b.kind() == kind)
    }

    pub fn knowledge(&self) -> &TacticKnowledge {
        &self.knowledge
    }

    /// Encode `situation` and return the first available prediction.
    pub fn decide(&self, subject_type: &str, situation: &Situation) -> Option<Decision> {
        let features = self.encoder.encode(situation);
        let (action, backend) = self.decide_features(subject_type, &features)?;
        Some(Decision {
            action,
            backend,
            features,
        })
    }

    /// Ask backends in priority order, skipping unavailable and untrained ones.
    pub fn decide_features(
        &self,
        subject_type: &str,
        features: &FeatureVector,
    ) -> Option<(usize, BackendKind)> {
        for backend in &self.backends {
            if !backend.is_available() {
                continue;
            }
            if let Some(action) = backend.predict(subject_type, features) {
                debug!(subject_type, action, backend = %backend.kind(), "decision");
                return Some((action, backend.kind()));
            }
        }
        debug!(subject_type, "no backend could decide");
        None
    }

    /// Give the example to every available backend and to the knowledge base.
    pub fn record_outcome(
        &self,
        subject_type: &str,
        features: &FeatureVector,
        label: Label,
    ) -> Vec<(BackendKind, TrainingStatus)> {
        self.knowledge.record(subject_type, label);
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| {
                let status = b.record_outcome(subject_type, features.clone(), label);
                (b.kind(), status)
            })
            .collect()
    }

    /// Force a training pass on every available backend.
    pub fn train_all(&self, subject_type: &str) -> Vec<(BackendKind, TrainingStatus)> {
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| (b.kind(), b.train_batch(subject_type)))
            .collect()
    }

    /// Top `top_n` named features from the first backend that reports any.
    pub fn feature_ranking(&self, subject_type: &str, top_n: usize) -> Vec<FeatureRank> {
        let names = self.encoder.feature_names();
        let Some(importance) = self
            .backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| b.feature_importance(subject_type))
            .find(|imp| !imp.is_empty())
        else {
            return Vec::new();
        };

        let mut ranked: Vec<FeatureRank> = importance
            .iter()
            .zip(names)
            .map(|(importance, name)| FeatureRank {
                name,
                importance: *importance,
            })
            .collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        ranked.truncate(top_n);
        ranked
    }

    pub fn phases(&self, subject_type: &str) -> Vec<(BackendKind, LearningPhase)> {
        self.backends
            .iter()
            .map(|b| (b.kind(), b.phase(subject_type)))
            .collect()
    }
}
