use serde::{Deserialize, Serialize};

use super::FeatureVector;

/// What an outcome taught us.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Classification: this action was the right one.
    Action(usize),
    /// Regression: the scalar reward observed after taking `action`.
    Reward { action: usize, value: f32 },
}

impl Label {
    /// The action this label refers to.
    pub fn action(&self) -> usize {
        match *self {
            Label::Action(action) => action,
            Label::Reward { action, .. } => action,
        }
    }

    /// Regression target. A bare action label counts as full reward.
    pub fn value(&self) -> f32 {
        match *self {
            Label::Action(_) => 1.0,
            Label::Reward { value, .. } => value,
        }
    }

    /// Whether the outcome was a success.
    pub fn is_positive(&self) -> bool {
        self.value() > 0.0
    }
}

/// One buffered (features, label) pair. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    features: FeatureVector,
    label: Label,
}

impl TrainingExample {
    pub fn new(features: FeatureVector, label: Label) -> Self {
        Self { features, label }
    }

    pub fn features(&self) -> &FeatureVector {
        &self.features
    }

    pub fn label(&self) -> Label {
        self.label
    }
}
