//! # tactics-learning
//!
//! Learns which tactic to pick from combat outcomes.
//!
//! ## Backends
//!
//! | Backend | Model | Files |
//! |---------|-------|-------|
//! | `FunctionApproximator` | two-layer network, policy + frozen target | `policy.model`, `target.model` |
//! | `GradientBoostingBackend` | per-action gbdt regressors | `boosting.model` |
//! | `RandomForestBackend` | bagged linfa Gini trees, majority vote | `forest.model` |
//!
//! All backends consume the same [`FeatureEncoder`] layout, so the
//! [`LearningEngine`] can fall back from one to the next per decision.
//!
//! The ensembles sit behind the `gradient-boosting` and `random-forest`
//! cargo features (both default). A build without one keeps the backend
//! type but it reports itself unavailable.

pub mod approximator;
pub mod boosting;
pub mod buffer;
pub mod encoder;
pub mod engine;
pub mod forest;
mod in_flight;
pub mod knowledge;
pub mod network;

pub use approximator::FunctionApproximator;
pub use boosting::GradientBoostingBackend;
pub use buffer::TrainingBuffer;
pub use encoder::FeatureEncoder;
pub use engine::{Decision, FeatureRank, LearningEngine};
pub use forest::RandomForestBackend;
pub use knowledge::TacticKnowledge;
pub use network::FeedForwardNetwork;
