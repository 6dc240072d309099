mod aggregate;
mod backend;
pub mod binary;
mod feature_vector;
mod situation;
mod snapshot;
mod training_example;

pub use aggregate::AggregateStatus;
pub use backend::{BackendKind, LearningPhase, TrainingStatus};
pub use feature_vector::FeatureVector;
pub use situation::Situation;
pub use snapshot::ModelSnapshot;
pub use training_example::{Label, TrainingExample};
