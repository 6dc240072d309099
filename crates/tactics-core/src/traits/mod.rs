mod clock;
mod predictor;

pub use clock::{Clock, ManualClock, SystemClock};
pub use predictor::PredictorBackend;
