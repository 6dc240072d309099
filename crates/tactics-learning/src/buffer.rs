//! Per-subject training buffer with retain-most-recent-half truncation.

use tactics_core::TrainingExample;

#[derive(Debug, Clone)]
pub struct TrainingBuffer {
    capacity: usize,
    examples: Vec<TrainingExample>,
}

impl TrainingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            examples: Vec::with_capacity(capacity),
        }
    }

    /// Append and return the new length.
    pub fn push(&mut self, example: TrainingExample) -> usize {
        self.examples.push(example);
        self.examples.len()
    }

    pub fn is_full(&self) -> bool {
        self.examples.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    /// Drop everything but the most recent `capacity / 2` examples.
    pub fn retain_recent_half(&mut self) {
        let keep = self.capacity / 2;
        if self.examples.len() > keep {
            let drop = self.examples.len() - keep;
            self.examples.drain(..drop);
        }
    }

    pub fn clear(&mut self) {
        self.examples.clear();
    }
}
