//! Per subject/action attempt and success counters.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tactics_core::constants::files;
use tactics_core::errors::{LearningError, TacticsResult};
use tactics_core::{Label, ModelSnapshot};

const COMPONENT: &str = "tactic_knowledge";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionStats {
    pub attempts: u64,
    pub successes: u64,
    pub total_reward: f64,
}

impl ActionStats {
    pub fn success_rate(&self) -> f32 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f32 / self.attempts as f32
        }
    }
}

#[derive(Debug, Default)]
pub struct TacticKnowledge {
    subjects: DashMap<String, BTreeMap<usize, ActionStats>>,
}

impl TacticKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_name(&self) -> &'static str {
        files::KNOWLEDGE_BASE
    }

    pub fn record(&self, subject: &str, label: Label) {
        let mut actions = self.subjects.entry(subject.to_string()).or_default();
        let stats = actions.entry(label.action()).or_default();
        stats.attempts += 1;
        if label.is_positive() {
            stats.successes += 1;
        }
        stats.total_reward += f64::from(label.value());
    }

    pub fn stats(&self, subject: &str, action: usize) -> Option<ActionStats> {
        self.subjects
            .get(subject)
            .and_then(|a| a.get(&action).copied())
    }

    pub fn success_rate(&self, subject: &str, action: usize) -> Option<f32> {
        self.stats(subject, action).map(|s| s.success_rate())
    }

    /// Highest success rate among actions tried at least `min_attempts`
    /// times. Ties go to the lower action index.
    pub fn best_action(&self, subject: &str, min_attempts: u64) -> Option<usize> {
        let actions = self.subjects.get(subject)?;
        let mut best: Option<(usize, f32)> = None;
        for (action, stats) in actions.iter() {
            if stats.attempts < min_attempts.max(1) {
                continue;
            }
            let rate = stats.success_rate();
            if best.map_or(true, |(_, r)| rate > r) {
                best = Some((*action, rate));
            }
        }
        best.map(|(a, _)| a)
    }

    pub fn subjects(&self) -> Vec<String> {
        let mut names: Vec<String> = self.subjects.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Everything recorded for `subject`, as a JSON object keyed by action.
    pub fn subject_summary(&self, subject: &str) -> Option<serde_json::Value> {
        let actions = self.subjects.get(subject)?;
        serde_json::to_value(&*actions).ok()
    }

    pub fn snapshot(&self, now_millis: i64) -> TacticsResult<ModelSnapshot> {
        let all: BTreeMap<String, BTreeMap<usize, ActionStats>> = self
            .subjects
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        Ok(ModelSnapshot::new(
            COMPONENT,
            now_millis,
            serde_json::to_vec(&all)?,
        ))
    }

    pub fn restore(&self, snapshot: &ModelSnapshot) -> TacticsResult<()> {
        let all: BTreeMap<String, BTreeMap<usize, ActionStats>> =
            serde_json::from_slice(&snapshot.payload).map_err(|e| LearningError::ModelDecode {
                backend: COMPONENT.to_string(),
                reason: e.to_string(),
            })?;
        self.subjects.clear();
        for (subject, actions) in all {
            self.subjects.insert(subject, actions);
        }
        Ok(())
    }
}
