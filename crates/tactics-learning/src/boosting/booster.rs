//! One gbdt regressor per action, fitted on the rewards seen for it.

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use tactics_core::config::BoostingConfig;
use tactics_core::constants::FEATURE_DIMENSION;
use tactics_core::TrainingExample;

use crate::network::normalize;

/// Fewer rows than this and the action gets no regressor.
const MIN_ROWS_PER_ACTION: usize = 2;

#[derive(Serialize, Deserialize)]
pub(super) struct BoostedModel {
    per_action: Vec<Option<GBDT>>,
    importance: Vec<f32>,
    trained_on: usize,
}

impl BoostedModel {
    pub(super) fn fit(
        examples: &[TrainingExample],
        num_actions: usize,
        config: &BoostingConfig,
    ) -> Result<Self, String> {
        let mut importance = vec![0.0f32; FEATURE_DIMENSION];
        let mut per_action = Vec::with_capacity(num_actions);
        for action in 0..num_actions {
            let rows: Vec<&TrainingExample> = examples
                .iter()
                .filter(|e| e.label().action() == action)
                .collect();
            if rows.len() < MIN_ROWS_PER_ACTION {
                per_action.push(None);
                continue;
            }
            let mut data: DataVec = rows
                .iter()
                .map(|e| {
                    Data::new_training_data(
                        widen(e.features().as_slice()),
                        1.0,
                        e.label().value() as ValueType,
                        None,
                    )
                })
                .collect();
            let mut booster = GBDT::new(&booster_config(config));
            booster.fit(&mut data);
            add_permutation_importance(&booster, &rows, &mut importance);
            per_action.push(Some(booster));
        }
        if per_action.iter().all(Option::is_none) {
            return Err(format!(
                "no action has {MIN_ROWS_PER_ACTION} or more examples"
            ));
        }
        normalize(&mut importance);

        Ok(Self {
            per_action,
            importance,
            trained_on: examples.len(),
        })
    }

    pub(super) fn rewards(&self, x: &[f32]) -> Vec<Option<f32>> {
        let row: DataVec = vec![Data::new_test_data(widen(x), None)];
        self.per_action
            .iter()
            .map(|m| {
                m.as_ref()
                    .and_then(|m| m.predict(&row).into_iter().next())
                    .map(|v| v as f32)
            })
            .collect()
    }

    pub(super) fn action_count(&self) -> usize {
        self.per_action.iter().filter(|m| m.is_some()).count()
    }

    pub(super) fn importance(&self) -> &[f32] {
        &self.importance
    }
}

fn booster_config(config: &BoostingConfig) -> Config {
    let mut cfg = Config::new();
    cfg.set_feature_size(FEATURE_DIMENSION);
    cfg.set_max_depth(config.max_depth.max(1).try_into().unwrap_or(6));
    cfg.set_iterations(config.rounds.max(1));
    cfg.set_shrinkage(config.learning_rate as ValueType);
    cfg.set_min_leaf_size(config.min_samples_leaf.max(1));
    cfg.set_loss("SquaredError");
    cfg.set_debug(false);
    cfg
}

fn widen(x: &[f32]) -> Vec<ValueType> {
    x.iter().map(|v| *v as ValueType).collect()
}

/// Increase in squared error when one column is shifted by a row, summed
/// into `importance`. Negative changes count as zero.
fn add_permutation_importance(
    booster: &GBDT,
    rows: &[&TrainingExample],
    importance: &mut [f32],
) {
    let targets: Vec<f32> = rows.iter().map(|e| e.label().value()).collect();
    let baseline = squared_error(booster, rows, None, &targets);
    for (column, slot) in importance.iter_mut().enumerate() {
        let shifted = squared_error(booster, rows, Some(column), &targets);
        *slot += (shifted - baseline).max(0.0);
    }
}

fn squared_error(
    booster: &GBDT,
    rows: &[&TrainingExample],
    shift_column: Option<usize>,
    targets: &[f32],
) -> f32 {
    let n = rows.len();
    let data: DataVec = (0..n)
        .map(|i| {
            let mut features = widen(rows[i].features().as_slice());
            if let Some(c) = shift_column {
                if let Some(v) = rows[(i + 1) % n].features().get(c) {
                    features[c] = v as ValueType;
                }
            }
            Data::new_test_data(features, None)
        })
        .collect();
    let predicted = booster.predict(&data);
    predicted
        .iter()
        .zip(targets)
        .map(|(p, t)| (*p as f32 - t).powi(2))
        .sum::<f32>()
        / n.max(1) as f32
}
