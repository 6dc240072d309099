//! Bootstrap-aggregated linfa decision trees, each grown on a random
//! subset of encoder positions.

use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tactics_core::config::ForestConfig;
use tactics_core::constants::FEATURE_DIMENSION;
use tactics_core::TrainingExample;

use super::majority;
use crate::network::normalize;

/// Two thirds of the encoder positions, rounded up.
const COLUMNS_PER_TREE: usize = (2 * FEATURE_DIMENSION).div_ceil(3);

#[derive(Serialize, Deserialize)]
struct Member {
    /// Encoder positions this tree was grown on, in column order.
    columns: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

impl Member {
    fn predict_rows(&self, rows: &[&[f32]]) -> Result<Array1<usize>, String> {
        let records = project(rows, &self.columns)?;
        Ok(self.tree.predict(&records))
    }
}

#[derive(Serialize, Deserialize)]
pub(super) struct ForestModel {
    members: Vec<Member>,
    num_classes: usize,
    oob_error: Option<f32>,
    importance: Vec<f32>,
    trained_on: usize,
}

impl ForestModel {
    pub(super) fn fit(
        examples: &[TrainingExample],
        num_classes: usize,
        config: &ForestConfig,
        seed: u64,
    ) -> Result<Self, String> {
        let x: Vec<&[f32]> = examples.iter().map(|e| e.features().as_slice()).collect();
        let y: Vec<usize> = examples.iter().map(|e| e.label().action()).collect();
        let n = examples.len();
        if n == 0 {
            return Err("no examples".to_string());
        }

        let grown: Vec<(Member, Vec<bool>)> = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|t| -> Result<(Member, Vec<bool>), String> {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let mut columns =
                    sample(&mut rng, FEATURE_DIMENSION, COLUMNS_PER_TREE).into_vec();
                columns.sort_unstable();

                let mut in_bag = vec![false; n];
                let rows: Vec<usize> = (0..n)
                    .map(|_| {
                        let r = rng.gen_range(0..n);
                        in_bag[r] = true;
                        r
                    })
                    .collect();
                let bagged: Vec<&[f32]> = rows.iter().map(|r| x[*r]).collect();
                let targets: Array1<usize> = rows.iter().map(|r| y[*r]).collect();
                let dataset = Dataset::new(project(&bagged, &columns)?, targets);

                let leaf = config.min_samples_leaf.max(1) as f32;
                let tree = DecisionTree::<f64, usize>::params()
                    .split_quality(SplitQuality::Gini)
                    .max_depth(Some(config.max_depth.max(1)))
                    .min_weight_split(2.0 * leaf)
                    .min_weight_leaf(leaf)
                    .fit(&dataset)
                    .map_err(|e| e.to_string())?;
                Ok((Member { columns, tree }, in_bag))
            })
            .collect::<Result<_, String>>()?;

        let mut importance = vec![0.0f32; FEATURE_DIMENSION];
        let mut oob_votes = vec![vec![0usize; num_classes]; n];
        for (member, in_bag) in &grown {
            for (column, value) in member.columns.iter().zip(member.tree.feature_importance()) {
                importance[*column] += value as f32;
            }
            let out_of_bag: Vec<usize> = (0..n).filter(|r| !in_bag[*r]).collect();
            if out_of_bag.is_empty() {
                continue;
            }
            let rows: Vec<&[f32]> = out_of_bag.iter().map(|r| x[*r]).collect();
            let predicted = member.predict_rows(&rows)?;
            for (row, class) in out_of_bag.iter().zip(predicted.iter()) {
                if let Some(slot) = oob_votes[*row].get_mut(*class) {
                    *slot += 1;
                }
            }
        }
        normalize(&mut importance);

        let (mut scored, mut wrong) = (0usize, 0usize);
        for (row, votes) in oob_votes.iter().enumerate() {
            if votes.iter().all(|v| *v == 0) {
                continue;
            }
            scored += 1;
            if majority(votes) != y[row] {
                wrong += 1;
            }
        }

        Ok(Self {
            members: grown.into_iter().map(|(member, _)| member).collect(),
            num_classes,
            oob_error: (scored > 0).then(|| wrong as f32 / scored as f32),
            importance,
            trained_on: n,
        })
    }

    pub(super) fn votes(&self, x: &[f32]) -> Vec<usize> {
        let mut votes = vec![0usize; self.num_classes];
        for member in &self.members {
            let Ok(predicted) = member.predict_rows(&[x]) else {
                continue;
            };
            if let Some(slot) = predicted.iter().next().and_then(|c| votes.get_mut(*c)) {
                *slot += 1;
            }
        }
        votes
    }

    pub(super) fn tree_count(&self) -> usize {
        self.members.len()
    }

    pub(super) fn oob_error(&self) -> Option<f32> {
        self.oob_error
    }

    pub(super) fn importance(&self) -> &[f32] {
        &self.importance
    }
}

/// Rows restricted to `columns`, widened to f64.
fn project(rows: &[&[f32]], columns: &[usize]) -> Result<Array2<f64>, String> {
    let mut flat = Vec::with_capacity(rows.len() * columns.len());
    for row in rows {
        for c in columns {
            flat.push(f64::from(row.get(*c).copied().unwrap_or(0.0)));
        }
    }
    Array2::from_shape_vec((rows.len(), columns.len()), flat).map_err(|e| e.to_string())
}
