//! Two-layer feed-forward network: ReLU hidden layer, linear output.
//!
//! Weights are stored flattened, row-major: `w1[i * hidden + h]` connects
//! input `i` to hidden unit `h`, `w2[h * output + o]` connects hidden unit
//! `h` to output `o`.

use rand::Rng;
use tactics_core::errors::{LearningError, StorageError};
use tactics_core::models::binary::{ByteReader, ByteWriter};

#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardNetwork {
    input: usize,
    hidden: usize,
    output: usize,
    learning_rate: f32,
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
}

/// Activations from a forward pass.
#[derive(Debug, Clone)]
pub struct Activations {
    pub hidden: Vec<f32>,
    pub output: Vec<f32>,
}

impl FeedForwardNetwork {
    /// Weights uniform in `±sqrt(2 / fan_in)`, biases zero.
    pub fn new<R: Rng + ?Sized>(
        input: usize,
        hidden: usize,
        output: usize,
        learning_rate: f32,
        rng: &mut R,
    ) -> Self {
        let w1 = init_layer(input, hidden, rng);
        let w2 = init_layer(hidden, output, rng);
        Self {
            input,
            hidden,
            output,
            learning_rate,
            w1,
            b1: vec![0.0; hidden],
            w2,
            b2: vec![0.0; output],
        }
    }

    pub fn input_size(&self) -> usize {
        self.input
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    pub fn output_size(&self) -> usize {
        self.output
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn forward(&self, x: &[f32]) -> Result<Activations, LearningError> {
        self.check_input(x)?;
        let mut hidden = self.b1.clone();
        for (i, xi) in x.iter().enumerate() {
            let row = &self.w1[i * self.hidden..(i + 1) * self.hidden];
            for (h, w) in hidden.iter_mut().zip(row) {
                *h += xi * w;
            }
        }
        for h in hidden.iter_mut() {
            *h = h.max(0.0);
        }

        let mut output = self.b2.clone();
        for (h, a) in hidden.iter().enumerate() {
            let row = &self.w2[h * self.output..(h + 1) * self.output];
            for (o, w) in output.iter_mut().zip(row) {
                *o += a * w;
            }
        }
        Ok(Activations { hidden, output })
    }

    /// Index of the highest output score. Ties resolve to the lowest index.
    pub fn best_action(&self, x: &[f32]) -> Result<usize, LearningError> {
        let out = self.forward(x)?.output;
        Ok(argmax(&out))
    }

    /// One SGD step on squared error. Returns the mean squared error before
    /// the update.
    pub fn train(&mut self, x: &[f32], target: &[f32]) -> Result<f32, LearningError> {
        if target.len() != self.output {
            return Err(LearningError::DimensionMismatch {
                expected: self.output,
                actual: target.len(),
            });
        }
        let Activations { hidden, output } = self.forward(x)?;

        let g_out: Vec<f32> = output
            .iter()
            .zip(target)
            .map(|(o, t)| 2.0 * (o - t))
            .collect();
        let loss = output
            .iter()
            .zip(target)
            .map(|(o, t)| (o - t) * (o - t))
            .sum::<f32>()
            / self.output as f32;

        let mut g_hidden = vec![0.0f32; self.hidden];
        for (h, g) in g_hidden.iter_mut().enumerate() {
            if hidden[h] <= 0.0 {
                continue;
            }
            let row = &self.w2[h * self.output..(h + 1) * self.output];
            *g = row.iter().zip(&g_out).map(|(w, go)| w * go).sum();
        }

        let lr = self.learning_rate;
        for (h, a) in hidden.iter().enumerate() {
            let row = &mut self.w2[h * self.output..(h + 1) * self.output];
            for (w, go) in row.iter_mut().zip(&g_out) {
                *w -= lr * go * a;
            }
        }
        for (b, go) in self.b2.iter_mut().zip(&g_out) {
            *b -= lr * go;
        }
        for (i, xi) in x.iter().enumerate() {
            let row = &mut self.w1[i * self.hidden..(i + 1) * self.hidden];
            for (w, gh) in row.iter_mut().zip(&g_hidden) {
                *w -= lr * gh * xi;
            }
        }
        for (b, gh) in self.b1.iter_mut().zip(&g_hidden) {
            *b -= lr * gh;
        }
        Ok(loss)
    }

    /// Element-wise deep copy of `other`'s parameters.
    pub fn copy_weights_from(&mut self, other: &FeedForwardNetwork) -> Result<(), LearningError> {
        if (self.input, self.hidden, self.output) != (other.input, other.hidden, other.output) {
            return Err(LearningError::DimensionMismatch {
                expected: self.w1.len() + self.w2.len(),
                actual: other.w1.len() + other.w2.len(),
            });
        }
        self.w1.copy_from_slice(&other.w1);
        self.b1.copy_from_slice(&other.b1);
        self.w2.copy_from_slice(&other.w2);
        self.b2.copy_from_slice(&other.b2);
        Ok(())
    }

    /// Sum of absolute first-layer weights per input, normalized to 1.
    pub fn input_saliency(&self) -> Vec<f32> {
        let mut scores: Vec<f32> = (0..self.input)
            .map(|i| {
                self.w1[i * self.hidden..(i + 1) * self.hidden]
                    .iter()
                    .map(|w| w.abs())
                    .sum()
            })
            .collect();
        normalize(&mut scores);
        scores
    }

    pub fn encode(&self) -> Vec<u8> {
        let floats = self.w1.len() + self.b1.len() + self.w2.len() + self.b2.len();
        let mut w = ByteWriter::with_capacity(16 + 16 + floats * 4);
        w.put_u32(self.input as u32);
        w.put_u32(self.hidden as u32);
        w.put_u32(self.output as u32);
        w.put_f32(self.learning_rate);
        w.put_f32_slice(&self.w1);
        w.put_f32_slice(&self.b1);
        w.put_f32_slice(&self.w2);
        w.put_f32_slice(&self.b2);
        w.into_inner()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        let mut r = ByteReader::new(bytes);
        let input = r.u32()? as usize;
        let hidden = r.u32()? as usize;
        let output = r.u32()? as usize;
        let learning_rate = r.f32()?;
        let w1 = r.f32_vec()?;
        let b1 = r.f32_vec()?;
        let w2 = r.f32_vec()?;
        let b2 = r.f32_vec()?;
        r.finish()?;

        let expected = [
            ("w1", input.checked_mul(hidden), w1.len()),
            ("b1", Some(hidden), b1.len()),
            ("w2", hidden.checked_mul(output), w2.len()),
            ("b2", Some(output), b2.len()),
        ];
        for (name, want, got) in expected {
            if want != Some(got) {
                return Err(StorageError::malformed(format!(
                    "{name} has {got} values, layout {input}x{hidden}x{output} needs {want:?}"
                )));
            }
        }
        Ok(Self {
            input,
            hidden,
            output,
            learning_rate,
            w1,
            b1,
            w2,
            b2,
        })
    }

    fn check_input(&self, x: &[f32]) -> Result<(), LearningError> {
        if x.len() == self.input {
            Ok(())
        } else {
            Err(LearningError::DimensionMismatch {
                expected: self.input,
                actual: x.len(),
            })
        }
    }
}

fn init_layer<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Vec<f32> {
    let scale = (2.0 / fan_in.max(1) as f32).sqrt();
    (0..fan_in * fan_out)
        .map(|_| (rng.gen::<f32>() - 0.5) * 2.0 * scale)
        .collect()
}

pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn normalize(values: &mut [f32]) {
    let total: f32 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}
