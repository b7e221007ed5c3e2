//! Fixed-topology feed-forward evaluator.
//!
//! Each layer is a row-major weight matrix (`output_size x input_size`) and a
//! bias vector. Every layer, including the final one, applies an affine
//! transform followed by a saturating sigmoid; the final layer always has a
//! single output, so raw evaluations lie in (0, 1).
//!
//! Raw outputs carry no sign convention. [`NeuralEvaluator::clamped_evaluation`]
//! linearly remaps them into [-1, 1] using empirically fuzzed bounds.

use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::core::{self, GameRng, LoadError, TrainerError};

use super::identity::{EvaluatorId, IdAllocator};
use super::traits::Evaluator;

/// Sigmoid inputs are clamped to +/- this value.
const SIGMOID_SATURATION: f32 = 60.0;

/// Raw output reported for an encoding of the wrong length.
const NEUTRAL_RAW: f32 = 0.5;

/// Output error is clamped to +/- this value during training.
const MAX_TRAINING_ERROR: f32 = 1000.0;

#[inline]
fn sigmoid(x: f32) -> f32 {
    let x = x.clamp(-SIGMOID_SATURATION, SIGMOID_SATURATION);
    1.0 / (1.0 + (-x).exp())
}

/// One dense layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// Layer with weights and biases drawn uniformly from [-1, 1).
    fn random(input_size: usize, output_size: usize, rng: &mut GameRng) -> Self {
        Self {
            weights: (0..input_size * output_size).map(|_| rng.uniform(-1.0, 1.0)).collect(),
            biases: (0..output_size).map(|_| rng.uniform(-1.0, 1.0)).collect(),
        }
    }

    /// Build a layer from raw parameters.
    ///
    /// The weight count must be a multiple of the (non-zero) bias count.
    pub fn from_parts(weights: Vec<f32>, biases: Vec<f32>) -> Result<Self, LoadError> {
        if biases.is_empty() {
            return Err(LoadError::Shape("layer has no outputs".into()));
        }
        if weights.is_empty() || weights.len() % biases.len() != 0 {
            return Err(LoadError::Shape(format!(
                "{} weights do not form a matrix with {} rows",
                weights.len(),
                biases.len()
            )));
        }
        Ok(Self { weights, biases })
    }

    /// Number of inputs.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.weights.len() / self.biases.len()
    }

    /// Number of outputs.
    #[must_use]
    pub fn output_size(&self) -> usize {
        self.biases.len()
    }

    /// Row-major weights.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Biases.
    #[must_use]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Affine transform followed by sigmoid. `input` must be `input_size()` long.
    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let input_size = self.input_size();
        self.weights
            .chunks_exact(input_size)
            .zip(&self.biases)
            .map(|(row, bias)| {
                let z = row.iter().zip(input).fold(*bias, |acc, (w, x)| acc + w * x);
                sigmoid(z)
            })
            .collect()
    }
}

/// Empirically observed range of raw evaluations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalBounds {
    pub min: f32,
    pub max: f32,
}

impl EvalBounds {
    /// Create bounds from a min/max pair.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate bounds cannot remap anything.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Map a raw value into [-1, 1]. Degenerate bounds map to 0.
    #[must_use]
    pub fn clamp(&self, raw: f32) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        let normalized = 2.0 * (raw - self.min) / (self.max - self.min) - 1.0;
        normalized.clamp(-1.0, 1.0)
    }

    /// Inverse of [`clamp`](Self::clamp) for values inside [-1, 1].
    #[must_use]
    pub fn unclamp(&self, clamped: f32) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        let clamped = clamped.clamp(-1.0, 1.0);
        (clamped + 1.0) / 2.0 * (self.max - self.min) + self.min
    }
}

impl Default for EvalBounds {
    fn default() -> Self {
        Self { min: -1.0, max: 1.0 }
    }
}

/// Trainable position evaluator.
///
/// `Clone` keeps the identity (lineage tracking); use
/// [`clone_with_new_id`](Self::clone_with_new_id) or
/// [`mutate`](Self::mutate) for a new lineage member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuralEvaluator {
    id: EvaluatorId,
    layers: Vec<Layer>,
    bounds: EvalBounds,
    bounds_known: bool,
}

impl NeuralEvaluator {
    /// Create a randomly initialised evaluator.
    ///
    /// `hidden_layers` lists the hidden layer widths; a single-output layer is
    /// always appended.
    pub fn new(input_size: usize, hidden_layers: &[usize], ids: &IdAllocator, rng: &mut GameRng) -> Self {
        let mut layers = Vec::with_capacity(hidden_layers.len() + 1);
        let mut prev = input_size;
        for &width in hidden_layers {
            layers.push(Layer::random(prev, width, rng));
            prev = width;
        }
        layers.push(Layer::random(prev, 1, rng));

        Self {
            id: ids.allocate(),
            layers,
            bounds: EvalBounds::default(),
            bounds_known: false,
        }
    }

    /// Assemble an evaluator from already validated parts.
    ///
    /// Consecutive layers must connect and the last layer must have exactly
    /// one output.
    pub fn from_parts(
        id: EvaluatorId,
        layers: Vec<Layer>,
        bounds: EvalBounds,
        bounds_known: bool,
    ) -> Result<Self, LoadError> {
        let Some(last) = layers.last() else {
            return Err(LoadError::Shape("network has no layers".into()));
        };
        if last.output_size() != 1 {
            return Err(LoadError::Shape(format!(
                "final layer has {} outputs, expected 1",
                last.output_size()
            )));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(LoadError::Shape(format!(
                    "layer {} outputs {} values but layer {} expects {}",
                    i,
                    pair[0].output_size(),
                    i + 1,
                    pair[1].input_size()
                )));
            }
        }

        Ok(Self {
            id,
            layers,
            bounds,
            bounds_known,
        })
    }

    /// Lineage identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> EvaluatorId {
        self.id
    }

    /// Length of the expected input encoding.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    /// Layers in feed-forward order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers, including the output layer.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total number of weights.
    #[must_use]
    pub fn weight_count(&self) -> usize {
        self.layers.iter().map(|l| l.weights.len()).sum()
    }

    /// Total number of biases.
    #[must_use]
    pub fn bias_count(&self) -> usize {
        self.layers.iter().map(|l| l.biases.len()).sum()
    }

    /// Current clamping bounds.
    #[must_use]
    pub fn bounds(&self) -> EvalBounds {
        self.bounds
    }

    /// Whether the bounds were fuzzed for this exact set of parameters.
    #[must_use]
    pub fn bounds_known(&self) -> bool {
        self.bounds_known
    }

    /// Install fuzzed bounds.
    pub fn set_bounds(&mut self, bounds: EvalBounds) {
        self.bounds = bounds;
        self.bounds_known = true;
    }

    /// Feed-forward pass. Output lies in (0, 1).
    #[must_use]
    pub fn evaluate(&self, input: &[f32]) -> f32 {
        self.forward(input).unwrap_or(NEUTRAL_RAW)
    }

    /// Raw output remapped into [-1, 1] by the current bounds.
    ///
    /// Returns 0 when the bounds are degenerate or the input has the wrong length.
    #[must_use]
    pub fn clamped_evaluation(&self, input: &[f32]) -> f32 {
        self.forward(input).map_or(0.0, |raw| self.bounds.clamp(raw))
    }

    /// Fails with [`TrainerError::InputSize`] unless encodings of length `len`
    /// fit the input layer.
    pub fn ensure_input_size(&self, len: usize) -> core::Result<()> {
        if len == self.input_size() {
            Ok(())
        } else {
            Err(TrainerError::InputSize {
                evaluator: self.input_size(),
                game: len,
            })
        }
    }

    /// Feed-forward pass, or `None` when `input` does not match the input layer.
    fn forward(&self, input: &[f32]) -> Option<f32> {
        if input.len() != self.input_size() {
            warn!(id = %self.id, expected = self.input_size(), got = input.len(), "encoding length mismatch");
            return None;
        }
        let mut activation = input.to_vec();
        for layer in &self.layers {
            activation = layer.forward(&activation);
        }
        activation.first().copied()
    }

    /// Map a clamped value back into raw output space.
    #[must_use]
    pub fn unclamp_evaluation(&self, clamped: f32) -> f32 {
        self.bounds.unclamp(clamped)
    }

    /// Identical copy under a fresh identity.
    #[must_use]
    pub fn clone_with_new_id(&self, ids: &IdAllocator) -> Self {
        let mut clone = self.clone();
        clone.id = ids.allocate();
        clone
    }

    /// Perturbed copy under a fresh identity.
    ///
    /// Adds standard normal noise to `min(weight_mutations, weight_count)`
    /// distinct weights and `min(bias_mutations, bias_count)` distinct biases.
    /// The copy's bounds are marked unknown; `self` is left untouched.
    #[must_use]
    pub fn mutate(
        &self,
        weight_mutations: usize,
        bias_mutations: usize,
        ids: &IdAllocator,
        rng: &mut GameRng,
    ) -> Self {
        let mut child = self.clone_with_new_id(ids);

        let picked = rng.sample_indices(child.weight_count(), weight_mutations);
        let mut weights: Vec<&mut f32> = child.layers.iter_mut().flat_map(|l| l.weights.iter_mut()).collect();
        for i in picked {
            *weights[i] += rng.standard_normal();
        }

        let picked = rng.sample_indices(child.bias_count(), bias_mutations);
        let mut biases: Vec<&mut f32> = child.layers.iter_mut().flat_map(|l| l.biases.iter_mut()).collect();
        for i in picked {
            *biases[i] += rng.standard_normal();
        }

        child.bounds_known = false;
        child
    }

    /// One squared-error backpropagation step towards `target` for a single
    /// sample. The output error is clamped before propagation.
    ///
    /// Marks the bounds unknown, since they no longer match the parameters.
    /// An input of the wrong length is rejected without touching the network.
    pub fn train_single(&mut self, input: &[f32], target: f32, learning_rate: f32) -> core::Result<()> {
        self.ensure_input_size(input.len())?;
        self.bounds_known = false;

        // activations[0] is the input, activations[l + 1] the output of layer l
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(input.to_vec());
        for layer in &self.layers {
            let next = layer.forward(&activations[activations.len() - 1]);
            activations.push(next);
        }

        let output = activations[activations.len() - 1][0];
        let error = (output - target).clamp(-MAX_TRAINING_ERROR, MAX_TRAINING_ERROR);

        let mut delta = vec![error * output * (1.0 - output)];
        for l in (0..self.layers.len()).rev() {
            let prev = &activations[l];
            let layer = &mut self.layers[l];
            let input_size = layer.input_size();

            // Propagate with the weights as they were before this update
            let prev_delta = if l > 0 {
                let mut back = vec![0.0f32; input_size];
                for (row, d) in layer.weights.chunks_exact(input_size).zip(&delta) {
                    for (b, w) in back.iter_mut().zip(row) {
                        *b += w * d;
                    }
                }
                back.iter_mut().zip(prev).for_each(|(b, a)| *b *= a * (1.0 - a));
                Some(back)
            } else {
                None
            };

            for ((row, bias), d) in layer
                .weights
                .chunks_exact_mut(input_size)
                .zip(layer.biases.iter_mut())
                .zip(&delta)
            {
                for (w, a) in row.iter_mut().zip(prev) {
                    *w -= learning_rate * d * a;
                }
                *bias -= learning_rate * d;
            }

            match prev_delta {
                Some(next) => delta = next,
                None => break,
            }
        }
        Ok(())
    }
}

impl Evaluator for NeuralEvaluator {
    fn evaluate(&self, encoding: &[f32]) -> f32 {
        NeuralEvaluator::evaluate(self, encoding)
    }

    fn clamped_evaluation(&self, encoding: &[f32]) -> f32 {
        NeuralEvaluator::clamped_evaluation(self, encoding)
    }
}
