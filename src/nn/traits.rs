//! Evaluator trait consumed by search and match play.
//!
//! Search and the trainer's move choosers only need two numbers from a
//! position encoding: the raw network output and the clamped [-1, 1] value.
//! Anything that can produce those can drive a search.

/// Position scorer.
pub trait Evaluator: Send + Sync {
    /// Raw output for an encoded position.
    fn evaluate(&self, encoding: &[f32]) -> f32;

    /// Output remapped into [-1, 1], from player 1's perspective.
    fn clamped_evaluation(&self, encoding: &[f32]) -> f32;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(&self, encoding: &[f32]) -> f32 {
        (**self).evaluate(encoding)
    }

    fn clamped_evaluation(&self, encoding: &[f32]) -> f32 {
        (**self).clamped_evaluation(encoding)
    }
}

/// Evaluator returning fixed values regardless of input (baseline for testing).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstantEvaluator {
    raw: f32,
    clamped: f32,
}

impl ConstantEvaluator {
    /// Create an evaluator with the given raw and clamped outputs.
    ///
    /// The clamped value is limited to [-1, 1].
    pub fn new(raw: f32, clamped: f32) -> Self {
        Self {
            raw,
            clamped: clamped.clamp(-1.0, 1.0),
        }
    }

    /// Evaluator whose raw and clamped outputs are both `value`.
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value)
    }
}

impl Evaluator for ConstantEvaluator {
    fn evaluate(&self, _encoding: &[f32]) -> f32 {
        self.raw
    }

    fn clamped_evaluation(&self, _encoding: &[f32]) -> f32 {
        self.clamped
    }
}

/// Evaluator that scores the sum of the encoding (baseline for testing).
///
/// Useful for search tests that need positions to differ in value without
/// training a network.
#[derive(Clone, Copy, Debug, Default)]
pub struct SumEvaluator;

impl Evaluator for SumEvaluator {
    fn evaluate(&self, encoding: &[f32]) -> f32 {
        encoding.iter().sum()
    }

    fn clamped_evaluation(&self, encoding: &[f32]) -> f32 {
        self.evaluate(encoding).tanh()
    }
}
