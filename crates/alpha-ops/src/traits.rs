//! Core trait definitions for operators.
//!
//! Every operator has a typed, generic entry point (`apply` on its config
//! struct) and implements the object-safe [`Operator`] trait so that it can be
//! looked up by name and composed at runtime.

use crate::{OperatorCategory, OperatorError, Result, panel};
use ndarray::{Array2, ArrayView2};

/// A cross-sectional operator over `[dates, instruments]` panels.
///
/// Each row of every input is one date's cross-section; the output has the
/// shape of the inputs and row `d` depends only on row `d` of the inputs.
pub trait Operator: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this operator.
    ///
    /// Snake_case, matching the free function of the same name.
    fn name(&self) -> &str;

    /// Human-readable description of the transform.
    fn description(&self) -> &str;

    /// Operator category for grouping.
    fn category(&self) -> OperatorCategory;

    /// Number of input panels.
    fn arity(&self) -> usize {
        1
    }

    /// Current configuration as JSON, `null` for parameterless operators.
    fn parameters(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Compute the output from inputs already checked for count and shape.
    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>>;

    /// Compute the output panel.
    ///
    /// Checks the input count against [`Operator::arity`] and that all
    /// inputs share a shape, then delegates to [`Operator::compute_rows`].
    fn compute(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        if inputs.len() != self.arity() {
            return Err(OperatorError::InvalidArity {
                operator: self.name().to_string(),
                expected: self.arity(),
                found: inputs.len(),
            });
        }
        let shapes: Vec<&[usize]> = inputs.iter().map(|x| x.shape()).collect();
        panel::ensure_same_shape(&shapes)?;
        self.compute_rows(inputs)
    }
}
