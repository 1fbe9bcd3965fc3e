//! Min-max scaling.
//!
//! Formula: `(x - min) / (max - min) - constant`, with `min` and `max` taken
//! over the valid entries of each row. A constant row divides zero by zero
//! and produces NaN.

use crate::{
    OperatorError, Result, panel,
    reduce::Reduction,
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use serde::{Deserialize, Serialize};

/// ScaleDown operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScaleDown {
    /// Offset subtracted from the scaled values
    pub constant: f64,
}

impl ScaleDown {
    /// Create a ScaleDown operator with the given offset.
    pub const fn new(constant: f64) -> Self {
        Self { constant }
    }

    /// Apply to a rank-1 or rank-2 array.
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.validate()?;
        panel::map_rows(x, |rows| Ok(self.kernel(rows)))
    }

    fn validate(&self) -> Result<()> {
        OperatorError::require(self.constant.is_finite(), "constant", "must be finite")
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let lo = Reduction::Min.rows(rows);
        let hi = Reduction::Max.rows(rows);
        (&rows - &lo) / (&hi - &lo) - self.constant
    }
}

impl Operator for ScaleDown {
    fn name(&self) -> &str {
        "scale_down"
    }

    fn description(&self) -> &str {
        "Map each cross-section onto [0, 1] by min-max scaling, minus a constant"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Book
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        self.validate()?;
        Ok(self.kernel(inputs[0]))
    }
}

/// Min-max scale each cross-section; see [`ScaleDown`].
pub fn scale_down<S, D>(x: &ArrayBase<S, D>, constant: f64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    ScaleDown::new(constant).apply(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_unit_range() {
        let x = arr1(&[2.0, 4.0, f64::NAN, 6.0]);
        let out = scale_down(&x, 0.0).unwrap();

        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 0.5);
        assert!(out[2].is_nan());
        assert_relative_eq!(out[3], 1.0);
    }

    #[test]
    fn test_constant_offset() {
        let x = arr2(&[[1.0, 3.0], [-5.0, 5.0]]);
        let out = scale_down(&x, 0.5).unwrap();
        assert_eq!(out, arr2(&[[-0.5, 0.5], [-0.5, 0.5]]));
    }

    #[test]
    fn test_constant_row_is_nan() {
        let out = scale_down(&arr1(&[3.0, 3.0, 3.0]), 0.0).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }
}
