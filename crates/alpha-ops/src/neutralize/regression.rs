//! Cross-sectional OLS neutralization.
//!
//! For each row, `y = α + β·x` is fitted by ordinary least squares over the
//! instruments where both `y` and `x` are valid. [`RegressionProj`] returns
//! the fitted values `α + β·x` and [`RegressionNeut`] the residuals
//! `y - (α + β·x)`. Entries where either input is NaN stay NaN, as does a row
//! whose `x` has zero variance over the jointly valid entries.

use crate::{Result, panel, registry::OperatorCategory, traits::Operator};
use ndarray::{Array, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Dimension};

/// Per-row regression output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Fitted,
    Residual,
}

/// Least squares `(α, β)` over the jointly valid entries of two rows.
fn ols(y: ArrayView1<'_, f64>, x: ArrayView1<'_, f64>) -> (f64, f64) {
    let pairs: Vec<(f64, f64)> = y
        .iter()
        .zip(x.iter())
        .filter(|(yv, xv)| !yv.is_nan() && !xv.is_nan())
        .map(|(&yv, &xv)| (yv, xv))
        .collect();
    if pairs.is_empty() {
        return (f64::NAN, f64::NAN);
    }

    let n = pairs.len() as f64;
    let mean_y = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_x = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxy, sxx) = pairs.iter().fold((0.0, 0.0), |(sxy, sxx), &(yv, xv)| {
        let dx = xv - mean_x;
        (sxy + dx * (yv - mean_y), sxx + dx * dx)
    });

    let beta = sxy / sxx;
    (mean_y - beta * mean_x, beta)
}

fn regress_rows(y: ArrayView2<'_, f64>, x: ArrayView2<'_, f64>, fit: Fit) -> Array2<f64> {
    panel::par_rows2(y, x, |yr, xr, mut out| {
        let (alpha, beta) = ols(yr, xr);
        for ((o, &yv), &xv) in out.iter_mut().zip(yr.iter()).zip(xr.iter()) {
            if yv.is_nan() || xv.is_nan() {
                continue;
            }
            let fitted = alpha + beta * xv;
            *o = match fit {
                Fit::Fitted => fitted,
                Fit::Residual => yv - fitted,
            };
        }
    })
}

/// Regression residual operator, `y - (α + β·x)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegressionNeut;

impl RegressionNeut {
    /// Apply to two rank-1 or rank-2 arrays of identical shape.
    pub fn apply<S1, S2, D>(
        &self,
        y: &ArrayBase<S1, D>,
        x: &ArrayBase<S2, D>,
    ) -> Result<Array<f64, D>>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows2(y, x, |ry, rx| Ok(regress_rows(ry, rx, Fit::Residual)))
    }
}

impl Operator for RegressionNeut {
    fn name(&self) -> &str {
        "regression_neut"
    }

    fn description(&self) -> &str {
        "Residual of a per-date OLS regression of y on x"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Neutralize
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(regress_rows(inputs[0], inputs[1], Fit::Residual))
    }
}

/// Regression fit operator, `α + β·x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegressionProj;

impl RegressionProj {
    /// Apply to two rank-1 or rank-2 arrays of identical shape.
    pub fn apply<S1, S2, D>(
        &self,
        y: &ArrayBase<S1, D>,
        x: &ArrayBase<S2, D>,
    ) -> Result<Array<f64, D>>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows2(y, x, |ry, rx| Ok(regress_rows(ry, rx, Fit::Fitted)))
    }
}

impl Operator for RegressionProj {
    fn name(&self) -> &str {
        "regression_proj"
    }

    fn description(&self) -> &str {
        "Fitted values of a per-date OLS regression of y on x"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Neutralize
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(regress_rows(inputs[0], inputs[1], Fit::Fitted))
    }
}

/// Regression residual of `y` on `x`; see [`RegressionNeut`].
pub fn regression_neut<S1, S2, D>(
    y: &ArrayBase<S1, D>,
    x: &ArrayBase<S2, D>,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    RegressionNeut.apply(y, x)
}

/// Regression fit of `y` on `x`; see [`RegressionProj`].
pub fn regression_proj<S1, S2, D>(
    y: &ArrayBase<S1, D>,
    x: &ArrayBase<S2, D>,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    RegressionProj.apply(y, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OperatorError;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_exact_line_has_zero_residual() {
        let x = arr1(&[1.0, 2.0, 3.0, 4.0]);
        let y = x.mapv(|v| 0.5 + 2.0 * v);

        let neut = regression_neut(&y, &x).unwrap();
        let proj = regression_proj(&y, &x).unwrap();
        assert!(neut.iter().all(|v| v.abs() < 1e-12));
        for (p, t) in proj.iter().zip(y.iter()) {
            assert_relative_eq!(*p, *t, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_residual_orthogonal_to_x() {
        let x = arr1(&[0.3, -1.2, 2.5, 0.0, 1.1]);
        let y = arr1(&[1.0, 0.4, -0.7, 2.2, 0.9]);
        let neut = regression_neut(&y, &x).unwrap();

        assert_relative_eq!(neut.sum(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(neut.dot(&x), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_proj_plus_neut_is_y() {
        let x = arr2(&[[1.0, 4.0, 2.0], [3.0, 1.0, 0.5]]);
        let y = arr2(&[[2.0, 1.0, 5.0], [0.1, 0.2, 0.9]]);
        let sum = regression_proj(&y, &x).unwrap() + regression_neut(&y, &x).unwrap();
        for (s, t) in sum.iter().zip(y.iter()) {
            assert_relative_eq!(*s, *t, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_nan_in_either_input() {
        let x = arr1(&[1.0, f64::NAN, 3.0, 4.0]);
        let y = arr1(&[2.0, 5.0, f64::NAN, 8.0]);
        let neut = regression_neut(&y, &x).unwrap();

        assert!(neut[1].is_nan());
        assert!(neut[2].is_nan());
        // two valid pairs fit exactly
        assert_relative_eq!(neut[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(neut[3], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_x_is_nan() {
        let out = regression_proj(&arr1(&[1.0, 2.0]), &arr1(&[3.0, 3.0])).unwrap();
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = regression_neut(&arr1(&[1.0, 2.0]), &arr1(&[1.0])).unwrap_err();
        assert!(matches!(err, OperatorError::ShapeMismatch { .. }));
    }
}
