//! Geometric minus arithmetic mean of three cross-sectional ranks.
//!
//! With `a`, `b`, `c` the percentile ranks of the three inputs,
//! `out = cbrt(a · b · c) - (a + b + c) / 3`. By the AM-GM inequality the
//! result is never positive and is zero exactly when the three ranks agree,
//! so it scores how consistently an instrument is ranked across the inputs.

use crate::{
    Result, panel,
    reduce::{self, SortPrecision},
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension, Zip};

/// Rank geometric/arithmetic mean difference operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankGmeanAmeanDiff;

impl RankGmeanAmeanDiff {
    /// Apply to three rank-1 or rank-2 arrays of identical shape.
    pub fn apply<S1, S2, S3, D>(
        &self,
        a: &ArrayBase<S1, D>,
        b: &ArrayBase<S2, D>,
        c: &ArrayBase<S3, D>,
    ) -> Result<Array<f64, D>>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        S3: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows3(a, b, c, |ra, rb, rc| Ok(Self::kernel(ra, rb, rc)))
    }

    fn kernel(
        a: ArrayView2<'_, f64>,
        b: ArrayView2<'_, f64>,
        c: ArrayView2<'_, f64>,
    ) -> Array2<f64> {
        let ra = reduce::nanrank_pct(a, SortPrecision::Exact);
        let rb = reduce::nanrank_pct(b, SortPrecision::Exact);
        let rc = reduce::nanrank_pct(c, SortPrecision::Exact);
        Zip::from(&ra)
            .and(&rb)
            .and(&rc)
            .map_collect(|&x, &y, &z| (x * y * z).cbrt() - (x + y + z) / 3.0)
    }
}

impl Operator for RankGmeanAmeanDiff {
    fn name(&self) -> &str {
        "rank_gmean_amean_diff"
    }

    fn description(&self) -> &str {
        "Geometric mean minus arithmetic mean of the cross-sectional ranks of three inputs"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Ranking
    }

    fn arity(&self) -> usize {
        3
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(Self::kernel(inputs[0], inputs[1], inputs[2]))
    }
}

/// Rank agreement score of three inputs; see [`RankGmeanAmeanDiff`].
pub fn rank_gmean_amean_diff<S1, S2, S3, D>(
    input1: &ArrayBase<S1, D>,
    input2: &ArrayBase<S2, D>,
    input3: &ArrayBase<S3, D>,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    S3: Data<Elem = f64>,
    D: Dimension,
{
    RankGmeanAmeanDiff.apply(input1, input2, input3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OperatorError;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn test_identical_rankings_score_zero() {
        let a = arr1(&[1.0, 2.0, 3.0]);
        let b = arr1(&[10.0, 20.0, 30.0]);
        let c = arr1(&[-3.0, 0.0, 8.0]);
        let out = rank_gmean_amean_diff(&a, &b, &c).unwrap();
        assert!(out.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_disagreement_is_negative() {
        let a = arr1(&[1.0, 2.0]);
        let b = arr1(&[2.0, 1.0]);
        let out = rank_gmean_amean_diff(&a, &b, &a).unwrap();

        // ranks (0.5, 1.0, 0.5) for the first instrument
        let expected = (0.25_f64).cbrt() - 2.0 / 3.0;
        assert_relative_eq!(out[0], expected, epsilon = 1e-12);
        assert!(out[0] < 0.0);
    }

    #[test]
    fn test_nan_in_any_input() {
        let a = arr2(&[[1.0, f64::NAN, 3.0]]);
        let b = arr2(&[[1.0, 2.0, 3.0]]);
        let out = rank_gmean_amean_diff(&a, &b, &b).unwrap();
        assert!(out[[0, 1]].is_nan());
        assert!(!out[[0, 2]].is_nan());
    }

    #[test]
    fn test_shape_mismatch() {
        let a = arr2(&[[1.0, 2.0]]);
        let b = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let err = rank_gmean_amean_diff(&a, &a, &b).unwrap_err();
        assert!(matches!(err, OperatorError::ShapeMismatch { .. }));
    }
}
