//! Cross-sectional percentile rank.
//!
//! Each valid value gets its fractional rank `1..=k` (ties share the average
//! rank) divided by the number of valid values `k`, so outputs lie in
//! `(0, 1]`. Missing values stay missing.

use crate::{
    Result, panel,
    reduce::{self, SortPrecision},
    registry::OperatorCategory,
    traits::Operator,
};
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Rank operator.
///
/// `rate = 0`, the default, requests an exact sort. A positive `rate` ranks
/// values after quantising them into `k * 10^rate` equal-width buckets over
/// the row range, so values sharing a bucket tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rank {
    /// Sort precision exponent; `0` is exact
    pub rate: u32,
}

impl Rank {
    /// Create a Rank operator that sorts exactly.
    pub const fn new() -> Self {
        Self { rate: 0 }
    }

    /// Alias of [`Rank::new`].
    pub const fn exact() -> Self {
        Self::new()
    }

    /// Create a Rank operator with a custom rate.
    pub const fn with_rate(rate: u32) -> Self {
        Self { rate }
    }

    /// Sort precision implied by the rate.
    pub const fn precision(&self) -> SortPrecision {
        SortPrecision::from_rate(self.rate)
    }

    /// Apply to a rank-1 or rank-2 array.
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows(x, |rows| Ok(self.kernel(rows)))
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        reduce::nanrank_pct(rows, self.precision())
    }
}

impl Default for Rank {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Rank {
    fn name(&self) -> &str {
        "rank"
    }

    fn description(&self) -> &str {
        "Cross-sectional percentile rank in (0, 1], ties averaged"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Ranking
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(self.kernel(inputs[0]))
    }
}

/// Percentile-rank each cross-section; see [`Rank`].
pub fn rank<S, D>(x: &ArrayBase<S, D>, rate: u32) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    Rank::with_rate(rate).apply(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(2)]
    fn test_rank_without_ties(#[case] rate: u32) {
        let x = arr1(&[30.0, 10.0, 40.0, 20.0]);
        let out = rank(&x, rate).unwrap();
        assert_eq!(out, arr1(&[0.75, 0.25, 1.0, 0.5]));
    }

    #[test]
    fn test_rank_preserves_nan() {
        let x = arr2(&[[3.0, f64::NAN, 1.0], [f64::NAN, f64::NAN, f64::NAN]]);
        let out = rank(&x, 0).unwrap();

        assert_relative_eq!(out[[0, 0]], 1.0);
        assert!(out[[0, 1]].is_nan());
        assert_relative_eq!(out[[0, 2]], 0.5);
        assert!(out.row(1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rank_ties_average() {
        let out = rank(&arr1(&[1.0, 2.0, 2.0, 3.0]), 0).unwrap();
        assert_eq!(out, arr1(&[0.25, 0.625, 0.625, 1.0]));
    }

    #[test]
    fn test_rank_single_value() {
        let out = rank(&arr1(&[f64::NAN, -4.0]), 0).unwrap();
        assert!(out[0].is_nan());
        assert_eq!(out[1], 1.0);
    }

    #[test]
    fn test_rank_precision_modes() {
        assert_eq!(Rank::default().precision(), SortPrecision::Exact);
        assert_eq!(Rank::exact(), Rank::default());
        assert_eq!(Rank::with_rate(2).precision(), SortPrecision::Bucketed { rate: 2 });
    }

    #[test]
    fn test_default_rank_separates_spread_values() {
        let x = arr2(&[[0.0, 1.0, 2.0, 1000.0]]);
        let out = Rank::default().apply(&x).unwrap();
        assert_eq!(out, arr2(&[[0.25, 0.5, 0.75, 1.0]]));

        // bucketing is opt-in and lumps the small values together
        let coarse = rank(&x, 2).unwrap();
        assert_eq!(coarse.row(0)[0], coarse.row(0)[2]);
    }
}
