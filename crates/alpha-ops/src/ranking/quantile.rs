//! Rank-based quantile transform.
//!
//! Each row is ranked, the ranks are shifted into the open unit interval with
//! the plotting position `p = (r - 0.5) / k`, and `p` is mapped through the
//! inverse CDF of the chosen driver distribution:
//!
//! - `gaussian`: `N(0, sigma)` quantile
//! - `cauchy`: `Cauchy(0, sigma)` quantile, `sigma * tan(π (p - 0.5))`
//! - `uniform`: `p - mean(p)`

use crate::{
    OperatorError, Result, panel,
    reduce::{self, SortPrecision},
    registry::OperatorCategory,
    traits::Operator,
};
use derive_more::Display;
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

/// Target distribution of the quantile transform.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// Standard normal scaled by sigma
    #[default]
    #[display("gaussian")]
    Gaussian,
    /// Standard Cauchy scaled by sigma
    #[display("cauchy")]
    Cauchy,
    /// Demeaned uniform ranks
    #[display("uniform")]
    Uniform,
}

/// Quantile operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Quantile {
    /// Driver distribution
    pub driver: Driver,
    /// Scale of the driver distribution
    pub sigma: f64,
}

impl Quantile {
    /// Create a Gaussian quantile operator with unit sigma.
    pub const fn new() -> Self {
        Self {
            driver: Driver::Gaussian,
            sigma: 1.0,
        }
    }

    /// Select the driver distribution.
    pub const fn with_driver(self, driver: Driver) -> Self {
        Self { driver, ..self }
    }

    /// Set the driver scale.
    pub const fn with_sigma(self, sigma: f64) -> Self {
        Self { sigma, ..self }
    }

    /// Apply to a rank-1 or rank-2 array.
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.validate()?;
        panel::map_rows(x, |rows| self.kernel(rows))
    }

    fn validate(&self) -> Result<()> {
        OperatorError::require(
            self.sigma.is_finite() && self.sigma > 0.0,
            "sigma",
            "must be finite and positive",
        )
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let normal = Normal::new(0.0, self.sigma).map_err(|e| OperatorError::InvalidParameter {
            name: "sigma",
            reason: e.to_string(),
        })?;
        let (driver, sigma) = (self.driver, self.sigma);

        Ok(panel::par_rows(rows, |row, mut out| {
            let entries = reduce::valid_entries(row);
            let k = entries.len() as f64;
            // percentile rank r / k shifted to (r - 0.5) / k
            let shifted: Vec<(usize, f64)> =
                reduce::percentile_ranks(&entries, SortPrecision::Exact)
                    .into_iter()
                    .map(|(pos, pct)| (pos, pct - 0.5 / k))
                    .collect();
            let center = shifted.iter().map(|&(_, p)| p).sum::<f64>() / k;

            for (pos, p) in shifted {
                out[pos] = match driver {
                    Driver::Gaussian => normal.inverse_cdf(p),
                    Driver::Cauchy => sigma * (PI * (p - 0.5)).tan(),
                    Driver::Uniform => p - center,
                };
            }
        }))
    }
}

impl Default for Quantile {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Quantile {
    fn name(&self) -> &str {
        "quantile"
    }

    fn description(&self) -> &str {
        "Rank, shift into (0, 1), then map through a gaussian, cauchy or uniform quantile"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Ranking
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        self.validate()?;
        self.kernel(inputs[0])
    }
}

/// Quantile-transform each cross-section; see [`Quantile`].
pub fn quantile<S, D>(x: &ArrayBase<S, D>, driver: Driver, sigma: f64) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    Quantile::new().with_driver(driver).with_sigma(sigma).apply(x)
}
