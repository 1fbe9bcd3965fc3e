//! Booksize scaling.
//!
//! Formula: `x / sum(|x|) * scale`, so that the absolute values of each row
//! sum to `scale`. When `longscale` is set the positive entries are instead
//! scaled to sum to `longscale`; when `shortscale` is set the negative entries
//! are instead scaled to sum to `-shortscale`.
//!
//! A row whose divisor is zero (all zero, all missing, or an empty side)
//! produces NaN or infinite values, following the formula.

use crate::{OperatorError, Result, panel, registry::OperatorCategory, traits::Operator};
use ndarray::{Array, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Scale operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scale {
    /// Target sum of absolute values
    pub scale: f64,
    /// Target sum of the positive entries
    pub longscale: Option<f64>,
    /// Target absolute sum of the negative entries
    pub shortscale: Option<f64>,
}

impl Scale {
    /// Create a Scale operator with a unit book.
    pub const fn new() -> Self {
        Self {
            scale: 1.0,
            longscale: None,
            shortscale: None,
        }
    }

    /// Set the overall book size.
    pub const fn with_scale(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    /// Scale the long side to its own book.
    pub const fn with_longscale(self, longscale: f64) -> Self {
        Self {
            longscale: Some(longscale),
            ..self
        }
    }

    /// Scale the short side to its own book.
    pub const fn with_shortscale(self, shortscale: f64) -> Self {
        Self {
            shortscale: Some(shortscale),
            ..self
        }
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
        OperatorError::require(self.scale.is_finite(), "scale", "must be finite")?;
        OperatorError::require(
            self.longscale.is_none_or(f64::is_finite),
            "longscale",
            "must be finite",
        )?;
        OperatorError::require(
            self.shortscale.is_none_or(f64::is_finite),
            "shortscale",
            "must be finite",
        )
    }

    fn kernel(&self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        let config = *self;
        panel::par_rows(rows, move |row, out| config.scale_row(row, out))
    }

    fn scale_row(&self, row: ArrayView1<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        let valid = || row.iter().copied().filter(|v| !v.is_nan());
        let gross: f64 = valid().map(f64::abs).sum();
        let long: f64 = valid().filter(|&v| v > 0.0).sum();
        let short: f64 = -valid().filter(|&v| v < 0.0).sum::<f64>();

        out.zip_mut_with(&row, |o, &v| {
            *o = match (self.longscale, self.shortscale) {
                (Some(book), _) if v > 0.0 => v / long * book,
                (_, Some(book)) if v < 0.0 => v / short * book,
                _ => v / gross * self.scale,
            };
        });
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for Scale {
    fn name(&self) -> &str {
        "scale"
    }

    fn description(&self) -> &str {
        "Scale each cross-section so absolute values sum to the booksize"
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

/// Scale each cross-section to a booksize; see [`Scale`].
///
/// `longscale` and `shortscale` override the book of their side when set.
pub fn scale<S, D>(
    x: &ArrayBase<S, D>,
    scale: f64,
    longscale: Option<f64>,
    shortscale: Option<f64>,
) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    Scale {
        scale,
        longscale,
        shortscale,
    }
    .apply(x)
}
