//! One-sided book.
//!
//! `long` keeps non-negative values and zeroes the negatives; `short` keeps
//! non-positive values and zeroes the positives.

use crate::{Result, panel, reduce, registry::OperatorCategory, traits::Operator};
use derive_more::Display;
use ndarray::{Array, Array2, ArrayBase, ArrayView2, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Which side of the book to keep.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Keep non-negative values
    #[default]
    #[display("long")]
    Long,
    /// Keep non-positive values
    #[display("short")]
    Short,
}

/// One-side operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OneSide {
    /// Side to keep
    pub side: Side,
}

impl OneSide {
    /// Create a OneSide operator for the given side.
    pub const fn new(side: Side) -> Self {
        Self { side }
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
        match self.side {
            Side::Long => rows.mapv(|v| reduce::maximum(v, 0.0)),
            Side::Short => rows.mapv(|v| reduce::minimum(v, 0.0)),
        }
    }
}

impl Operator for OneSide {
    fn name(&self) -> &str {
        "one_side"
    }

    fn description(&self) -> &str {
        "Zero out the opposite side to make the alpha long-only or short-only"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Book
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(self.kernel(inputs[0]))
    }
}

/// Keep one side of each cross-section; see [`OneSide`].
pub fn one_side<S, D>(x: &ArrayBase<S, D>, side: Side) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    OneSide::new(side).apply(x)
}
