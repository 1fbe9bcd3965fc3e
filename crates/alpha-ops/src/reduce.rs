//! NaN-aware reductions and ranking.
//!
//! This is the numeric layer every operator is built on. Each reduction
//! ignores NaN entries; a row with no valid entries reduces to NaN (or to
//! zero for [`Reduction::Sum`] and [`Reduction::Count`]) without panicking.
//!
//! Rank-2 inputs reduce to a `[rows, 1]` column that broadcasts back across
//! the row width. Rank-1 inputs reduce to a scalar.

use crate::{OperatorError, Result, panel};
use derive_more::Display;
use ndarray::{
    Array1, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Data, Dimension, Ix1,
};
use serde::{Deserialize, Serialize};

/// Delta degrees of freedom for standard deviation.
///
/// The denominator is `k - ddof` where `k` is the count of valid entries.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ddof {
    /// ddof = 0
    Population,
    /// ddof = 1
    Sample,
}

impl Ddof {
    /// Numeric value subtracted from the count.
    pub const fn value(self) -> usize {
        match self {
            Self::Population => 0,
            Self::Sample => 1,
        }
    }
}

/// A NaN-aware reduction over one cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Arithmetic mean of valid entries
    Mean,
    /// Standard deviation of valid entries
    Std(Ddof),
    /// Sum of valid entries; zero for an empty row
    Sum,
    /// Number of valid entries
    Count,
    /// Smallest valid entry
    Min,
    /// Largest valid entry
    Max,
}

/// Result of reducing a rank-1 or rank-2 array.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduced {
    /// Reduction of a rank-1 array
    Scalar(f64),
    /// Per-row reductions of a rank-2 array, shape `[rows, 1]`
    Column(Array2<f64>),
}

impl Reduced {
    /// The scalar value, if this came from a rank-1 input.
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Column(_) => None,
        }
    }

    /// The per-row column, promoting a scalar to a `[1, 1]` column.
    pub fn into_column(self) -> Array2<f64> {
        match self {
            Self::Scalar(v) => Array2::from_elem((1, 1), v),
            Self::Column(col) => col,
        }
    }
}

impl Reduction {
    /// Reduce a rank-1 or rank-2 array.
    pub fn apply<S, D>(self, x: &ArrayBase<S, D>) -> Result<Reduced>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        match x.ndim() {
            1 => Ok(Reduced::Scalar(
                self.of_row(x.view().into_dimensionality::<Ix1>()?),
            )),
            2 => Ok(Reduced::Column(self.rows(panel::as_rows(x)?))),
            rank => Err(OperatorError::InvalidRank(rank)),
        }
    }

    /// Reduce every row of a panel into a `[rows, 1]` column.
    pub fn rows(self, rows: ArrayView2<'_, f64>) -> Array2<f64> {
        if tracing::enabled!(tracing::Level::TRACE) {
            let empty = rows
                .rows()
                .into_iter()
                .filter(|row| row.iter().all(|v| v.is_nan()))
                .count();
            if empty > 0 {
                tracing::trace!(reduction = ?self, empty, "rows without valid entries");
            }
        }
        let col: Array1<f64> = rows.rows().into_iter().map(|row| self.of_row(row)).collect();
        col.insert_axis(Axis(1))
    }

    /// Reduce a single cross-section.
    pub fn of_row(self, row: ArrayView1<'_, f64>) -> f64 {
        let valid = || row.iter().copied().filter(|v| !v.is_nan());
        match self {
            Self::Mean => mean(valid()),
            Self::Std(ddof) => {
                let m = mean(valid());
                let (n, ss) = valid()
                    .fold((0usize, 0.0), |(n, ss), v| (n + 1, ss + (v - m).powi(2)));
                if n <= ddof.value() {
                    f64::NAN
                } else {
                    (ss / (n - ddof.value()) as f64).sqrt()
                }
            }
            Self::Sum => valid().sum(),
            Self::Count => valid().count() as f64,
            Self::Min => valid().reduce(f64::min).unwrap_or(f64::NAN),
            Self::Max => valid().reduce(f64::max).unwrap_or(f64::NAN),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (n, sum) = values.fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// Sort precision used when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortPrecision {
    /// Full comparison sort
    Exact,
    /// Values are first quantised into `k * 10^rate` equal-width buckets
    /// spanning the row range; values sharing a bucket tie.
    Bucketed {
        /// Precision exponent
        rate: u32,
    },
}

impl SortPrecision {
    /// Bucket exponents above this are clamped.
    const MAX_RATE: u32 = 12;

    /// `rate = 0` requests an exact sort.
    pub const fn from_rate(rate: u32) -> Self {
        if rate == 0 {
            Self::Exact
        } else {
            Self::Bucketed { rate }
        }
    }
}

/// Fractional ranks of `(position, key)` pairs.
///
/// Ranks run `1..=k`; tied keys share the average of the ranks they span.
fn average_ranks(mut keyed: Vec<(usize, f64)>) -> Vec<(usize, f64)> {
    keyed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = Vec::with_capacity(keyed.len());
    let mut start = 0;
    while start < keyed.len() {
        let mut end = start + 1;
        while end < keyed.len() && keyed[end].1 == keyed[start].1 {
            end += 1;
        }
        // sorted positions start..end hold ranks start+1..=end
        let rank = (start + 1 + end) as f64 / 2.0;
        ranks.extend(keyed[start..end].iter().map(|&(pos, _)| (pos, rank)));
        start = end;
    }
    ranks
}

fn bucket_keys(entries: &[(usize, f64)], rate: u32) -> Option<Vec<(usize, f64)>> {
    let (lo, hi) = entries
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
    let range = hi - lo;
    if !(range.is_finite() && range > 0.0) {
        return None;
    }

    let buckets = entries.len() as f64 * 10f64.powi(rate.min(SortPrecision::MAX_RATE) as i32);
    Some(
        entries
            .iter()
            .map(|&(pos, v)| (pos, ((v - lo) / range * buckets).floor().min(buckets - 1.0)))
            .collect(),
    )
}

/// Percentile ranks of `(position, value)` pairs, in `(0, 1]`.
///
/// Values must be non-NaN. The result holds one `(position, rank / k)` pair
/// per entry, in no particular order.
pub(crate) fn percentile_ranks(
    entries: &[(usize, f64)],
    precision: SortPrecision,
) -> Vec<(usize, f64)> {
    let k = entries.len() as f64;
    let keyed = match precision {
        SortPrecision::Exact => entries.to_vec(),
        SortPrecision::Bucketed { rate } => {
            bucket_keys(entries, rate).unwrap_or_else(|| entries.to_vec())
        }
    };
    average_ranks(keyed)
        .into_iter()
        .map(|(pos, rank)| (pos, rank / k))
        .collect()
}

/// Valid `(position, value)` entries of a row.
pub(crate) fn valid_entries(row: ArrayView1<'_, f64>) -> Vec<(usize, f64)> {
    row.iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .collect()
}

/// Write the percentile ranks of one row into `out`, leaving NaN slots NaN.
pub(crate) fn rank_row_into(
    row: ArrayView1<'_, f64>,
    mut out: ArrayViewMut1<'_, f64>,
    precision: SortPrecision,
) {
    for (pos, pct) in percentile_ranks(&valid_entries(row), precision) {
        out[pos] = pct;
    }
}

/// Fractional ranks `1..=k` of every row, NaN preserved.
pub fn nanrank(rows: ArrayView2<'_, f64>) -> Array2<f64> {
    panel::par_rows(rows, |row, mut out| {
        for (pos, rank) in average_ranks(valid_entries(row)) {
            out[pos] = rank;
        }
    })
}

/// Percentile ranks `rank / k` of every row, in `(0, 1]`, NaN preserved.
pub fn nanrank_pct(rows: ArrayView2<'_, f64>, precision: SortPrecision) -> Array2<f64> {
    panel::par_rows(rows, |row, out| rank_row_into(row, out, precision))
}

/// Element-wise clip that propagates NaN from the value or either bound.
pub(crate) fn clip(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() || lo.is_nan() || hi.is_nan() {
        f64::NAN
    } else {
        v.max(lo).min(hi)
    }
}

/// Element-wise minimum that propagates NaN.
pub(crate) fn minimum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.min(b) }
}

/// Element-wise maximum that propagates NaN.
pub(crate) fn maximum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() { f64::NAN } else { a.max(b) }
}
