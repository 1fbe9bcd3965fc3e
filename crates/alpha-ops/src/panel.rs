//! Rank dispatch for cross-sectional arrays.
//!
//! Operators accept rank-1 arrays (a single cross-section) and rank-2 arrays
//! (`[dates, instruments]`). Both are funnelled through a rank-2 row view here
//! so that every row kernel is written once; a rank-1 input is a one-row panel.

use crate::{OperatorError, Result};
use ndarray::{
    Array, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1, Axis, Data, Dimension, Ix1,
    Ix2, Zip,
};

/// Borrow a rank-1 or rank-2 array as a `[rows, instruments]` view.
///
/// A rank-1 input becomes a single row. Any other rank is a shape error.
pub fn as_rows<S, D>(x: &ArrayBase<S, D>) -> Result<ArrayView2<'_, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    match x.ndim() {
        1 => Ok(x.view().into_dimensionality::<Ix1>()?.insert_axis(Axis(0))),
        2 => Ok(x.view().into_dimensionality::<Ix2>()?),
        rank => {
            tracing::debug!(rank, shape = ?x.shape(), "rejecting input of unsupported rank");
            Err(OperatorError::InvalidRank(rank))
        }
    }
}

/// Build a rank-2 panel from row vectors, rejecting ragged input.
///
/// An empty slice yields a `[0, 0]` panel.
pub fn from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    if let Some((row, found)) = rows
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != width)
    {
        return Err(OperatorError::RaggedRows {
            row,
            expected: width,
            found,
        });
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(Array2::from_shape_vec((rows.len(), width), flat)?)
}

/// Reshape a row-kernel result back to the caller's dimensionality.
pub(crate) fn restore<D: Dimension>(out: Array2<f64>, dim: D) -> Result<Array<f64, D>> {
    let out = if out.is_standard_layout() {
        out
    } else {
        out.as_standard_layout().into_owned()
    };
    Ok(out.into_shape_with_order(dim)?)
}

/// Fail unless every input has the same shape as the first.
pub(crate) fn ensure_same_shape(shapes: &[&[usize]]) -> Result<()> {
    let Some(first) = shapes.first() else {
        return Ok(());
    };
    match shapes.iter().find(|shape| shape != &first) {
        Some(other) => Err(OperatorError::ShapeMismatch {
            left: first.to_vec(),
            right: other.to_vec(),
        }),
        None => Ok(()),
    }
}

/// Apply a row kernel to a rank-1 or rank-2 array.
pub(crate) fn map_rows<S, D, F>(x: &ArrayBase<S, D>, kernel: F) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
    F: FnOnce(ArrayView2<'_, f64>) -> Result<Array2<f64>>,
{
    let rows = as_rows(x)?;
    tracing::debug!(rank = x.ndim(), shape = ?x.shape(), "applying row kernel");
    restore(kernel(rows)?, x.raw_dim())
}

/// Apply a two-input row kernel; both inputs must share a shape.
pub(crate) fn map_rows2<S1, S2, D, F>(
    a: &ArrayBase<S1, D>,
    b: &ArrayBase<S2, D>,
    kernel: F,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
    F: FnOnce(ArrayView2<'_, f64>, ArrayView2<'_, f64>) -> Result<Array2<f64>>,
{
    ensure_same_shape(&[a.shape(), b.shape()])?;
    let (ra, rb) = (as_rows(a)?, as_rows(b)?);
    tracing::debug!(rank = a.ndim(), shape = ?a.shape(), "applying paired row kernel");
    restore(kernel(ra, rb)?, a.raw_dim())
}

/// Apply a three-input row kernel; all inputs must share a shape.
pub(crate) fn map_rows3<S1, S2, S3, D, F>(
    a: &ArrayBase<S1, D>,
    b: &ArrayBase<S2, D>,
    c: &ArrayBase<S3, D>,
    kernel: F,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    S3: Data<Elem = f64>,
    D: Dimension,
    F: FnOnce(ArrayView2<'_, f64>, ArrayView2<'_, f64>, ArrayView2<'_, f64>) -> Result<Array2<f64>>,
{
    ensure_same_shape(&[a.shape(), b.shape(), c.shape()])?;
    let (ra, rb, rc) = (as_rows(a)?, as_rows(b)?, as_rows(c)?);
    tracing::debug!(rank = a.ndim(), shape = ?a.shape(), "applying triple row kernel");
    restore(kernel(ra, rb, rc)?, a.raw_dim())
}

/// Run `f` over every row in parallel, writing into a NaN-initialised output.
pub(crate) fn par_rows<F>(rows: ArrayView2<'_, f64>, f: F) -> Array2<f64>
where
    F: Fn(ArrayView1<'_, f64>, ArrayViewMut1<'_, f64>) + Sync + Send,
{
    let mut out = Array2::from_elem(rows.raw_dim(), f64::NAN);
    Zip::from(out.rows_mut())
        .and(rows.rows())
        .par_for_each(|dst, src| f(src, dst));
    out
}

/// Paired variant of [`par_rows`]; `a` and `b` must share a shape.
pub(crate) fn par_rows2<F>(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>, f: F) -> Array2<f64>
where
    F: Fn(ArrayView1<'_, f64>, ArrayView1<'_, f64>, ArrayViewMut1<'_, f64>) + Sync + Send,
{
    let mut out = Array2::from_elem(a.raw_dim(), f64::NAN);
    Zip::from(out.rows_mut())
        .and(a.rows())
        .and(b.rows())
        .par_for_each(|dst, ra, rb| f(ra, rb, dst));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn, ShapeBuilder, arr1, arr2};

    #[test]
    fn test_rank1_is_single_row() {
        let x = arr1(&[1.0, 2.0, 3.0]);
        let rows = as_rows(&x).unwrap();
        assert_eq!(rows.shape(), &[1, 3]);
    }

    #[test]
    fn test_rank2_passes_through() {
        let x = arr2(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let rows = as_rows(&x).unwrap();
        assert_eq!(rows.shape(), &[3, 2]);
        assert_eq!(rows[[2, 1]], 6.0);
    }

    #[test]
    fn test_rank3_is_rejected() {
        let x = ArrayD::<f64>::zeros(IxDyn(&[2, 2, 2]));
        let err = as_rows(&x).unwrap_err();
        assert!(matches!(err, OperatorError::InvalidRank(3)));
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_dynamic_rank2_accepted() {
        let x = ArrayD::<f64>::zeros(IxDyn(&[2, 4]));
        assert_eq!(as_rows(&x).unwrap().shape(), &[2, 4]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(
            err,
            OperatorError::RaggedRows {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_from_rows_preserves_order() {
        let panel = from_rows(&[vec![1.0, f64::NAN], vec![3.0, 4.0]]).unwrap();
        assert_eq!(panel.shape(), &[2, 2]);
        assert!(panel[[0, 1]].is_nan());
        assert_eq!(panel[[1, 0]], 3.0);
    }

    #[test]
    fn test_restore_rank1() {
        let x = arr1(&[1.0, 2.0]);
        let out = map_rows(&x, |rows| Ok(rows.mapv(|v| v * 2.0))).unwrap();
        assert_eq!(out, arr1(&[2.0, 4.0]));
    }

    #[test]
    fn test_restore_non_standard_layout() {
        let x = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let out = map_rows(&x, |rows| {
            let mut out = Array2::zeros(rows.raw_dim().f());
            out.assign(&rows);
            assert!(!out.is_standard_layout());
            Ok(out)
        })
        .unwrap();
        assert_eq!(out, x);
    }

    #[test]
    fn test_map_rows2_shape_mismatch() {
        let a = arr2(&[[1.0, 2.0]]);
        let b = arr2(&[[1.0, 2.0, 3.0]]);
        let err = map_rows2(&a, &b, |ra, _| Ok(ra.to_owned())).unwrap_err();
        assert!(matches!(err, OperatorError::ShapeMismatch { .. }));
    }
}
