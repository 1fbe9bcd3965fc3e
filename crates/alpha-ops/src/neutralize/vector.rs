//! Vector projection and neutralization.
//!
//! `proj = (x·y / y·y) · y` and `neut = x - proj`, with both dot products
//! taken over the entries where `x` and `y` are valid. The neutralized vector
//! is orthogonal to `y` over those entries. An entry where either input is
//! missing is missing in both outputs.

use crate::{Result, panel, registry::OperatorCategory, traits::Operator};
use ndarray::{Array, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Dimension};

fn coefficient(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    let (xy, yy) = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .fold((0.0, 0.0), |(xy, yy), (&a, &b)| (xy + a * b, yy + b * b));
    xy / yy
}

fn project_rows(x: ArrayView2<'_, f64>, y: ArrayView2<'_, f64>, residual: bool) -> Array2<f64> {
    panel::par_rows2(x, y, |xr, yr, mut out| {
        let c = coefficient(xr, yr);
        for ((o, &a), &b) in out.iter_mut().zip(xr.iter()).zip(yr.iter()) {
            if a.is_nan() || b.is_nan() {
                continue;
            }
            let proj = c * b;
            *o = if residual { a - proj } else { proj };
        }
    })
}

/// Vector neutralization operator, `x - proj_y(x)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorNeut;

impl VectorNeut {
    /// Apply to two rank-1 or rank-2 arrays of identical shape.
    pub fn apply<S1, S2, D>(
        &self,
        x: &ArrayBase<S1, D>,
        y: &ArrayBase<S2, D>,
    ) -> Result<Array<f64, D>>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows2(x, y, |rx, ry| Ok(project_rows(rx, ry, true)))
    }
}

impl Operator for VectorNeut {
    fn name(&self) -> &str {
        "vector_neut"
    }

    fn description(&self) -> &str {
        "Remove the component of x along y, leaving a vector orthogonal to y"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Neutralize
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(project_rows(inputs[0], inputs[1], true))
    }
}

/// Vector projection operator, `(x·y / y·y) · y`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorProj;

impl VectorProj {
    /// Apply to two rank-1 or rank-2 arrays of identical shape.
    pub fn apply<S1, S2, D>(
        &self,
        x: &ArrayBase<S1, D>,
        y: &ArrayBase<S2, D>,
    ) -> Result<Array<f64, D>>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
    {
        panel::map_rows2(x, y, |rx, ry| Ok(project_rows(rx, ry, false)))
    }
}

impl Operator for VectorProj {
    fn name(&self) -> &str {
        "vector_proj"
    }

    fn description(&self) -> &str {
        "Project x onto y"
    }

    fn category(&self) -> OperatorCategory {
        OperatorCategory::Neutralize
    }

    fn arity(&self) -> usize {
        2
    }

    fn compute_rows(&self, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        Ok(project_rows(inputs[0], inputs[1], false))
    }
}

/// Component of `x` orthogonal to `y`; see [`VectorNeut`].
pub fn vector_neut<S1, S2, D>(
    x: &ArrayBase<S1, D>,
    y: &ArrayBase<S2, D>,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    VectorNeut.apply(x, y)
}

/// Projection of `x` onto `y`; see [`VectorProj`].
pub fn vector_proj<S1, S2, D>(
    x: &ArrayBase<S1, D>,
    y: &ArrayBase<S2, D>,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    VectorProj.apply(x, y)
}
