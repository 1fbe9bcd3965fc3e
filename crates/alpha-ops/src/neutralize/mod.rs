//! Neutralization operators - removing exposure to a second signal
//!
//! Two-input operators that split one cross-section into the part explained
//! by another and the remainder.

pub mod regression;
pub mod vector;

pub use regression::{RegressionNeut, RegressionProj, regression_neut, regression_proj};
pub use vector::{VectorNeut, VectorProj, vector_neut, vector_proj};
