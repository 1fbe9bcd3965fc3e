//! Standardization operators - location and scale adjustments
//!
//! These operators recentre and rescale each cross-section so that scores
//! from different dates and different raw signals become comparable.

pub mod normalize;
pub mod winsorize;
pub mod zscore;

pub use normalize::{Normalize, normalize};
pub use winsorize::{Winsorize, winsorize};
pub use zscore::{ZScore, zscore};
