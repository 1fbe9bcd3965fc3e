//! Book operators - shaping a cross-section into positions
//!
//! These operators select a side, scale rows to a booksize, map rows onto a
//! unit range or cap the weight any one instrument can take.

pub mod one_side;
pub mod scale;
pub mod scale_down;
pub mod truncate;

pub use one_side::{OneSide, Side, one_side};
pub use scale::{Scale, scale};
pub use scale_down::{ScaleDown, scale_down};
pub use truncate::{Truncate, truncate};
