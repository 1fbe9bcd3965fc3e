//! Ranking operators - order-based transforms
//!
//! Ranking operators replace raw values with their position in the
//! cross-section, which makes scores robust to outliers and to the scale of
//! the underlying signal.

pub mod generalized_rank;
pub mod quantile;
pub mod rank;
pub mod rank_by_side;
pub mod rank_gmean_amean_diff;

pub use generalized_rank::{GeneralizedRank, generalized_rank};
pub use quantile::{Driver, Quantile, quantile};
pub use rank::{Rank, rank};
pub use rank_by_side::{RankBySide, rank_by_side};
pub use rank_gmean_amean_diff::{RankGmeanAmeanDiff, rank_gmean_amean_diff};
