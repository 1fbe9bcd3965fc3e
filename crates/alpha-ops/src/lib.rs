#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/alpha-ops/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod book;
pub mod error;
pub mod frame;
pub mod neutralize;
pub mod panel;
pub mod ranking;
pub mod reduce;
pub mod registry;
pub mod standardize;
pub mod traits;

// Re-export core types
pub use error::{OperatorError, Result};
pub use frame::{LabeledPanel, panel_from_frame, panel_to_frame};
pub use reduce::{Ddof, Reduced, Reduction, SortPrecision};
pub use registry::{OperatorCategory, OperatorInfo, OperatorRegistry};
pub use traits::Operator;

// Re-export operators
pub use book::{OneSide, Scale, ScaleDown, Side, Truncate, one_side, scale, scale_down, truncate};
pub use neutralize::{
    RegressionNeut, RegressionProj, VectorNeut, VectorProj, regression_neut, regression_proj,
    vector_neut, vector_proj,
};
pub use ranking::{
    Driver, GeneralizedRank, Quantile, Rank, RankBySide, RankGmeanAmeanDiff, generalized_rank,
    quantile, rank, rank_by_side, rank_gmean_amean_diff,
};
pub use standardize::{Normalize, Winsorize, ZScore, normalize, winsorize, zscore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
