//! Operator registry for discovery and introspection.
//!
//! The registry provides a centralized way to discover, configure, and
//! apply operators by name. It supports grouping by category and building
//! operators from JSON parameters.

use crate::{OperatorError, Result, book, neutralize, ranking, standardize, traits::Operator};
use derive_more::Display;
use ndarray::{Array2, ArrayView2};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

/// Operator category for grouping related operators.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    /// Standardize - location and scale adjustments
    Standardize,
    /// Ranking - order-based transforms
    Ranking,
    /// Book - side selection, scaling and capping
    Book,
    /// Neutralize - removing exposure to a second input
    Neutralize,
}

/// Metadata for operator introspection.
#[derive(Debug, Clone)]
pub struct OperatorInfo {
    /// Operator name (unique identifier)
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Operator category
    pub category: OperatorCategory,
    /// Number of input panels
    pub arity: usize,
    /// Default parameters as JSON
    pub parameters: serde_json::Value,
}

/// Constructs a configured operator from JSON parameters.
pub type Builder = fn(serde_json::Value) -> Result<Arc<dyn Operator>>;

/// Registry for operator discovery and instantiation.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    operators: HashMap<String, Arc<dyn Operator>>,
    builders: HashMap<String, Builder>,
}

impl OperatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            operators: HashMap::new(),
            builders: HashMap::new(),
        }
    }

    /// Register all standard operators with their default configuration.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Standardize operators
        registry.add_configurable::<standardize::Normalize>();
        registry.add_plain::<standardize::ZScore>();
        registry.add_configurable::<standardize::Winsorize>();

        // Ranking operators
        registry.add_configurable::<ranking::Rank>();
        registry.add_configurable::<ranking::Quantile>();
        registry.add_configurable::<ranking::RankBySide>();
        registry.add_configurable::<ranking::GeneralizedRank>();
        registry.add_plain::<ranking::RankGmeanAmeanDiff>();

        // Book operators
        registry.add_configurable::<book::OneSide>();
        registry.add_configurable::<book::Scale>();
        registry.add_configurable::<book::ScaleDown>();
        registry.add_configurable::<book::Truncate>();

        // Neutralize operators
        registry.add_plain::<neutralize::RegressionNeut>();
        registry.add_plain::<neutralize::RegressionProj>();
        registry.add_plain::<neutralize::VectorNeut>();
        registry.add_plain::<neutralize::VectorProj>();

        registry
    }

    fn add_configurable<T>(&mut self)
    where
        T: Operator + Default + DeserializeOwned + 'static,
    {
        self.add_with_builder(Arc::new(T::default()), build_with::<T>);
    }

    fn add_plain<T: Operator + Default + 'static>(&mut self) {
        self.add_with_builder(Arc::new(T::default()), build_default::<T>);
    }

    fn add_with_builder(&mut self, operator: Arc<dyn Operator>, builder: Builder) {
        self.builders.insert(operator.name().to_string(), builder);
        self.register(operator);
    }

    /// Register an operator in the registry.
    ///
    /// Operators registered this way can only be built with null parameters,
    /// which returns the registered instance.
    pub fn register(&mut self, operator: Arc<dyn Operator>) {
        self.operators.insert(operator.name().to_string(), operator);
    }

    /// Get an operator by name, with its default configuration.
    pub fn get(&self, name: &str) -> Option<&dyn Operator> {
        self.operators.get(name).map(|op| op.as_ref())
    }

    /// Build an operator by name from JSON parameters.
    ///
    /// `null` selects the default configuration; an object overrides the
    /// named fields and leaves the rest at their defaults.
    pub fn build(&self, name: &str, params: serde_json::Value) -> Result<Arc<dyn Operator>> {
        match (self.builders.get(name), self.operators.get(name)) {
            (Some(builder), _) => builder(params),
            (None, Some(operator)) if params.is_null() => Ok(Arc::clone(operator)),
            (None, Some(_)) => Err(OperatorError::InvalidParameter {
                name: "params",
                reason: format!("operator `{name}` does not accept parameters"),
            }),
            (None, None) => Err(OperatorError::NotFound(name.to_string())),
        }
    }

    /// Apply the named operator, with its default configuration, to panels.
    pub fn compute(&self, name: &str, inputs: &[ArrayView2<'_, f64>]) -> Result<Array2<f64>> {
        let operator = self
            .get(name)
            .ok_or_else(|| OperatorError::NotFound(name.to_string()))?;
        tracing::debug!(operator = name, inputs = inputs.len(), "computing operator");
        operator.compute(inputs)
    }

    /// Get operators by category.
    pub fn by_category(&self, category: OperatorCategory) -> Vec<&dyn Operator> {
        self.operators
            .values()
            .filter(|op| op.category() == category)
            .map(|op| op.as_ref())
            .collect()
    }

    /// Get all operator metadata.
    pub fn all_info(&self) -> Vec<OperatorInfo> {
        self.operators.values().map(|op| info(op.as_ref())).collect()
    }

    /// Get all operator names.
    pub fn names(&self) -> Vec<&str> {
        self.operators.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

/// Metadata of a single operator.
pub fn info(operator: &dyn Operator) -> OperatorInfo {
    OperatorInfo {
        name: operator.name().to_string(),
        description: operator.description().to_string(),
        category: operator.category(),
        arity: operator.arity(),
        parameters: operator.parameters(),
    }
}

fn build_with<T>(params: serde_json::Value) -> Result<Arc<dyn Operator>>
where
    T: Operator + DeserializeOwned + 'static,
{
    let params = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params
    };
    let operator: T = serde_json::from_value(params)?;
    Ok(Arc::new(operator))
}

fn build_default<T>(params: serde_json::Value) -> Result<Arc<dyn Operator>>
where
    T: Operator + Default + 'static,
{
    let empty = match &params {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if !empty {
        return Err(OperatorError::InvalidParameter {
            name: "params",
            reason: "operator takes no parameters".to_string(),
        });
    }
    Ok(Arc::new(T::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr2;
    use serde_json::json;

    #[test]
    fn test_defaults_register_every_operator() {
        let registry = OperatorRegistry::with_defaults();
        assert_eq!(registry.len(), 16);
        assert!(!registry.is_empty());

        let mut names = registry.names();
        names.sort_unstable();
        assert_eq!(names.first(), Some(&"generalized_rank"));
        assert!(names.contains(&"rank_gmean_amean_diff"));
    }

    #[test]
    fn test_by_category() {
        let registry = OperatorRegistry::with_defaults();
        assert_eq!(registry.by_category(OperatorCategory::Standardize).len(), 3);
        assert_eq!(registry.by_category(OperatorCategory::Ranking).len(), 5);
        assert_eq!(registry.by_category(OperatorCategory::Book).len(), 4);
        assert_eq!(registry.by_category(OperatorCategory::Neutralize).len(), 4);
    }

    #[test]
    fn test_info_reports_arity_and_params() {
        let registry = OperatorRegistry::with_defaults();
        let infos = registry.all_info();
        let truncate = infos.iter().find(|i| i.name == "truncate").unwrap();

        assert_eq!(truncate.arity, 1);
        assert_eq!(truncate.category, OperatorCategory::Book);
        assert_eq!(truncate.parameters, json!({"max_percent": 0.01}));

        let neut = infos.iter().find(|i| i.name == "vector_neut").unwrap();
        assert_eq!(neut.arity, 2);
        assert!(neut.parameters.is_null());
    }

    #[test]
    fn test_build_with_params() {
        let registry = OperatorRegistry::with_defaults();
        let op = registry
            .build("truncate", json!({"maxPercent": 0.4}))
            .unwrap();

        let x = arr2(&[[10.0, 20.0, 30.0]]);
        let out = op.compute(&[x.view()]).unwrap();
        assert_relative_eq!(out[[0, 2]], 24.0);
    }

    #[test]
    fn test_build_rejects_bad_params() {
        let registry = OperatorRegistry::with_defaults();
        assert!(matches!(
            registry.build("rank", json!({"bogus": 1})),
            Err(OperatorError::Json(_))
        ));
        assert!(matches!(
            registry.build("zscore", json!({"limit": 1})),
            Err(OperatorError::InvalidParameter { .. })
        ));
        assert!(matches!(
            registry.build("nope", serde_json::Value::Null),
            Err(OperatorError::NotFound(_))
        ));
    }

    #[test]
    fn test_compute_checks_arity() {
        let registry = OperatorRegistry::with_defaults();
        let x = arr2(&[[1.0, 2.0]]);
        let err = registry.compute("regression_neut", &[x.view()]).unwrap_err();
        assert!(matches!(
            err,
            OperatorError::InvalidArity {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_compute_by_name() {
        let registry = OperatorRegistry::with_defaults();
        let x = arr2(&[[1.0, -3.0, 0.0, 2.0]]);
        let out = registry.compute("one_side", &[x.view()]).unwrap();
        assert_eq!(out, arr2(&[[1.0, 0.0, 0.0, 2.0]]));
    }

    #[test]
    fn test_default_rank_is_exact() {
        let registry = OperatorRegistry::with_defaults();
        let x = arr2(&[[0.0, 1.0, 2.0, 1000.0]]);

        let out = registry.compute("rank", &[x.view()]).unwrap();
        assert_eq!(out, arr2(&[[0.25, 0.5, 0.75, 1.0]]));

        let info = info(registry.get("rank").unwrap());
        assert_eq!(info.parameters, json!({"rate": 0}));
    }
}
