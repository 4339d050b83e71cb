//! Sharding Strategy Module
//!
//! Binds sharding columns to an algorithm behind one `resolve` contract:
//! `resolve(available targets, route values) -> targets`.
//!
//! ## Variants
//! - Standard: one column, precise + range algorithm
//! - Complex: several columns, one algorithm over the full tuple
//! - Hint: values supplied out of band, SQL predicates ignored
//! - None: identity, every available target
//!
//! Output of Standard / Complex / Hint is restricted to the available targets,
//! deduplicated ignoring case and sorted ignoring case, so equal inputs always
//! produce the same plan.

mod complex;
mod hint;
mod standard;

pub use complex::ComplexShardingStrategy;
pub use hint::HintShardingStrategy;
pub use standard::StandardShardingStrategy;

use std::collections::BTreeMap;

use crate::algorithm::AlgorithmRegistry;
use crate::config::ShardingStrategyConfiguration;
use crate::error::{Result, ShardingError};
use crate::route::RouteValue;

/// A configured sharding strategy for one level (database or table)
#[derive(Debug)]
pub enum ShardingStrategy {
    Standard(StandardShardingStrategy),
    Complex(ComplexShardingStrategy),
    Hint(HintShardingStrategy),
    None,
}

impl ShardingStrategy {
    /// Build from configuration; missing columns or algorithms fail here, once
    pub fn from_config(config: &ShardingStrategyConfiguration, registry: &AlgorithmRegistry) -> Result<Self> {
        match config {
            ShardingStrategyConfiguration::Standard {
                sharding_column,
                algorithm,
            } => {
                let column = sharding_column.as_deref().ok_or_else(|| missing("Sharding column"))?;
                let algorithm = algorithm.as_ref().ok_or_else(|| missing("Sharding algorithm"))?;
                Ok(ShardingStrategy::Standard(StandardShardingStrategy::new(
                    column,
                    registry.create_standard(algorithm)?,
                )?))
            }
            ShardingStrategyConfiguration::Complex {
                sharding_columns,
                algorithm,
            } => {
                let columns = sharding_columns.as_deref().ok_or_else(|| missing("Sharding columns"))?;
                let algorithm = algorithm.as_ref().ok_or_else(|| missing("Sharding algorithm"))?;
                Ok(ShardingStrategy::Complex(ComplexShardingStrategy::new(
                    columns,
                    registry.create_complex(algorithm)?,
                )?))
            }
            ShardingStrategyConfiguration::Hint { algorithm } => {
                let algorithm = algorithm.as_ref().ok_or_else(|| missing("Sharding algorithm"))?;
                Ok(ShardingStrategy::Hint(HintShardingStrategy::new(registry.create_hint(algorithm)?)))
            }
            ShardingStrategyConfiguration::None => Ok(ShardingStrategy::None),
        }
    }

    /// Narrow `available` using the route values
    pub fn resolve(&self, available: &[String], route_values: &[RouteValue]) -> Result<Vec<String>> {
        match self {
            ShardingStrategy::Standard(s) => s.resolve(available, route_values),
            ShardingStrategy::Complex(s) => s.resolve(available, route_values),
            ShardingStrategy::Hint(s) => s.resolve(available, route_values),
            ShardingStrategy::None => Ok(available.to_vec()),
        }
    }

    /// Configured sharding columns, sorted ignoring case
    pub fn sharding_columns(&self) -> Vec<String> {
        match self {
            ShardingStrategy::Standard(s) => vec![s.sharding_column().to_string()],
            ShardingStrategy::Complex(s) => s.sharding_columns().to_vec(),
            ShardingStrategy::Hint(_) | ShardingStrategy::None => Vec::new(),
        }
    }

    pub fn is_sharding_column(&self, column: &str) -> bool {
        self.sharding_columns().iter().any(|c| c.eq_ignore_ascii_case(column))
    }

    pub fn is_hint(&self) -> bool {
        matches!(self, ShardingStrategy::Hint(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ShardingStrategy::None)
    }

    /// Short variant name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            ShardingStrategy::Standard(_) => "standard",
            ShardingStrategy::Complex(_) => "complex",
            ShardingStrategy::Hint(_) => "hint",
            ShardingStrategy::None => "none",
        }
    }
}

fn missing(what: &str) -> ShardingError {
    ShardingError::Configuration(format!("{} cannot be null", what))
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Deduplicate and sort ignoring case; the first spelling seen wins
pub(crate) fn case_insensitive_set<I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut set: BTreeMap<String, String> = BTreeMap::new();
    for name in names {
        set.entry(name.to_ascii_lowercase()).or_insert(name);
    }
    set.into_values().collect()
}

/// Keep only names present in `available`, in the available spelling
pub(crate) fn restrict_to_available(available: &[String], names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter_map(|name| available.iter().find(|a| a.eq_ignore_ascii_case(&name)).cloned())
        .collect()
}
