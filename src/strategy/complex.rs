//! Complex (multi-column) sharding strategy

use std::sync::Arc;

use super::{case_insensitive_set, restrict_to_available};
use crate::algorithm::{ComplexKeysShardingAlgorithm, ComplexKeysShardingValue};
use crate::error::{Result, ShardingError};
use crate::route::RouteValue;

/// Several sharding columns handed to one algorithm together
#[derive(Debug, Clone)]
pub struct ComplexShardingStrategy {
    sharding_columns: Vec<String>,
    algorithm: Arc<dyn ComplexKeysShardingAlgorithm>,
}

impl ComplexShardingStrategy {
    /// `sharding_columns` is comma-separated
    pub fn new(sharding_columns: &str, algorithm: Arc<dyn ComplexKeysShardingAlgorithm>) -> Result<Self> {
        let columns = case_insensitive_set(
            sharding_columns
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        );
        if columns.is_empty() {
            return Err(ShardingError::Configuration("Sharding columns cannot be null".to_string()));
        }
        Ok(Self {
            sharding_columns: columns,
            algorithm,
        })
    }

    pub fn sharding_columns(&self) -> &[String] {
        &self.sharding_columns
    }

    pub fn resolve(&self, available: &[String], route_values: &[RouteValue]) -> Result<Vec<String>> {
        let mut value = ComplexKeysShardingValue::default();
        for route_value in route_values {
            let Some(column) = self.sharding_columns.iter().find(|c| route_value.is_for_column(c)) else {
                continue;
            };
            value.logic_table = route_value.table_name().to_string();
            match route_value {
                RouteValue::List(list) => {
                    value.column_values.insert(column.clone(), list.values.clone());
                }
                RouteValue::Range(range) => {
                    value.column_ranges.insert(column.clone(), range.value_range.clone());
                }
                RouteValue::Hint(_) => continue,
            }
        }

        if value.column_values.is_empty() && value.column_ranges.is_empty() {
            return Ok(case_insensitive_set(available.iter().cloned()));
        }

        let targets = self.algorithm.do_sharding(available, &value)?;
        Ok(case_insensitive_set(restrict_to_available(available, targets)))
    }
}
