//! Standard sharding strategy

use std::sync::Arc;

use super::{case_insensitive_set, restrict_to_available};
use crate::algorithm::{PreciseShardingValue, RangeShardingValue, StandardShardingAlgorithm};
use crate::error::{Result, ShardingError};
use crate::route::RouteValue;

/// One sharding column + one precise/range algorithm
#[derive(Debug, Clone)]
pub struct StandardShardingStrategy {
    sharding_column: String,
    algorithm: Arc<dyn StandardShardingAlgorithm>,
}

impl StandardShardingStrategy {
    pub fn new(sharding_column: &str, algorithm: Arc<dyn StandardShardingAlgorithm>) -> Result<Self> {
        let sharding_column = sharding_column.trim();
        if sharding_column.is_empty() {
            return Err(ShardingError::Configuration("Sharding column cannot be null".to_string()));
        }
        Ok(Self {
            sharding_column: sharding_column.to_string(),
            algorithm,
        })
    }

    pub fn sharding_column(&self) -> &str {
        &self.sharding_column
    }

    pub fn algorithm(&self) -> &Arc<dyn StandardShardingAlgorithm> {
        &self.algorithm
    }

    /// Consults only the route value for this strategy's column
    ///
    /// Without one the statement is not narrowed and every target is returned.
    pub fn resolve(&self, available: &[String], route_values: &[RouteValue]) -> Result<Vec<String>> {
        let Some(route_value) = route_values.iter().find(|v| v.is_for_column(&self.sharding_column)) else {
            return Ok(case_insensitive_set(available.iter().cloned()));
        };

        let targets = match route_value {
            RouteValue::List(list) => {
                let mut targets = Vec::with_capacity(list.values.len());
                for value in &list.values {
                    let precise = PreciseShardingValue {
                        logic_table: &list.table_name,
                        column_name: &self.sharding_column,
                        value,
                    };
                    if let Some(target) = self.algorithm.do_precise_sharding(available, &precise)? {
                        targets.push(target);
                    }
                }
                targets
            }
            RouteValue::Range(range) => {
                let range_value = RangeShardingValue {
                    logic_table: &range.table_name,
                    column_name: &self.sharding_column,
                    value_range: &range.value_range,
                };
                self.algorithm.do_range_sharding(available, &range_value)?
            }
            RouteValue::Hint(_) => return Ok(case_insensitive_set(available.iter().cloned())),
        };

        Ok(case_insensitive_set(restrict_to_available(available, targets)))
    }
}
