//! Hint sharding strategy

use std::sync::Arc;

use super::{case_insensitive_set, restrict_to_available};
use crate::algorithm::{HintShardingAlgorithm, HintShardingValue};
use crate::error::Result;
use crate::route::{RouteValue, ShardingValue};

/// Routes on hint values only
///
/// Only `RouteValue::Hint` entries (see `HintValues`) are consulted; SQL
/// predicates passed alongside them are ignored.
#[derive(Debug, Clone)]
pub struct HintShardingStrategy {
    algorithm: Arc<dyn HintShardingAlgorithm>,
}

impl HintShardingStrategy {
    pub fn new(algorithm: Arc<dyn HintShardingAlgorithm>) -> Self {
        Self { algorithm }
    }

    pub fn resolve(&self, available: &[String], route_values: &[RouteValue]) -> Result<Vec<String>> {
        let mut logic_table = "";
        let mut values: Vec<ShardingValue> = Vec::new();
        for route_value in route_values {
            if let RouteValue::Hint(hint) = route_value {
                logic_table = &hint.table_name;
                values.extend(hint.values.iter().cloned());
            }
        }

        if values.is_empty() {
            return Ok(case_insensitive_set(available.iter().cloned()));
        }

        let hint = HintShardingValue {
            logic_table,
            column_name: "",
            values: &values,
        };
        let targets = self.algorithm.do_sharding(available, &hint)?;
        Ok(case_insensitive_set(restrict_to_available(available, targets)))
    }
}
