//! Hint values
//!
//! Out-of-band sharding values supplied by the application instead of SQL
//! predicates. The holder is an explicit per-statement value handed to the
//! router, not thread-local or global state.

use std::collections::HashMap;

use super::{HintRouteValue, RouteValue, ShardingValue};

/// Hint values keyed by lower-cased logic table name
#[derive(Debug, Clone, Default)]
pub struct HintValues {
    database_values: HashMap<String, Vec<ShardingValue>>,
    table_values: HashMap<String, Vec<ShardingValue>>,
}

impl HintValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a database-level hint value for a logic table
    pub fn add_database_value(&mut self, logic_table: &str, value: impl Into<ShardingValue>) -> &mut Self {
        push_unique(&mut self.database_values, logic_table, value.into());
        self
    }

    /// Add a table-level hint value for a logic table
    pub fn add_table_value(&mut self, logic_table: &str, value: impl Into<ShardingValue>) -> &mut Self {
        push_unique(&mut self.table_values, logic_table, value.into());
        self
    }

    pub fn database_values(&self, logic_table: &str) -> &[ShardingValue] {
        lookup(&self.database_values, logic_table)
    }

    pub fn table_values(&self, logic_table: &str) -> &[ShardingValue] {
        lookup(&self.table_values, logic_table)
    }

    pub fn is_empty(&self) -> bool {
        self.database_values.is_empty() && self.table_values.is_empty()
    }

    /// Database hint values as a hint route value
    pub fn database_route_values(&self, logic_table: &str) -> Vec<RouteValue> {
        as_route_values(logic_table, self.database_values(logic_table))
    }

    /// Table hint values as a hint route value
    pub fn table_route_values(&self, logic_table: &str) -> Vec<RouteValue> {
        as_route_values(logic_table, self.table_values(logic_table))
    }
}

fn push_unique(map: &mut HashMap<String, Vec<ShardingValue>>, logic_table: &str, value: ShardingValue) {
    let values = map.entry(logic_table.to_ascii_lowercase()).or_default();
    if !values.contains(&value) {
        values.push(value);
    }
}

fn lookup<'a>(map: &'a HashMap<String, Vec<ShardingValue>>, logic_table: &str) -> &'a [ShardingValue] {
    map.get(&logic_table.to_ascii_lowercase())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn as_route_values(logic_table: &str, values: &[ShardingValue]) -> Vec<RouteValue> {
    if values.is_empty() {
        return Vec::new();
    }
    vec![RouteValue::Hint(HintRouteValue::new(logic_table, values.iter().cloned()))]
}
