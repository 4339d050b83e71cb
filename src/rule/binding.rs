//! Binding Table Rule
//!
//! A group of logic tables forced to shard identically. Within any data
//! source the n-th actual table of one member is co-located with the n-th
//! actual table of every other member.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::table::TableRule;
use crate::error::{Result, ShardingError};

/// Logic tables sharded identically
#[derive(Debug, Clone)]
pub struct BindingTableRule {
    table_rules: Vec<Arc<TableRule>>,
}

impl BindingTableRule {
    /// Group at least two table rules with matching per-data-source table counts
    pub fn new(table_rules: Vec<Arc<TableRule>>) -> Result<Self> {
        if table_rules.len() < 2 {
            return Err(ShardingError::Configuration(format!(
                "Binding table group must contain at least 2 tables, got {}",
                table_rules.len()
            )));
        }

        let first = &table_rules[0];
        let first_sources = first.actual_datasource_names();
        for other in &table_rules[1..] {
            let other_sources = other.actual_datasource_names();
            if other_sources.len() != first_sources.len() {
                return Err(mismatch(first, other));
            }
            for ds in &first_sources {
                if first.actual_table_names(ds).len() != other.actual_table_names(ds).len() {
                    return Err(mismatch(first, other));
                }
            }
        }

        Ok(Self { table_rules })
    }

    pub fn table_rules(&self) -> &[Arc<TableRule>] {
        &self.table_rules
    }

    pub fn logic_tables(&self) -> Vec<&str> {
        self.table_rules.iter().map(|rule| rule.logic_table()).collect()
    }

    pub fn has_logic_table(&self, logic_table: &str) -> bool {
        self.find(logic_table).is_some()
    }

    /// Actual table of `target_logic_table` co-located with `source_actual_table`
    pub fn translate_to_bound_table(
        &self,
        data_source_name: &str,
        source_logic_table: &str,
        source_actual_table: &str,
        target_logic_table: &str,
    ) -> Result<String> {
        let not_found = || {
            ShardingError::Configuration(format!(
                "Cannot find binding actual table, data source: '{}', logic table: '{}', actual table: '{}'",
                data_source_name, source_logic_table, source_actual_table
            ))
        };

        let source = self.find(source_logic_table).ok_or_else(not_found)?;
        let index = source
            .find_actual_table_index(data_source_name, source_actual_table)
            .ok_or_else(not_found)?;
        let target = self.find(target_logic_table).ok_or_else(|| {
            ShardingError::Configuration(format!(
                "Logic table '{}' is not in binding group [{}]",
                target_logic_table,
                self.logic_tables().join(", ")
            ))
        })?;

        target
            .actual_table_names(data_source_name)
            .get(index)
            .cloned()
            .ok_or_else(not_found)
    }

    /// Co-located actual tables of every other member, keyed by logic table
    pub fn binding_actual_tables(
        &self,
        data_source_name: &str,
        logic_table: &str,
        actual_table: &str,
    ) -> Result<BTreeMap<String, String>> {
        let mut result = BTreeMap::new();
        for rule in &self.table_rules {
            if rule.logic_table().eq_ignore_ascii_case(logic_table) {
                continue;
            }
            let bound =
                self.translate_to_bound_table(data_source_name, logic_table, actual_table, rule.logic_table())?;
            result.insert(rule.logic_table().to_string(), bound);
        }
        Ok(result)
    }

    fn find(&self, logic_table: &str) -> Option<&Arc<TableRule>> {
        self.table_rules
            .iter()
            .find(|rule| rule.logic_table().eq_ignore_ascii_case(logic_table))
    }
}

fn mismatch(first: &TableRule, other: &TableRule) -> ShardingError {
    ShardingError::Configuration(format!(
        "Binding tables '{}' and '{}' must have the same actual table count in every data source",
        first.logic_table(),
        other.logic_table()
    ))
}
