//! Sharding Rule
//!
//! The immutable aggregate consulted by every routing call: table rules,
//! binding groups, broadcast tables and rule-level defaults.
//!
//! ## Responsibilities
//! - Validate the whole configuration once, at construction
//! - Answer table / binding / broadcast / sharding-column queries
//! - Resolve route values to data nodes and generate keys
//!
//! A built rule is never mutated. Reconfiguration builds a new instance and
//! swaps it in through [`super::ShardingRuleContext`].

use std::sync::Arc;

use tracing::debug;

use super::binding::BindingTableRule;
use super::table::{contains_ignore_case, RuleDefaults, TableRule};
use crate::algorithm::{AlgorithmRegistry, Properties};
use crate::config::ShardingRuleConfiguration;
use crate::datanode::DataNode;
use crate::error::{Result, ShardingError};
use crate::keygen::{KeyGenerateAlgorithm, SnowflakeKeyGenerateAlgorithm};
use crate::route::{HintValues, RouteValue};
use crate::strategy::ShardingStrategy;

/// Immutable sharding rule shared by every routing thread
#[derive(Debug)]
pub struct ShardingRule {
    /// Authoritative data-source universe
    data_source_names: Vec<String>,

    table_rules: Vec<Arc<TableRule>>,

    binding_table_rules: Vec<BindingTableRule>,

    /// Lower-cased, deduplicated
    broadcast_tables: Vec<String>,

    defaults: RuleDefaults,
}

impl ShardingRule {
    /// Build with the built-in algorithm registry
    pub fn new<I, S>(config: &ShardingRuleConfiguration, data_source_names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_registry(config, data_source_names, &AlgorithmRegistry::default())
    }

    /// Build, creating algorithms through `registry`
    pub fn with_registry<I, S>(
        config: &ShardingRuleConfiguration,
        data_source_names: I,
        registry: &AlgorithmRegistry,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        // Step 1: Data sources
        let mut names: Vec<String> = Vec::new();
        for name in data_source_names.into_iter().map(Into::into) {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ShardingError::IllegalArgument(
                    "Data source name cannot be empty".to_string(),
                ));
            }
            if !contains_ignore_case(&names, &name) {
                names.push(name);
            }
        }
        if names.is_empty() {
            return Err(ShardingError::IllegalArgument(
                "Data source names cannot be empty".to_string(),
            ));
        }

        // Step 2: Defaults
        let defaults = build_defaults(config, registry)?;

        // Step 3: Table rules
        let mut table_rules: Vec<Arc<TableRule>> = Vec::with_capacity(config.tables.len());
        for table_config in &config.tables {
            let rule = TableRule::new(table_config, &names, registry, defaults.key_generate_column.as_deref())?;
            if table_rules.iter().any(|r| r.logic_table() == rule.logic_table()) {
                return Err(ShardingError::Configuration(format!(
                    "Duplicate table rule for logic table '{}'",
                    rule.logic_table()
                )));
            }
            table_rules.push(Arc::new(rule));
        }

        // Step 4: Binding groups
        let binding_table_rules = build_binding_rules(&config.binding_table_groups, &table_rules)?;

        // Step 5: Broadcast tables
        let mut broadcast_tables: Vec<String> = Vec::new();
        for table in &config.broadcast_tables {
            let table = table.trim().to_ascii_lowercase();
            if !table.is_empty() && !broadcast_tables.contains(&table) {
                broadcast_tables.push(table);
            }
        }

        debug!(
            data_sources = names.len(),
            tables = table_rules.len(),
            binding_groups = binding_table_rules.len(),
            broadcast_tables = broadcast_tables.len(),
            "Built sharding rule"
        );

        Ok(Self {
            data_source_names: names,
            table_rules,
            binding_table_rules,
            broadcast_tables,
            defaults,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn data_source_names(&self) -> &[String] {
        &self.data_source_names
    }

    pub fn table_rules(&self) -> &[Arc<TableRule>] {
        &self.table_rules
    }

    pub fn binding_table_rules(&self) -> &[BindingTableRule] {
        &self.binding_table_rules
    }

    pub fn broadcast_tables(&self) -> &[String] {
        &self.broadcast_tables
    }

    pub fn defaults(&self) -> &RuleDefaults {
        &self.defaults
    }

    pub fn default_database_strategy(&self) -> Option<&Arc<ShardingStrategy>> {
        self.defaults.database_strategy.as_ref()
    }

    pub fn default_table_strategy(&self) -> Option<&Arc<ShardingStrategy>> {
        self.defaults.table_strategy.as_ref()
    }

    pub fn default_key_generator(&self) -> Option<&Arc<dyn KeyGenerateAlgorithm>> {
        self.defaults.key_generator.as_ref()
    }

    // =========================================================================
    // Table Rule Lookup
    // =========================================================================

    /// Case-insensitive lookup; `None` when the table is not sharded
    pub fn find_table_rule(&self, logic_table: &str) -> Option<&Arc<TableRule>> {
        self.table_rules
            .iter()
            .find(|rule| rule.logic_table().eq_ignore_ascii_case(logic_table))
    }

    /// Lookup that requires the table to exist
    ///
    /// Broadcast tables without a table rule resolve to a synthetic rule
    /// spanning every data source.
    pub fn get_table_rule(&self, logic_table: &str) -> Result<Arc<TableRule>> {
        if let Some(rule) = self.find_table_rule(logic_table) {
            return Ok(Arc::clone(rule));
        }
        if self.is_broadcast_table(logic_table) {
            return Ok(Arc::new(TableRule::broadcast(logic_table, &self.data_source_names)));
        }
        Err(ShardingError::Configuration(format!(
            "Cannot find table rule with logic table: '{}'",
            logic_table
        )))
    }

    pub fn find_table_rule_by_actual_table(&self, actual_table: &str) -> Option<&Arc<TableRule>> {
        self.table_rules.iter().find(|rule| rule.is_existed(actual_table))
    }

    pub fn find_logic_table_by_actual_table(&self, actual_table: &str) -> Option<&str> {
        self.find_table_rule_by_actual_table(actual_table)
            .map(|rule| rule.logic_table())
    }

    /// Logic tables among `logic_tables` that have a table rule
    pub fn sharding_logic_table_names<S: AsRef<str>>(&self, logic_tables: &[S]) -> Vec<String> {
        logic_tables
            .iter()
            .map(S::as_ref)
            .filter(|name| self.find_table_rule(name).is_some())
            .map(str::to_string)
            .collect()
    }

    /// True when any name is a sharded or broadcast table
    pub fn table_rule_exists<S: AsRef<str>>(&self, logic_tables: &[S]) -> bool {
        logic_tables.iter().map(S::as_ref).any(|name| {
            self.find_table_rule(name).is_some() || self.is_broadcast_table(name)
        })
    }

    /// Every distinct actual table name across all table rules
    pub fn all_actual_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for rule in &self.table_rules {
            for table in rule.all_actual_table_names() {
                if !contains_ignore_case(&tables, &table) {
                    tables.push(table);
                }
            }
        }
        tables
    }

    // =========================================================================
    // Binding & Broadcast
    // =========================================================================

    pub fn find_binding_table_rule(&self, logic_table: &str) -> Option<&BindingTableRule> {
        self.binding_table_rules
            .iter()
            .find(|rule| rule.has_logic_table(logic_table))
    }

    /// True when every name is sharded and all share one binding group
    ///
    /// Empty input is never "all".
    pub fn is_all_binding_tables<S: AsRef<str>>(&self, logic_tables: &[S]) -> bool {
        let Some(first) = logic_tables.first() else {
            return false;
        };
        let Some(binding_rule) = self.find_binding_table_rule(S::as_ref(first)) else {
            return false;
        };
        logic_tables.iter().map(S::as_ref).all(|name| {
            self.find_table_rule(name).is_some() && binding_rule.has_logic_table(name)
        })
    }

    pub fn is_broadcast_table(&self, logic_table: &str) -> bool {
        self.broadcast_tables
            .iter()
            .any(|table| table.eq_ignore_ascii_case(logic_table))
    }

    /// Empty input is never "all"
    pub fn is_all_broadcast_tables<S: AsRef<str>>(&self, logic_tables: &[S]) -> bool {
        !logic_tables.is_empty()
            && logic_tables
                .iter()
                .all(|name| self.is_broadcast_table(S::as_ref(name)))
    }

    // =========================================================================
    // Strategies & Columns
    // =========================================================================

    /// The table's own database strategy, else the rule default
    pub fn database_sharding_strategy<'a>(&'a self, table_rule: &'a TableRule) -> Option<&'a Arc<ShardingStrategy>> {
        table_rule
            .database_strategy()
            .or(self.defaults.database_strategy.as_ref())
    }

    /// The table's own table strategy, else the rule default
    pub fn table_sharding_strategy<'a>(&'a self, table_rule: &'a TableRule) -> Option<&'a Arc<ShardingStrategy>> {
        table_rule
            .table_strategy()
            .or(self.defaults.table_strategy.as_ref())
    }

    /// True when `column` drives the database or table strategy of `logic_table`
    pub fn is_sharding_column(&self, column: &str, logic_table: &str) -> bool {
        let Some(rule) = self.find_table_rule(logic_table) else {
            return false;
        };
        self.database_sharding_strategy(rule)
            .is_some_and(|s| s.is_sharding_column(column))
            || self
                .table_sharding_strategy(rule)
                .is_some_and(|s| s.is_sharding_column(column))
    }

    // =========================================================================
    // Data Nodes
    // =========================================================================

    /// First data node of a table, for metadata lookups
    pub fn get_data_node(&self, logic_table: &str) -> Result<DataNode> {
        let rule = self.get_table_rule(logic_table)?;
        rule.actual_data_nodes().first().cloned().ok_or_else(|| {
            ShardingError::Configuration(format!(
                "Cannot find actual data node for logic table name: '{}'",
                logic_table
            ))
        })
    }

    /// First data node of a table within one data source
    pub fn get_data_node_in(&self, data_source_name: &str, logic_table: &str) -> Result<DataNode> {
        let rule = self.get_table_rule(logic_table)?;
        rule.actual_data_nodes()
            .iter()
            .find(|node| {
                node.is_in_data_source(data_source_name)
                    && contains_ignore_case(&self.data_source_names, node.data_source_name())
            })
            .cloned()
            .ok_or_else(|| {
                ShardingError::Configuration(format!(
                    "Cannot find actual data node for data source name: '{}' and logic table name: '{}'",
                    data_source_name, logic_table
                ))
            })
    }

    /// Resolve already-split database and table route values
    pub fn resolve_data_nodes(
        &self,
        logic_table: &str,
        database_values: &[RouteValue],
        table_values: &[RouteValue],
    ) -> Result<Vec<DataNode>> {
        let rule = self.get_table_rule(logic_table)?;
        rule.resolve(&self.defaults, database_values, table_values)
    }

    /// Route one logic table
    ///
    /// SQL route values are split by the columns of the effective database
    /// and table strategies; a Hint strategy takes its values from `hints`
    /// instead. Route values of other tables are ignored.
    pub fn route(&self, logic_table: &str, route_values: &[RouteValue], hints: &HintValues) -> Result<Vec<DataNode>> {
        let rule = self.get_table_rule(logic_table)?;

        let database_values = match self.database_sharding_strategy(&rule) {
            Some(strategy) if strategy.is_hint() => hints.database_route_values(logic_table),
            Some(strategy) => values_for(strategy, logic_table, route_values),
            None => Vec::new(),
        };
        let table_values = match self.table_sharding_strategy(&rule) {
            Some(strategy) if strategy.is_hint() => hints.table_route_values(logic_table),
            Some(strategy) => values_for(strategy, logic_table, route_values),
            None => Vec::new(),
        };

        rule.resolve(&self.defaults, &database_values, &table_values)
    }

    // =========================================================================
    // Key Generation
    // =========================================================================

    pub fn find_generate_key_column_name(&self, logic_table: &str) -> Option<&str> {
        self.find_table_rule(logic_table)
            .and_then(|rule| rule.key_generate_column())
    }

    /// Generate a key for an insert into `logic_table`
    pub fn generate_key(&self, logic_table: &str) -> Result<i64> {
        let rule = self.find_table_rule(logic_table).ok_or_else(|| {
            ShardingError::Configuration(format!(
                "Cannot find strategy for generate keys of table '{}'",
                logic_table
            ))
        })?;
        rule.generate_key(&self.defaults)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn build_defaults(config: &ShardingRuleConfiguration, registry: &AlgorithmRegistry) -> Result<RuleDefaults> {
    let database_strategy = config
        .default_database_strategy
        .as_ref()
        .map(|s| ShardingStrategy::from_config(s, registry).map(Arc::new))
        .transpose()?;
    let table_strategy = config
        .default_table_strategy
        .as_ref()
        .map(|s| ShardingStrategy::from_config(s, registry).map(Arc::new))
        .transpose()?;

    let (key_generate_column, key_generator): (Option<String>, Arc<dyn KeyGenerateAlgorithm>) =
        match &config.default_key_generator {
            Some(key_config) => (
                Some(key_config.column.trim().to_string()).filter(|c| !c.is_empty()),
                registry.create_key_generator(&key_config.algorithm)?,
            ),
            None => (None, Arc::new(SnowflakeKeyGenerateAlgorithm::new(Properties::new())?)),
        };

    Ok(RuleDefaults {
        database_strategy,
        table_strategy,
        key_generate_column,
        key_generator: Some(key_generator),
    })
}

fn build_binding_rules(groups: &[String], table_rules: &[Arc<TableRule>]) -> Result<Vec<BindingTableRule>> {
    let mut bound: Vec<String> = Vec::new();
    let mut binding_rules = Vec::with_capacity(groups.len());

    for group in groups {
        let mut members: Vec<Arc<TableRule>> = Vec::new();
        for name in group.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let rule = table_rules
                .iter()
                .find(|rule| rule.logic_table().eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    ShardingError::Configuration(format!(
                        "Binding table '{}' must be configured as a table rule",
                        name
                    ))
                })?;
            if members.iter().any(|m| Arc::ptr_eq(m, rule)) {
                continue;
            }
            if bound.iter().any(|b| b == rule.logic_table()) {
                return Err(ShardingError::Configuration(format!(
                    "Table '{}' cannot belong to more than one binding group",
                    rule.logic_table()
                )));
            }
            bound.push(rule.logic_table().to_string());
            members.push(Arc::clone(rule));
        }
        binding_rules.push(BindingTableRule::new(members)?);
    }
    Ok(binding_rules)
}

fn values_for(strategy: &ShardingStrategy, logic_table: &str, route_values: &[RouteValue]) -> Vec<RouteValue> {
    route_values
        .iter()
        .filter(|v| v.table_name().eq_ignore_ascii_case(logic_table) && strategy.is_sharding_column(v.column_name()))
        .cloned()
        .collect()
}
