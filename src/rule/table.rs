//! Table Rule
//!
//! Sharding definition of one logic table: its physical data nodes, its
//! database/table strategies and its key generator.
//!
//! ## Resolution
//!
//! ```text
//!   actual data nodes ──┬── distinct data sources ──▶ database strategy ──┐
//!                       │                                                 ├──▶ cross-filter
//!                       └── distinct tables ────────▶ table strategy ─────┘
//! ```
//!
//! A node is kept only when its data source AND its table both survive their
//! own narrowing; the result keeps the configured node order.

use std::sync::Arc;

use tracing::trace;

use crate::algorithm::AlgorithmRegistry;
use crate::config::TableRuleConfiguration;
use crate::datanode::DataNode;
use crate::error::{Result, ShardingError};
use crate::inline::InlineExpressionParser;
use crate::keygen::KeyGenerateAlgorithm;
use crate::route::RouteValue;
use crate::strategy::ShardingStrategy;

/// Rule-level fallbacks consulted when a table rule configures nothing itself
#[derive(Debug, Clone, Default)]
pub struct RuleDefaults {
    pub database_strategy: Option<Arc<ShardingStrategy>>,
    pub table_strategy: Option<Arc<ShardingStrategy>>,
    pub key_generate_column: Option<String>,
    pub key_generator: Option<Arc<dyn KeyGenerateAlgorithm>>,
}

/// Sharding definition of one logic table
#[derive(Debug)]
pub struct TableRule {
    /// Lower-cased logic table name
    logic_table: String,

    /// Physical placement, in configuration order
    actual_data_nodes: Vec<DataNode>,

    /// Actual tables grouped by data source; ordinals drive binding translation
    tables_by_data_source: Vec<(String, Vec<String>)>,

    database_strategy: Option<Arc<ShardingStrategy>>,
    table_strategy: Option<Arc<ShardingStrategy>>,

    key_generate_column: Option<String>,
    key_generator: Option<Arc<dyn KeyGenerateAlgorithm>>,

    /// Synthetic rule for a broadcast table: never narrowed
    broadcast: bool,
}

impl TableRule {
    /// Build a table rule from configuration
    ///
    /// `default_key_column` is the rule-level key column used when the table
    /// binds no key generator of its own.
    pub fn new(
        config: &TableRuleConfiguration,
        data_source_names: &[String],
        registry: &AlgorithmRegistry,
        default_key_column: Option<&str>,
    ) -> Result<Self> {
        let logic_table = config.logic_table.trim().to_ascii_lowercase();
        if logic_table.is_empty() {
            return Err(ShardingError::Configuration("Logic table name cannot be empty".to_string()));
        }

        // Step 1: Expand and validate the physical nodes
        let actual_data_nodes = match config.actual_data_nodes.as_deref().map(str::trim) {
            Some(expression) if !expression.is_empty() => {
                parse_data_nodes(&logic_table, expression, data_source_names)?
            }
            _ => default_data_nodes(&logic_table, data_source_names),
        };

        // Step 2: Build strategies; a missing column or algorithm fails here
        let database_strategy = config
            .database_strategy
            .as_ref()
            .map(|s| ShardingStrategy::from_config(s, registry).map(Arc::new))
            .transpose()?;
        let table_strategy = config
            .table_strategy
            .as_ref()
            .map(|s| ShardingStrategy::from_config(s, registry).map(Arc::new))
            .transpose()?;

        // Step 3: Key generation
        let (key_generate_column, key_generator) = match &config.key_generator {
            Some(key_config) => {
                let column = key_config.column.trim();
                if column.is_empty() {
                    return Err(ShardingError::Configuration(format!(
                        "Key generate column of table '{}' cannot be empty",
                        logic_table
                    )));
                }
                let generator = registry.create_key_generator(&key_config.algorithm)?;
                (Some(column.to_string()), Some(generator))
            }
            None => (default_key_column.map(str::to_string), None),
        };

        Ok(Self::assemble(
            logic_table,
            actual_data_nodes,
            database_strategy,
            table_strategy,
            key_generate_column,
            key_generator,
            false,
        ))
    }

    /// Synthetic rule placing a broadcast table on every data source
    pub fn broadcast(logic_table: &str, data_source_names: &[String]) -> Self {
        let logic_table = logic_table.trim().to_ascii_lowercase();
        let nodes = default_data_nodes(&logic_table, data_source_names);
        Self::assemble(logic_table, nodes, None, None, None, None, true)
    }

    fn assemble(
        logic_table: String,
        actual_data_nodes: Vec<DataNode>,
        database_strategy: Option<Arc<ShardingStrategy>>,
        table_strategy: Option<Arc<ShardingStrategy>>,
        key_generate_column: Option<String>,
        key_generator: Option<Arc<dyn KeyGenerateAlgorithm>>,
        broadcast: bool,
    ) -> Self {
        let mut tables_by_data_source: Vec<(String, Vec<String>)> = Vec::new();
        for node in &actual_data_nodes {
            match tables_by_data_source
                .iter_mut()
                .find(|(ds, _)| node.is_in_data_source(ds))
            {
                Some((_, tables)) => tables.push(node.table_name().to_string()),
                None => tables_by_data_source.push((
                    node.data_source_name().to_string(),
                    vec![node.table_name().to_string()],
                )),
            }
        }

        Self {
            logic_table,
            actual_data_nodes,
            tables_by_data_source,
            database_strategy,
            table_strategy,
            key_generate_column,
            key_generator,
            broadcast,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn logic_table(&self) -> &str {
        &self.logic_table
    }

    pub fn actual_data_nodes(&self) -> &[DataNode] {
        &self.actual_data_nodes
    }

    pub fn database_strategy(&self) -> Option<&Arc<ShardingStrategy>> {
        self.database_strategy.as_ref()
    }

    pub fn table_strategy(&self) -> Option<&Arc<ShardingStrategy>> {
        self.table_strategy.as_ref()
    }

    pub fn key_generate_column(&self) -> Option<&str> {
        self.key_generate_column.as_deref()
    }

    pub fn has_key_generate_column(&self) -> bool {
        self.key_generate_column.is_some()
    }

    pub fn is_broadcast(&self) -> bool {
        self.broadcast
    }

    /// Distinct data sources, in configuration order
    pub fn actual_datasource_names(&self) -> Vec<String> {
        self.tables_by_data_source.iter().map(|(ds, _)| ds.clone()).collect()
    }

    /// Actual tables of one data source, in configuration order
    pub fn actual_table_names(&self, data_source_name: &str) -> &[String] {
        self.tables_by_data_source
            .iter()
            .find(|(ds, _)| ds.eq_ignore_ascii_case(data_source_name))
            .map(|(_, tables)| tables.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct actual tables across every data source
    pub fn all_actual_table_names(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for node in &self.actual_data_nodes {
            if !tables.iter().any(|t| t.eq_ignore_ascii_case(node.table_name())) {
                tables.push(node.table_name().to_string());
            }
        }
        tables
    }

    /// Nodes grouped by data source
    pub fn data_node_groups(&self) -> Vec<(String, Vec<DataNode>)> {
        self.tables_by_data_source
            .iter()
            .map(|(ds, tables)| (ds.clone(), tables.iter().map(|t| DataNode::new(ds.as_str(), t.as_str())).collect()))
            .collect()
    }

    /// Ordinal of an actual table within its data source
    pub fn find_actual_table_index(&self, data_source_name: &str, actual_table: &str) -> Option<usize> {
        self.actual_table_names(data_source_name)
            .iter()
            .position(|t| t.eq_ignore_ascii_case(actual_table))
    }

    pub fn is_existed(&self, actual_table: &str) -> bool {
        self.actual_data_nodes
            .iter()
            .any(|node| node.table_name().eq_ignore_ascii_case(actual_table))
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Resolve route values to the data nodes that must be touched
    ///
    /// An empty result is legal: the predicates matched no shard.
    pub fn resolve(
        &self,
        defaults: &RuleDefaults,
        database_values: &[RouteValue],
        table_values: &[RouteValue],
    ) -> Result<Vec<DataNode>> {
        if self.broadcast {
            return Ok(self.actual_data_nodes.clone());
        }

        let data_sources = self.actual_datasource_names();
        let target_data_sources = match self.database_strategy.as_ref().or(defaults.database_strategy.as_ref()) {
            Some(strategy) => strategy.resolve(&data_sources, database_values)?,
            None => data_sources,
        };

        let tables = self.all_actual_table_names();
        let target_tables = match self.table_strategy.as_ref().or(defaults.table_strategy.as_ref()) {
            Some(strategy) => strategy.resolve(&tables, table_values)?,
            None => tables,
        };

        let nodes: Vec<DataNode> = self
            .actual_data_nodes
            .iter()
            .filter(|node| {
                contains_ignore_case(&target_data_sources, node.data_source_name())
                    && contains_ignore_case(&target_tables, node.table_name())
            })
            .cloned()
            .collect();

        trace!(
            logic_table = %self.logic_table,
            data_sources = target_data_sources.len(),
            tables = target_tables.len(),
            nodes = nodes.len(),
            "Resolved data nodes"
        );
        Ok(nodes)
    }

    /// Generate a key with this table's generator, else the rule default
    pub fn generate_key(&self, defaults: &RuleDefaults) -> Result<i64> {
        let generator = self
            .key_generator
            .as_ref()
            .or(defaults.key_generator.as_ref())
            .ok_or_else(|| {
                ShardingError::Configuration(format!(
                    "No key generator configured for table '{}'",
                    self.logic_table
                ))
            })?;
        generator.generate_key()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_data_nodes(logic_table: &str, data_source_names: &[String]) -> Vec<DataNode> {
    data_source_names
        .iter()
        .map(|ds| DataNode::new(ds.as_str(), logic_table))
        .collect()
}

fn parse_data_nodes(logic_table: &str, expression: &str, data_source_names: &[String]) -> Result<Vec<DataNode>> {
    let mut nodes: Vec<DataNode> = Vec::new();
    for literal in InlineExpressionParser::split_and_evaluate(expression)? {
        let node = DataNode::parse(&literal)?;
        if !contains_ignore_case(data_source_names, node.data_source_name()) {
            return Err(ShardingError::Configuration(format!(
                "Cannot find data source in sharding rule, invalid actual data node is: '{}'",
                literal
            )));
        }
        if nodes.contains(&node) {
            return Err(ShardingError::Configuration(format!(
                "Duplicate actual data node '{}' in table '{}'",
                literal, logic_table
            )));
        }
        nodes.push(node);
    }

    if nodes.is_empty() {
        return Err(ShardingError::Configuration(format!(
            "Actual data nodes of table '{}' cannot be empty",
            logic_table
        )));
    }
    Ok(nodes)
}

pub(crate) fn contains_ignore_case(names: &[String], name: &str) -> bool {
    names.iter().any(|each| each.eq_ignore_ascii_case(name))
}
