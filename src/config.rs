//! Configuration for shardroute
//!
//! Declarative rule configuration consumed once when a `ShardingRule` is
//! built. Every type is serde-serializable so rules can be kept in JSON
//! documents; algorithms are referenced by registry type key plus properties.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algorithm::Properties;
use crate::error::Result;

// =============================================================================
// Algorithms
// =============================================================================

/// An algorithm reference: registry type key plus its properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfiguration {
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub props: Properties,
}

impl AlgorithmConfiguration {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            props: Properties::new(),
        }
    }

    /// Add one property
    pub fn prop(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.props.insert(key.into(), value.to_string());
        self
    }
}

// =============================================================================
// Strategies
// =============================================================================

/// How one level (database or table) of a logic table is sharded
///
/// Column and algorithm are optional here so that an incomplete entry can be
/// represented and rejected when the rule is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShardingStrategyConfiguration {
    Standard {
        sharding_column: Option<String>,
        algorithm: Option<AlgorithmConfiguration>,
    },
    Complex {
        /// Comma-separated column names
        sharding_columns: Option<String>,
        algorithm: Option<AlgorithmConfiguration>,
    },
    Hint {
        algorithm: Option<AlgorithmConfiguration>,
    },
    None,
}

impl ShardingStrategyConfiguration {
    pub fn standard(sharding_column: impl Into<String>, algorithm: AlgorithmConfiguration) -> Self {
        ShardingStrategyConfiguration::Standard {
            sharding_column: Some(sharding_column.into()),
            algorithm: Some(algorithm),
        }
    }

    pub fn complex(sharding_columns: impl Into<String>, algorithm: AlgorithmConfiguration) -> Self {
        ShardingStrategyConfiguration::Complex {
            sharding_columns: Some(sharding_columns.into()),
            algorithm: Some(algorithm),
        }
    }

    pub fn hint(algorithm: AlgorithmConfiguration) -> Self {
        ShardingStrategyConfiguration::Hint {
            algorithm: Some(algorithm),
        }
    }

    pub fn none() -> Self {
        ShardingStrategyConfiguration::None
    }
}

// =============================================================================
// Key Generation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyGeneratorConfiguration {
    /// Column filled with the generated key
    pub column: String,
    pub algorithm: AlgorithmConfiguration,
}

impl KeyGeneratorConfiguration {
    pub fn new(column: impl Into<String>, algorithm: AlgorithmConfiguration) -> Self {
        Self {
            column: column.into(),
            algorithm,
        }
    }
}

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRuleConfiguration {
    pub logic_table: String,

    /// Inline expression such as `ds_${0..1}.t_order_${0..1}`
    /// Absent: one `ds.logic_table` node per data source
    #[serde(default)]
    pub actual_data_nodes: Option<String>,

    #[serde(default)]
    pub database_strategy: Option<ShardingStrategyConfiguration>,

    #[serde(default)]
    pub table_strategy: Option<ShardingStrategyConfiguration>,

    #[serde(default)]
    pub key_generator: Option<KeyGeneratorConfiguration>,
}

impl TableRuleConfiguration {
    pub fn new(logic_table: impl Into<String>, actual_data_nodes: impl Into<String>) -> Self {
        Self {
            logic_table: logic_table.into(),
            actual_data_nodes: Some(actual_data_nodes.into()),
            database_strategy: None,
            table_strategy: None,
            key_generator: None,
        }
    }

    /// A table placed as `ds.logic_table` on every data source
    pub fn without_data_nodes(logic_table: impl Into<String>) -> Self {
        Self {
            logic_table: logic_table.into(),
            actual_data_nodes: None,
            database_strategy: None,
            table_strategy: None,
            key_generator: None,
        }
    }

    pub fn database_strategy(mut self, strategy: ShardingStrategyConfiguration) -> Self {
        self.database_strategy = Some(strategy);
        self
    }

    pub fn table_strategy(mut self, strategy: ShardingStrategyConfiguration) -> Self {
        self.table_strategy = Some(strategy);
        self
    }

    pub fn key_generator(mut self, key_generator: KeyGeneratorConfiguration) -> Self {
        self.key_generator = Some(key_generator);
        self
    }
}

// =============================================================================
// Sharding Rule
// =============================================================================

/// Main configuration for a sharding rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardingRuleConfiguration {
    #[serde(default)]
    pub tables: Vec<TableRuleConfiguration>,

    /// Each entry is a comma-joined list of logic tables sharded identically
    #[serde(default)]
    pub binding_table_groups: Vec<String>,

    /// Tables replicated identically into every data source
    #[serde(default)]
    pub broadcast_tables: Vec<String>,

    #[serde(default)]
    pub default_database_strategy: Option<ShardingStrategyConfiguration>,

    #[serde(default)]
    pub default_table_strategy: Option<ShardingStrategyConfiguration>,

    /// Snowflake is used when absent
    #[serde(default)]
    pub default_key_generator: Option<KeyGeneratorConfiguration>,
}

impl ShardingRuleConfiguration {
    /// Create a new config builder
    pub fn builder() -> ShardingRuleConfigurationBuilder {
        ShardingRuleConfigurationBuilder::default()
    }
}

/// Builder for ShardingRuleConfiguration
#[derive(Default)]
pub struct ShardingRuleConfigurationBuilder {
    config: ShardingRuleConfiguration,
}

impl ShardingRuleConfigurationBuilder {
    /// Add a sharded table
    pub fn table(mut self, table: TableRuleConfiguration) -> Self {
        self.config.tables.push(table);
        self
    }

    /// Add a binding group, e.g. `"t_order, t_order_item"`
    pub fn binding_group(mut self, group: impl Into<String>) -> Self {
        self.config.binding_table_groups.push(group.into());
        self
    }

    /// Add a broadcast table
    pub fn broadcast_table(mut self, table: impl Into<String>) -> Self {
        self.config.broadcast_tables.push(table.into());
        self
    }

    pub fn default_database_strategy(mut self, strategy: ShardingStrategyConfiguration) -> Self {
        self.config.default_database_strategy = Some(strategy);
        self
    }

    pub fn default_table_strategy(mut self, strategy: ShardingStrategyConfiguration) -> Self {
        self.config.default_table_strategy = Some(strategy);
        self
    }

    pub fn default_key_generator(mut self, key_generator: KeyGeneratorConfiguration) -> Self {
        self.config.default_key_generator = Some(key_generator);
        self
    }

    pub fn build(self) -> ShardingRuleConfiguration {
        self.config
    }
}

// =============================================================================
// Config Documents
// =============================================================================

/// A complete rule document: the data-source universe plus the rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardingConfigFile {
    pub data_source_names: Vec<String>,
    pub rule: ShardingRuleConfiguration,
}

impl ShardingConfigFile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
