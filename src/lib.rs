//! # shardroute
//!
//! Sharding rule resolution and routing for a horizontally partitioned
//! relational database:
//! - Logic tables mapped onto physical data nodes (`ds.table`)
//! - Pluggable sharding algorithms behind standard / complex / hint strategies
//! - Binding table groups and broadcast tables
//! - Distributed key generation (snowflake, increment)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            SQL layer: logic table + route values             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    ShardingRule                              │
//! │         (immutable snapshot, shared by all threads)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  TableRule  │          │   KeyGen    │
//!   │ (DataNodes) │          │  (Mutex)    │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Strategy   │ ───────▶ │  Algorithm  │
//!   │ (db/table)  │          │ (registry)  │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod datanode;
pub mod inline;
pub mod route;
pub mod algorithm;
pub mod strategy;
pub mod keygen;
pub mod rule;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ShardingError};
pub use config::{
    AlgorithmConfiguration, KeyGeneratorConfiguration, ShardingConfigFile, ShardingRuleConfiguration,
    ShardingStrategyConfiguration, TableRuleConfiguration,
};
pub use datanode::DataNode;
pub use route::{HintValues, RouteValue, ShardingValue, ValueRange};
pub use algorithm::AlgorithmRegistry;
pub use strategy::ShardingStrategy;
pub use keygen::KeyGenerateAlgorithm;
pub use rule::{BindingTableRule, ShardingRule, ShardingRuleContext, TableRule};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of shardroute
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
