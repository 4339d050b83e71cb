//! Rule Module
//!
//! The aggregate routing model built once from configuration.
//!
//! ```text
//!   ShardingRuleContext ──▶ Arc<ShardingRule>
//!                              ├── TableRule*  ──▶ DataNode*, strategies, key generator
//!                              ├── BindingTableRule*  (groups of TableRule)
//!                              ├── broadcast tables
//!                              └── RuleDefaults
//! ```

mod binding;
mod context;
mod sharding;
mod table;

pub use binding::BindingTableRule;
pub use context::ShardingRuleContext;
pub use sharding::ShardingRule;
pub use table::{RuleDefaults, TableRule};
