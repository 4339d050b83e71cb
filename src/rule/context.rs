//! Sharding Rule Context
//!
//! Owns the current rule snapshot. Readers clone the `Arc` and route against
//! it for as long as they like; a reload builds the replacement first and
//! swaps the reference only once it is complete.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::sharding::ShardingRule;
use crate::algorithm::AlgorithmRegistry;
use crate::config::ShardingRuleConfiguration;
use crate::error::Result;

/// Atomically swappable holder of the active `ShardingRule`
#[derive(Debug)]
pub struct ShardingRuleContext {
    rule: RwLock<Arc<ShardingRule>>,
    registry: AlgorithmRegistry,
}

impl ShardingRuleContext {
    /// Build the first snapshot with the built-in registry
    pub fn new<I, S>(config: &ShardingRuleConfiguration, data_source_names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_registry(config, data_source_names, AlgorithmRegistry::default())
    }

    pub fn with_registry<I, S>(
        config: &ShardingRuleConfiguration,
        data_source_names: I,
        registry: AlgorithmRegistry,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = ShardingRule::with_registry(config, data_source_names, &registry)?;
        Ok(Self {
            rule: RwLock::new(Arc::new(rule)),
            registry,
        })
    }

    /// The rule currently in effect
    pub fn snapshot(&self) -> Arc<ShardingRule> {
        Arc::clone(&self.rule.read())
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Replace the active rule
    ///
    /// On error the previous snapshot keeps serving.
    pub fn reload<I, S>(&self, config: &ShardingRuleConfiguration, data_source_names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rule = match ShardingRule::with_registry(config, data_source_names, &self.registry) {
            Ok(rule) => Arc::new(rule),
            Err(e) => {
                warn!(error = %e, "Sharding rule reload rejected, keeping previous snapshot");
                return Err(e);
            }
        };

        *self.rule.write() = rule;
        debug!("Sharding rule snapshot swapped");
        Ok(())
    }
}
