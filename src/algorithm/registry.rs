//! Algorithm Registry
//!
//! Explicit type key -> factory map, populated with the built-ins on
//! construction. Custom algorithms are registered by the application before a
//! rule is built; nothing is discovered at runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{
    ComplexInlineShardingAlgorithm, ComplexKeysShardingAlgorithm, CustomRangeShardingAlgorithm,
    HashModShardingAlgorithm, HintInlineShardingAlgorithm, HintShardingAlgorithm, InlineShardingAlgorithm,
    ModShardingAlgorithm, Properties, StandardRangeShardingAlgorithm, StandardShardingAlgorithm,
};
use crate::config::AlgorithmConfiguration;
use crate::error::{Result, ShardingError};
use crate::keygen::{IncrementKeyGenerateAlgorithm, KeyGenerateAlgorithm, SnowflakeKeyGenerateAlgorithm};

type Factory<T> = Arc<dyn Fn(Properties) -> Result<Arc<T>> + Send + Sync>;

/// Factories for every algorithm kind, keyed by upper-cased type name
#[derive(Clone)]
pub struct AlgorithmRegistry {
    standard: HashMap<String, Factory<dyn StandardShardingAlgorithm>>,
    complex: HashMap<String, Factory<dyn ComplexKeysShardingAlgorithm>>,
    hint: HashMap<String, Factory<dyn HintShardingAlgorithm>>,
    key_generators: HashMap<String, Factory<dyn KeyGenerateAlgorithm>>,
}

impl AlgorithmRegistry {
    /// A registry with no algorithms at all
    pub fn empty() -> Self {
        Self {
            standard: HashMap::new(),
            complex: HashMap::new(),
            hint: HashMap::new(),
            key_generators: HashMap::new(),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    pub fn register_standard<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(Properties) -> Result<Arc<dyn StandardShardingAlgorithm>> + Send + Sync + 'static,
    {
        self.standard.insert(type_name.to_ascii_uppercase(), Arc::new(factory));
        self
    }

    pub fn register_complex<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(Properties) -> Result<Arc<dyn ComplexKeysShardingAlgorithm>> + Send + Sync + 'static,
    {
        self.complex.insert(type_name.to_ascii_uppercase(), Arc::new(factory));
        self
    }

    pub fn register_hint<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(Properties) -> Result<Arc<dyn HintShardingAlgorithm>> + Send + Sync + 'static,
    {
        self.hint.insert(type_name.to_ascii_uppercase(), Arc::new(factory));
        self
    }

    pub fn register_key_generator<F>(&mut self, type_name: &str, factory: F) -> &mut Self
    where
        F: Fn(Properties) -> Result<Arc<dyn KeyGenerateAlgorithm>> + Send + Sync + 'static,
    {
        self.key_generators.insert(type_name.to_ascii_uppercase(), Arc::new(factory));
        self
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Create and initialize a standard algorithm; property errors surface here
    pub fn create_standard(&self, config: &AlgorithmConfiguration) -> Result<Arc<dyn StandardShardingAlgorithm>> {
        let factory = lookup(&self.standard, config, "standard sharding")?;
        let algorithm = factory(config.props.clone())?;
        algorithm.init()?;
        Ok(algorithm)
    }

    pub fn create_complex(&self, config: &AlgorithmConfiguration) -> Result<Arc<dyn ComplexKeysShardingAlgorithm>> {
        let factory = lookup(&self.complex, config, "complex keys sharding")?;
        let algorithm = factory(config.props.clone())?;
        algorithm.init()?;
        Ok(algorithm)
    }

    pub fn create_hint(&self, config: &AlgorithmConfiguration) -> Result<Arc<dyn HintShardingAlgorithm>> {
        let factory = lookup(&self.hint, config, "hint sharding")?;
        let algorithm = factory(config.props.clone())?;
        algorithm.init()?;
        Ok(algorithm)
    }

    pub fn create_key_generator(&self, config: &AlgorithmConfiguration) -> Result<Arc<dyn KeyGenerateAlgorithm>> {
        let factory = lookup(&self.key_generators, config, "key generate")?;
        factory(config.props.clone())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        let key = type_name.to_ascii_uppercase();
        self.standard.contains_key(&key)
            || self.complex.contains_key(&key)
            || self.hint.contains_key(&key)
            || self.key_generators.contains_key(&key)
    }
}

fn lookup<'a, T: ?Sized>(
    factories: &'a HashMap<String, Factory<T>>,
    config: &AlgorithmConfiguration,
    kind: &str,
) -> Result<&'a Factory<T>> {
    factories.get(&config.type_name.to_ascii_uppercase()).ok_or_else(|| {
        ShardingError::Configuration(format!(
            "Cannot find {} algorithm of type '{}'",
            kind, config.type_name
        ))
    })
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register_standard(InlineShardingAlgorithm::TYPE, builtin::inline)
            .register_standard(ModShardingAlgorithm::TYPE, builtin::modulo)
            .register_standard(HashModShardingAlgorithm::TYPE, builtin::hash_mod)
            .register_standard(StandardRangeShardingAlgorithm::TYPE, builtin::standard_range)
            .register_standard(CustomRangeShardingAlgorithm::TYPE, builtin::custom_range)
            .register_complex(ComplexInlineShardingAlgorithm::TYPE, builtin::complex_inline)
            .register_hint(HintInlineShardingAlgorithm::TYPE, builtin::hint_inline)
            .register_key_generator(SnowflakeKeyGenerateAlgorithm::TYPE, builtin::snowflake)
            .register_key_generator(IncrementKeyGenerateAlgorithm::TYPE, builtin::increment);
        registry
    }
}

mod builtin {
    use super::*;

    pub(super) fn inline(props: Properties) -> Result<Arc<dyn StandardShardingAlgorithm>> {
        Ok(Arc::new(InlineShardingAlgorithm::new(props)))
    }

    pub(super) fn modulo(props: Properties) -> Result<Arc<dyn StandardShardingAlgorithm>> {
        Ok(Arc::new(ModShardingAlgorithm::new(props)))
    }

    pub(super) fn hash_mod(props: Properties) -> Result<Arc<dyn StandardShardingAlgorithm>> {
        Ok(Arc::new(HashModShardingAlgorithm::new(props)))
    }

    pub(super) fn standard_range(props: Properties) -> Result<Arc<dyn StandardShardingAlgorithm>> {
        Ok(Arc::new(StandardRangeShardingAlgorithm::new(props)))
    }

    pub(super) fn custom_range(props: Properties) -> Result<Arc<dyn StandardShardingAlgorithm>> {
        Ok(Arc::new(CustomRangeShardingAlgorithm::new(props)))
    }

    pub(super) fn complex_inline(props: Properties) -> Result<Arc<dyn ComplexKeysShardingAlgorithm>> {
        Ok(Arc::new(ComplexInlineShardingAlgorithm::new(props)))
    }

    pub(super) fn hint_inline(props: Properties) -> Result<Arc<dyn HintShardingAlgorithm>> {
        Ok(Arc::new(HintInlineShardingAlgorithm::new(props)))
    }

    pub(super) fn snowflake(props: Properties) -> Result<Arc<dyn KeyGenerateAlgorithm>> {
        Ok(Arc::new(SnowflakeKeyGenerateAlgorithm::new(props)?))
    }

    pub(super) fn increment(props: Properties) -> Result<Arc<dyn KeyGenerateAlgorithm>> {
        Ok(Arc::new(IncrementKeyGenerateAlgorithm::new(props)))
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("standard", &sorted_keys(&self.standard))
            .field("complex", &sorted_keys(&self.complex))
            .field("hint", &sorted_keys(&self.hint))
            .field("key_generators", &sorted_keys(&self.key_generators))
            .finish()
    }
}
