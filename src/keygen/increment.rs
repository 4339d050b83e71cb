//! Increment key generator

use std::sync::atomic::{AtomicI64, Ordering};

use super::KeyGenerateAlgorithm;
use crate::algorithm::Properties;
use crate::error::Result;

/// Process-local counter; unique only within one rule instance
#[derive(Debug, Default)]
pub struct IncrementKeyGenerateAlgorithm {
    props: Properties,
    /// Last key handed out (atomic, lock-free)
    count: AtomicI64,
}

impl IncrementKeyGenerateAlgorithm {
    pub const TYPE: &'static str = "INCREMENT";

    pub fn new(props: Properties) -> Self {
        Self {
            props,
            count: AtomicI64::new(0),
        }
    }
}

impl KeyGenerateAlgorithm for IncrementKeyGenerateAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn generate_key(&self) -> Result<i64> {
        Ok(self.count.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
