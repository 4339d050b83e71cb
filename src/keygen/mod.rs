//! Key Generation Module
//!
//! Distributed primary keys for inserts that omit them.
//!
//! ## Responsibilities
//! - Produce unique, monotonically increasing keys under concurrent callers
//! - Isolate the only shared mutable state of the routing core
//!
//! ## Generators
//! - `SNOWFLAKE`: 41-bit millisecond timestamp | 10-bit worker id | 12-bit sequence
//!   (state behind one `parking_lot::Mutex`)
//! - `INCREMENT`: process-local atomic counter starting at 1

mod increment;
mod snowflake;

pub use increment::IncrementKeyGenerateAlgorithm;
pub use snowflake::{SnowflakeKeyGenerateAlgorithm, SystemTimeService, TimeService, EPOCH_MILLIS};

use std::fmt;

use crate::algorithm::Properties;
use crate::error::Result;

/// Key generator shared by every inserting thread
pub trait KeyGenerateAlgorithm: Send + Sync + fmt::Debug {
    /// Registry type key, e.g. `SNOWFLAKE`
    fn type_name(&self) -> &str;

    fn props(&self) -> &Properties;

    fn generate_key(&self) -> Result<i64>;
}
