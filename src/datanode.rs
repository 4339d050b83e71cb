//! Data Node
//!
//! The atomic unit of physical placement: a (data source, physical table) pair.
//!
//! Equality, hashing and ordering ignore ASCII case on both fields, while the
//! original spelling is kept for display and SQL rewriting.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Result, ShardingError};

const DELIMITER: char = '.';

/// A physical data source / table pair
#[derive(Debug, Clone)]
pub struct DataNode {
    data_source_name: String,
    table_name: String,
}

impl DataNode {
    pub fn new(data_source_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            data_source_name: data_source_name.into(),
            table_name: table_name.into(),
        }
    }

    /// Parse a `data_source.table` literal
    ///
    /// Exactly one separator is allowed and neither side may be blank.
    pub fn parse(literal: &str) -> Result<Self> {
        let mut parts = literal.split(DELIMITER);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(ds), Some(table), None) if !ds.trim().is_empty() && !table.trim().is_empty() => {
                Ok(Self::new(ds.trim(), table.trim()))
            }
            _ => Err(ShardingError::Format(format!(
                "Invalid format for actual data node: '{}'",
                literal
            ))),
        }
    }

    pub fn data_source_name(&self) -> &str {
        &self.data_source_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Case-insensitive match on the data source name
    pub fn is_in_data_source(&self, data_source_name: &str) -> bool {
        self.data_source_name.eq_ignore_ascii_case(data_source_name)
    }

    fn folded(&self) -> (String, String) {
        (
            self.data_source_name.to_ascii_lowercase(),
            self.table_name.to_ascii_lowercase(),
        )
    }
}

impl FromStr for DataNode {
    type Err = ShardingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for DataNode {
    fn eq(&self, other: &Self) -> bool {
        self.data_source_name.eq_ignore_ascii_case(&other.data_source_name)
            && self.table_name.eq_ignore_ascii_case(&other.table_name)
    }
}

impl Eq for DataNode {}

impl Hash for DataNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded().hash(state);
    }
}

impl PartialOrd for DataNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(&other.folded())
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.data_source_name, DELIMITER, self.table_name)
    }
}
