//! Route Module
//!
//! Per-statement inputs handed to the routing engine by the SQL layer.
//!
//! ## Responsibilities
//! - Carry equality / IN-list predicate values (`ListRouteValue`)
//! - Carry BETWEEN / comparison predicate ranges (`RangeRouteValue`)
//! - Carry out-of-band hint values for hint strategies (`HintValues`,
//!   `HintRouteValue`)
//!
//! Route values are created fresh per statement and never persisted.

mod hint;
mod value;

pub use hint::HintValues;
pub use value::{ShardingValue, ValueRange};

/// Equality or IN-list predicate values for one column
#[derive(Debug, Clone, PartialEq)]
pub struct ListRouteValue {
    pub table_name: String,
    pub column_name: String,
    /// Insertion-ordered, duplicates removed
    pub values: Vec<ShardingValue>,
}

impl ListRouteValue {
    pub fn new<I, V>(table_name: impl Into<String>, column_name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ShardingValue>,
    {
        let mut deduped: Vec<ShardingValue> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            values: deduped,
        }
    }
}

/// Range predicate for one column
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRouteValue {
    pub table_name: String,
    pub column_name: String,
    pub value_range: ValueRange,
}

impl RangeRouteValue {
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>, value_range: ValueRange) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            value_range,
        }
    }
}

/// Hint values for one logic table, bound to no column
///
/// Only hint strategies read these; standard and complex strategies never
/// match them, and hint strategies never read SQL predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct HintRouteValue {
    pub table_name: String,
    /// Insertion-ordered, duplicates removed
    pub values: Vec<ShardingValue>,
}

impl HintRouteValue {
    pub fn new<I, V>(table_name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ShardingValue>,
    {
        let mut deduped: Vec<ShardingValue> = Vec::new();
        for value in values.into_iter().map(Into::into) {
            if !deduped.contains(&value) {
                deduped.push(value);
            }
        }
        Self {
            table_name: table_name.into(),
            values: deduped,
        }
    }
}

/// Sharding predicate extracted from one statement, or a hint
#[derive(Debug, Clone, PartialEq)]
pub enum RouteValue {
    List(ListRouteValue),
    Range(RangeRouteValue),
    Hint(HintRouteValue),
}

impl RouteValue {
    /// Shorthand for a list route value
    pub fn list<I, V>(table_name: &str, column_name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ShardingValue>,
    {
        RouteValue::List(ListRouteValue::new(table_name, column_name, values))
    }

    /// Shorthand for a range route value
    pub fn range(table_name: &str, column_name: &str, value_range: ValueRange) -> Self {
        RouteValue::Range(RangeRouteValue::new(table_name, column_name, value_range))
    }

    /// Shorthand for a hint route value
    pub fn hint<I, V>(table_name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ShardingValue>,
    {
        RouteValue::Hint(HintRouteValue::new(table_name, values))
    }

    pub fn table_name(&self) -> &str {
        match self {
            RouteValue::List(v) => &v.table_name,
            RouteValue::Range(v) => &v.table_name,
            RouteValue::Hint(v) => &v.table_name,
        }
    }

    /// Empty for hint values
    pub fn column_name(&self) -> &str {
        match self {
            RouteValue::List(v) => &v.column_name,
            RouteValue::Range(v) => &v.column_name,
            RouteValue::Hint(_) => "",
        }
    }

    pub fn is_hint(&self) -> bool {
        matches!(self, RouteValue::Hint(_))
    }

    /// Hint values are bound to no column and never match
    pub fn is_for_column(&self, column: &str) -> bool {
        !self.is_hint() && self.column_name().eq_ignore_ascii_case(column)
    }
}
