//! Sharding values and value ranges
//!
//! Values extracted from SQL predicates by the caller. Only integers and
//! strings are routed; anything else is the SQL layer's concern.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;

/// A single predicate value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShardingValue {
    Int(i64),
    Str(String),
}

impl ShardingValue {
    /// Numeric view of the value (strings are parsed)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ShardingValue::Int(v) => Some(*v),
            ShardingValue::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Bytes fed to hashing algorithms: the displayed form, so `Int(5)`
    /// and `Str("5")` hash alike
    pub fn hash_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for ShardingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardingValue::Int(v) => write!(f, "{}", v),
            ShardingValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ShardingValue {
    fn from(v: i64) -> Self {
        ShardingValue::Int(v)
    }
}

impl From<i32> for ShardingValue {
    fn from(v: i32) -> Self {
        ShardingValue::Int(v as i64)
    }
}

impl From<&str> for ShardingValue {
    fn from(v: &str) -> Self {
        ShardingValue::Str(v.to_string())
    }
}

impl From<String> for ShardingValue {
    fn from(v: String) -> Self {
        ShardingValue::Str(v)
    }
}

/// A value range with open, closed or unbounded ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRange {
    pub lower: Bound<ShardingValue>,
    pub upper: Bound<ShardingValue>,
}

impl ValueRange {
    pub fn new(lower: Bound<ShardingValue>, upper: Bound<ShardingValue>) -> Self {
        Self { lower, upper }
    }

    /// `[lower, upper]`, as produced by BETWEEN
    pub fn closed(lower: impl Into<ShardingValue>, upper: impl Into<ShardingValue>) -> Self {
        Self::new(Bound::Included(lower.into()), Bound::Included(upper.into()))
    }

    /// `[lower, upper)`
    pub fn closed_open(lower: impl Into<ShardingValue>, upper: impl Into<ShardingValue>) -> Self {
        Self::new(Bound::Included(lower.into()), Bound::Excluded(upper.into()))
    }

    /// `(lower, upper)`
    pub fn open(lower: impl Into<ShardingValue>, upper: impl Into<ShardingValue>) -> Self {
        Self::new(Bound::Excluded(lower.into()), Bound::Excluded(upper.into()))
    }

    /// `>= lower`
    pub fn at_least(lower: impl Into<ShardingValue>) -> Self {
        Self::new(Bound::Included(lower.into()), Bound::Unbounded)
    }

    /// `> lower`
    pub fn greater_than(lower: impl Into<ShardingValue>) -> Self {
        Self::new(Bound::Excluded(lower.into()), Bound::Unbounded)
    }

    /// `<= upper`
    pub fn at_most(upper: impl Into<ShardingValue>) -> Self {
        Self::new(Bound::Unbounded, Bound::Included(upper.into()))
    }

    /// `< upper`
    pub fn less_than(upper: impl Into<ShardingValue>) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(upper.into()))
    }

    pub fn all() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    pub fn contains(&self, value: &ShardingValue) -> bool {
        let above_lower = match &self.lower {
            Bound::Included(l) => value >= l,
            Bound::Excluded(l) => value > l,
            Bound::Unbounded => true,
        };
        let below_upper = match &self.upper {
            Bound::Included(u) => value <= u,
            Bound::Excluded(u) => value < u,
            Bound::Unbounded => true,
        };
        above_lower && below_upper
    }

    /// Convert to an inclusive integer interval
    ///
    /// Returns `None` for an empty range, `Err(value)` if a bound is not numeric.
    pub fn to_inclusive_i64(&self) -> std::result::Result<Option<(i64, i64)>, ShardingValue> {
        let low = match &self.lower {
            Bound::Included(v) => as_i64(v)?,
            Bound::Excluded(v) => match as_i64(v)?.checked_add(1) {
                Some(n) => n,
                None => return Ok(None),
            },
            Bound::Unbounded => i64::MIN,
        };
        let high = match &self.upper {
            Bound::Included(v) => as_i64(v)?,
            Bound::Excluded(v) => match as_i64(v)?.checked_sub(1) {
                Some(n) => n,
                None => return Ok(None),
            },
            Bound::Unbounded => i64::MAX,
        };
        match low.cmp(&high) {
            Ordering::Greater => Ok(None),
            _ => Ok(Some((low, high))),
        }
    }
}

fn as_i64(value: &ShardingValue) -> std::result::Result<i64, ShardingValue> {
    value.as_i64().ok_or_else(|| value.clone())
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Bound::Included(v) => write!(f, "[{}", v)?,
            Bound::Excluded(v) => write!(f, "({}", v)?,
            Bound::Unbounded => f.write_str("(-∞")?,
        }
        f.write_str("..")?;
        match &self.upper {
            Bound::Included(v) => write!(f, "{}]", v),
            Bound::Excluded(v) => write!(f, "{})", v),
            Bound::Unbounded => f.write_str("+∞)"),
        }
    }
}
