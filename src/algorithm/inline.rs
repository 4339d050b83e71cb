//! Inline expression sharding algorithms
//!
//! The target name is computed by an inline expression such as
//! `t_order_${order_id % 2}`, with the sharding column bound as a variable.

use super::{
    bool_prop, find_target, push_unique, required_prop, ComplexKeysShardingAlgorithm, ComplexKeysShardingValue,
    HintShardingAlgorithm, HintShardingValue, PreciseShardingValue, Properties, RangeShardingValue,
    ShardingAlgorithm, StandardShardingAlgorithm,
};
use crate::error::{Result, ShardingError};
use crate::inline::{InlineExpressionParser, Value, Variables};
use crate::route::ShardingValue;

const ALGORITHM_EXPRESSION: &str = "algorithm-expression";
const ALLOW_RANGE_QUERY: &str = "allow-range-query-with-inline-sharding";
const SHARDING_COLUMNS: &str = "sharding-columns";
const HINT_VALUE_VARIABLE: &str = "value";
const DEFAULT_HINT_EXPRESSION: &str = "${value}";

fn range_not_allowed(algorithm: &str) -> ShardingError {
    ShardingError::UnsupportedOperation(format!(
        "Range sharding is not supported by {} unless '{}' is true",
        algorithm, ALLOW_RANGE_QUERY
    ))
}

// =============================================================================
// INLINE
// =============================================================================

#[derive(Debug)]
pub struct InlineShardingAlgorithm {
    props: Properties,
}

impl InlineShardingAlgorithm {
    pub const TYPE: &'static str = "INLINE";

    pub fn new(props: Properties) -> Self {
        Self { props }
    }

    fn expression(&self) -> Result<&str> {
        required_prop(&self.props, ALGORITHM_EXPRESSION, Self::TYPE)
    }
}

impl ShardingAlgorithm for InlineShardingAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn init(&self) -> Result<()> {
        self.expression().map(|_| ())
    }
}

impl StandardShardingAlgorithm for InlineShardingAlgorithm {
    fn do_precise_sharding(&self, available: &[String], value: &PreciseShardingValue<'_>) -> Result<Option<String>> {
        let mut variables = Variables::new();
        variables.insert(value.column_name.to_string(), Value::from(value.value));
        let name = InlineExpressionParser::evaluate_with(self.expression()?, &variables)?;
        Ok(find_target(available, &name))
    }

    fn do_range_sharding(&self, available: &[String], _value: &RangeShardingValue<'_>) -> Result<Vec<String>> {
        if bool_prop(&self.props, ALLOW_RANGE_QUERY) {
            Ok(available.to_vec())
        } else {
            Err(range_not_allowed(Self::TYPE))
        }
    }
}

// =============================================================================
// COMPLEX_INLINE
// =============================================================================

/// Evaluates the expression for every combination of the columns' values
#[derive(Debug)]
pub struct ComplexInlineShardingAlgorithm {
    props: Properties,
}

impl ComplexInlineShardingAlgorithm {
    pub const TYPE: &'static str = "COMPLEX_INLINE";

    pub fn new(props: Properties) -> Self {
        Self { props }
    }

    fn expression(&self) -> Result<&str> {
        required_prop(&self.props, ALGORITHM_EXPRESSION, Self::TYPE)
    }

    fn sharding_columns(&self) -> Vec<String> {
        self.props
            .get(SHARDING_COLUMNS)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ShardingAlgorithm for ComplexInlineShardingAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }

    fn init(&self) -> Result<()> {
        self.expression().map(|_| ())
    }
}

impl ComplexKeysShardingAlgorithm for ComplexInlineShardingAlgorithm {
    fn do_sharding(&self, available: &[String], value: &ComplexKeysShardingValue) -> Result<Vec<String>> {
        if !value.column_ranges.is_empty() {
            return if bool_prop(&self.props, ALLOW_RANGE_QUERY) {
                Ok(available.to_vec())
            } else {
                Err(range_not_allowed(Self::TYPE))
            };
        }

        let columns = self.sharding_columns();
        if !columns.is_empty() && columns.len() != value.column_values.len() {
            return Err(ShardingError::InvalidShardingValue(format!(
                "{} needs {} sharding columns, but only found {}",
                Self::TYPE,
                columns.len(),
                value.column_values.len()
            )));
        }

        let expression = self.expression()?;
        let mut result = Vec::new();
        for variables in combinations(&value.column_values) {
            let name = InlineExpressionParser::evaluate_with(expression, &variables)?;
            if let Some(target) = find_target(available, &name) {
                push_unique(&mut result, target);
            }
        }
        Ok(result)
    }
}

/// Cartesian product of column values as variable bindings
fn combinations(column_values: &std::collections::BTreeMap<String, Vec<ShardingValue>>) -> Vec<Variables> {
    let mut result = vec![Variables::new()];
    for (column, values) in column_values {
        result = result
            .iter()
            .flat_map(|bound| {
                values.iter().map(move |v| {
                    let mut next = bound.clone();
                    next.insert(column.clone(), Value::from(v));
                    next
                })
            })
            .collect();
    }
    result
}

// =============================================================================
// HINT_INLINE
// =============================================================================

/// Each hint value is bound as `value`
#[derive(Debug)]
pub struct HintInlineShardingAlgorithm {
    props: Properties,
}

impl HintInlineShardingAlgorithm {
    pub const TYPE: &'static str = "HINT_INLINE";

    pub fn new(props: Properties) -> Self {
        Self { props }
    }

    fn expression(&self) -> &str {
        self.props
            .get(ALGORITHM_EXPRESSION)
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_HINT_EXPRESSION)
    }
}

impl ShardingAlgorithm for HintInlineShardingAlgorithm {
    fn type_name(&self) -> &str {
        Self::TYPE
    }

    fn props(&self) -> &Properties {
        &self.props
    }
}

impl HintShardingAlgorithm for HintInlineShardingAlgorithm {
    fn do_sharding(&self, available: &[String], value: &HintShardingValue<'_>) -> Result<Vec<String>> {
        let mut result = Vec::new();
        for each in value.values {
            let mut variables = Variables::new();
            variables.insert(HINT_VALUE_VARIABLE.to_string(), Value::from(each));
            let name = InlineExpressionParser::evaluate_with(self.expression(), &variables)?;
            if let Some(target) = find_target(available, &name) {
                push_unique(&mut result, target);
            }
        }
        Ok(result)
    }
}
