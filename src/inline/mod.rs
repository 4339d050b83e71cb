//! Inline Expression Module
//!
//! Expands compact rule expressions into concrete names.
//!
//! ## Syntax
//! ```text
//! ds_${0..1}.t_order_${[0, 1]}        -> ds_0.t_order_0, ds_0.t_order_1, ds_1.t_order_0, ds_1.t_order_1
//! ds_0.t_${0..1}, ds_1.t_${2..3}      -> ds_0.t_0, ds_0.t_1, ds_1.t_2, ds_1.t_3
//! t_order_$->{order_id % 2}           -> t_order_1   (with order_id = 7)
//! ```
//!
//! A placeholder that yields a list multiplies its segment: the result is the
//! cartesian product, with the left-most placeholder varying slowest.

mod eval;
mod template;

pub use eval::{Value, Variables};

use crate::error::{Result, ShardingError};
use template::Segment;

/// Largest number of names one expression may expand to
pub const MAX_EXPANDED_NAMES: usize = 1_000_000;

/// Parser for inline rule expressions
pub struct InlineExpressionParser;

impl InlineExpressionParser {
    /// Whether the expression contains any placeholder
    pub fn is_inline(expression: &str) -> bool {
        expression.contains("${") || expression.contains("$->{")
    }

    /// Split a comma-joined expression at top level without evaluating
    pub fn split(expression: &str) -> Vec<String> {
        template::split_top_level(expression)
    }

    /// Split and evaluate an expression with no variables bound
    pub fn split_and_evaluate(expression: &str) -> Result<Vec<String>> {
        let empty = Variables::new();
        let mut result = Vec::new();
        for segment in template::split_top_level(expression) {
            result.extend(Self::expand(&segment, &empty)?);
            if result.len() > MAX_EXPANDED_NAMES {
                return Err(too_many_names(expression));
            }
        }
        Ok(result)
    }

    /// Evaluate a single template against bound variables, expanding lists
    pub fn evaluate_all_with(expression: &str, variables: &Variables) -> Result<Vec<String>> {
        Self::expand(expression.trim(), variables)
    }

    /// Evaluate a single template that must produce exactly one name
    pub fn evaluate_with(expression: &str, variables: &Variables) -> Result<String> {
        let mut names = Self::evaluate_all_with(expression, variables)?;
        match names.len() {
            1 => Ok(names.remove(0)),
            n => Err(ShardingError::Configuration(format!(
                "Inline expression error: '{}' evaluated to {} values, expected exactly one",
                expression, n
            ))),
        }
    }

    fn expand(template: &str, variables: &Variables) -> Result<Vec<String>> {
        let mut result = vec![String::new()];
        for segment in template::scan(template)? {
            let alternatives = match segment {
                Segment::Literal(text) => vec![text],
                Segment::Placeholder(body) => eval::evaluate(&body, variables)?.render(),
            };
            if result.len().saturating_mul(alternatives.len()) > MAX_EXPANDED_NAMES {
                return Err(too_many_names(template));
            }
            result = result
                .iter()
                .flat_map(|prefix| alternatives.iter().map(move |alt| format!("{}{}", prefix, alt)))
                .collect();
        }
        Ok(result)
    }
}

fn too_many_names(expression: &str) -> ShardingError {
    ShardingError::Configuration(format!(
        "Inline expression error: '{}' expands to more than {} names",
        expression, MAX_EXPANDED_NAMES
    ))
}
