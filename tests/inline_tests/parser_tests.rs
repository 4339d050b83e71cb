//! Inline Expression Tests
//!
//! Tests verify:
//! - Top-level splitting of comma-joined expressions
//! - Range and list placeholders with cartesian expansion
//! - `$->{}` placeholder syntax
//! - Evaluation with bound variables
//! - Error reporting for malformed expressions
//! - Expansion size is capped

use shardroute::inline::{InlineExpressionParser, Value, Variables, MAX_EXPANDED_NAMES};
use shardroute::ShardingValue;

// =============================================================================
// Helper Functions
// =============================================================================

fn vars(pairs: &[(&str, Value)]) -> Variables {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

// =============================================================================
// Splitting Tests
// =============================================================================

#[test]
fn test_is_inline() {
    assert!(InlineExpressionParser::is_inline("t_${0..1}"));
    assert!(InlineExpressionParser::is_inline("t_$->{0..1}"));
    assert!(!InlineExpressionParser::is_inline("t_order"));
}

#[test]
fn test_split_ignores_commas_inside_placeholders() {
    let parts = InlineExpressionParser::split("ds_0.t_${[0, 1]}, ds_1.t_${2..3} ,");
    assert_eq!(parts, vec!["ds_0.t_${[0, 1]}", "ds_1.t_${2..3}"]);
}

#[test]
fn test_plain_literal_evaluates_to_itself() {
    let result = InlineExpressionParser::split_and_evaluate("ds_0.t_order").unwrap();
    assert_eq!(result, vec!["ds_0.t_order"]);
}

// =============================================================================
// Expansion Tests
// =============================================================================

#[test]
fn test_range_expansion() {
    let result = InlineExpressionParser::split_and_evaluate("t_order_${0..2}").unwrap();
    assert_eq!(result, vec!["t_order_0", "t_order_1", "t_order_2"]);
}

#[test]
fn test_descending_range_expansion() {
    let result = InlineExpressionParser::split_and_evaluate("t_${2..0}").unwrap();
    assert_eq!(result, vec!["t_2", "t_1", "t_0"]);
}

#[test]
fn test_list_expansion() {
    let result = InlineExpressionParser::split_and_evaluate("t_${['a', 'b']}").unwrap();
    assert_eq!(result, vec!["t_a", "t_b"]);
}

#[test]
fn test_cartesian_product_left_placeholder_varies_slowest() {
    let result = InlineExpressionParser::split_and_evaluate("ds_${0..1}.t_order_${0..1}").unwrap();
    assert_eq!(
        result,
        vec!["ds_0.t_order_0", "ds_0.t_order_1", "ds_1.t_order_0", "ds_1.t_order_1"]
    );
}

#[test]
fn test_comma_joined_segments_are_concatenated() {
    let result = InlineExpressionParser::split_and_evaluate("ds_0.t_${0..1}, ds_1.t_${2..3}").unwrap();
    assert_eq!(result, vec!["ds_0.t_0", "ds_0.t_1", "ds_1.t_2", "ds_1.t_3"]);
}

#[test]
fn test_arrow_placeholder_syntax() {
    let result = InlineExpressionParser::split_and_evaluate("ds_$->{0..1}").unwrap();
    assert_eq!(result, vec!["ds_0", "ds_1"]);
}

// =============================================================================
// Evaluation Tests
// =============================================================================

#[test]
fn test_evaluate_modulo_with_variable() {
    let v = vars(&[("order_id", Value::from(7))]);
    let name = InlineExpressionParser::evaluate_with("t_order_${order_id % 2}", &v).unwrap();
    assert_eq!(name, "t_order_1");
}

#[test]
fn test_evaluate_arithmetic_precedence() {
    let v = vars(&[("id", Value::from(10))]);
    let name = InlineExpressionParser::evaluate_with("t_${(id + 2) * 3 - 1}", &v).unwrap();
    assert_eq!(name, "t_35");
}

#[test]
fn test_evaluate_integer_division() {
    let v = vars(&[("id", Value::from(17))]);
    let name = InlineExpressionParser::evaluate_with("t_${id / 10}", &v).unwrap();
    assert_eq!(name, "t_1");
}

#[test]
fn test_evaluate_string_variable() {
    let v = vars(&[("region", Value::from(&ShardingValue::from("eu")))]);
    let name = InlineExpressionParser::evaluate_with("ds_${region}", &v).unwrap();
    assert_eq!(name, "ds_eu");
}

#[test]
fn test_evaluate_with_multiple_results_fails() {
    let err = InlineExpressionParser::evaluate_with("t_${0..1}", &Variables::new()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_evaluate_all_with_returns_every_result() {
    let result = InlineExpressionParser::evaluate_all_with("t_${0..1}", &Variables::new()).unwrap();
    assert_eq!(result, vec!["t_0", "t_1"]);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_unknown_variable_fails() {
    let err = InlineExpressionParser::evaluate_with("t_${missing % 2}", &Variables::new()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_unterminated_placeholder_fails() {
    assert!(InlineExpressionParser::split_and_evaluate("t_${0..1").is_err());
}

#[test]
fn test_division_by_zero_fails() {
    let v = vars(&[("id", Value::from(1))]);
    assert!(InlineExpressionParser::evaluate_with("t_${id % 0}", &v).is_err());
}

#[test]
fn test_oversized_expansion_fails() {
    let err = InlineExpressionParser::split_and_evaluate("ds_${0..99999}.t_${0..99999}").unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("expands to more than"));
}

#[test]
fn test_expansion_at_cap_succeeds() {
    let names = InlineExpressionParser::split_and_evaluate("ds_${0..999}.t_${0..999}").unwrap();
    assert_eq!(names.len(), MAX_EXPANDED_NAMES);
}
