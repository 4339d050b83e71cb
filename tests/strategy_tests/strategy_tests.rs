//! Sharding Strategy Tests
//!
//! Tests verify:
//! - Standard strategy list / range resolution and filtering
//! - Deterministic, case-insensitive ordered output
//! - Complex strategy multi-column resolution
//! - Hint strategy resolution from hint values only
//! - None strategy identity
//! - Fail-fast construction

use shardroute::route::HintValues;
use shardroute::strategy::ShardingStrategy;
use shardroute::{AlgorithmConfiguration, AlgorithmRegistry, RouteValue, ShardingStrategyConfiguration, ValueRange};

// =============================================================================
// Helper Functions
// =============================================================================

fn build(config: ShardingStrategyConfiguration) -> ShardingStrategy {
    ShardingStrategy::from_config(&config, &AlgorithmRegistry::default()).unwrap()
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn table_inline_strategy() -> ShardingStrategy {
    build(ShardingStrategyConfiguration::standard(
        "order_id",
        AlgorithmConfiguration::new("INLINE").prop("algorithm-expression", "t_order_${order_id % 4}"),
    ))
}

fn range_strategy() -> ShardingStrategy {
    build(ShardingStrategyConfiguration::standard(
        "order_id",
        AlgorithmConfiguration::new("STANDARD_RANGE")
            .prop("partition.lower", 10)
            .prop("partition.upper", 45)
            .prop("partition.volume", 10),
    ))
}

fn four_tables() -> Vec<String> {
    names(&["t_order_0", "t_order_1", "t_order_2", "t_order_3"])
}

// =============================================================================
// Standard Strategy Tests
// =============================================================================

#[test]
fn test_standard_list_value() {
    let strategy = table_inline_strategy();
    let values = vec![RouteValue::list("t_order", "order_id", [5_i64])];
    assert_eq!(strategy.resolve(&four_tables(), &values).unwrap(), vec!["t_order_1"]);
}

#[test]
fn test_standard_in_list_is_sorted_and_deduplicated() {
    let strategy = table_inline_strategy();
    let values = vec![RouteValue::list("t_order", "order_id", [7_i64, 2, 3, 11, 6])];
    assert_eq!(
        strategy.resolve(&four_tables(), &values).unwrap(),
        vec!["t_order_2", "t_order_3"]
    );
}

#[test]
fn test_standard_output_is_order_independent() {
    let strategy = table_inline_strategy();
    let forward = vec![RouteValue::list("t_order", "order_id", [1_i64, 2, 3])];
    let backward = vec![RouteValue::list("t_order", "order_id", [3_i64, 2, 1])];
    let first = strategy.resolve(&four_tables(), &forward).unwrap();
    for _ in 0..5 {
        assert_eq!(strategy.resolve(&four_tables(), &backward).unwrap(), first);
    }
    assert_eq!(first, vec!["t_order_1", "t_order_2", "t_order_3"]);
}

#[test]
fn test_standard_ordering_ignores_case() {
    let strategy = build(ShardingStrategyConfiguration::standard(
        "id",
        AlgorithmConfiguration::new("MOD").prop("sharding-count", 3),
    ));
    let available = names(&["B_tbl", "a_tbl", "C_tbl"]);
    let values = vec![RouteValue::list("t", "id", [0_i64, 1, 2])];
    assert_eq!(
        strategy.resolve(&available, &values).unwrap(),
        vec!["a_tbl", "B_tbl", "C_tbl"]
    );
}

#[test]
fn test_standard_value_outside_available_is_filtered() {
    let strategy = table_inline_strategy();
    let values = vec![RouteValue::list("t_order", "order_id", [1_i64, 2])];
    let available = names(&["t_order_1"]);
    assert_eq!(strategy.resolve(&available, &values).unwrap(), vec!["t_order_1"]);
}

#[test]
fn test_standard_column_match_ignores_case() {
    let strategy = table_inline_strategy();
    let values = vec![RouteValue::list("t_order", "ORDER_ID", [2_i64])];
    assert_eq!(strategy.resolve(&four_tables(), &values).unwrap(), vec!["t_order_2"]);
}

#[test]
fn test_standard_without_matching_value_returns_all() {
    let strategy = table_inline_strategy();
    let values = vec![RouteValue::list("t_order", "user_id", [2_i64])];
    assert_eq!(strategy.resolve(&four_tables(), &values).unwrap(), four_tables());
    assert_eq!(strategy.resolve(&four_tables(), &[]).unwrap(), four_tables());
}

#[test]
fn test_standard_range_value() {
    let strategy = range_strategy();
    let available = names(&["p0", "p1", "p2", "p3", "p4", "p5"]);
    let values = vec![RouteValue::range("t_order", "order_id", ValueRange::closed(12, 31))];
    assert_eq!(strategy.resolve(&available, &values).unwrap(), vec!["p1", "p2", "p3"]);
}

#[test]
fn test_standard_contradictory_range_yields_empty() {
    let strategy = range_strategy();
    let available = names(&["p0", "p1", "p2", "p3", "p4", "p5"]);
    let values = vec![RouteValue::range("t_order", "order_id", ValueRange::closed(30, 10))];
    assert!(strategy.resolve(&available, &values).unwrap().is_empty());
}

#[test]
fn test_standard_sharding_columns() {
    let strategy = table_inline_strategy();
    assert_eq!(strategy.sharding_columns(), vec!["order_id"]);
    assert!(strategy.is_sharding_column("Order_Id"));
    assert!(!strategy.is_sharding_column("user_id"));
    assert_eq!(strategy.kind(), "standard");
}

// =============================================================================
// Complex Strategy Tests
// =============================================================================

fn complex_strategy() -> ShardingStrategy {
    build(ShardingStrategyConfiguration::complex(
        "user_id, order_id",
        AlgorithmConfiguration::new("COMPLEX_INLINE")
            .prop("algorithm-expression", "t_order_${user_id % 2}_${order_id % 2}"),
    ))
}

#[test]
fn test_complex_resolves_all_columns_together() {
    let strategy = complex_strategy();
    let available = names(&["t_order_0_0", "t_order_0_1", "t_order_1_0", "t_order_1_1"]);
    let values = vec![
        RouteValue::list("t_order", "user_id", [1_i64]),
        RouteValue::list("t_order", "order_id", [2_i64, 3]),
    ];
    assert_eq!(
        strategy.resolve(&available, &values).unwrap(),
        vec!["t_order_1_0", "t_order_1_1"]
    );
}

#[test]
fn test_complex_without_values_returns_all() {
    let strategy = complex_strategy();
    let available = names(&["t_order_0_0", "t_order_1_1"]);
    assert_eq!(strategy.resolve(&available, &[]).unwrap(), available);
}

#[test]
fn test_complex_sharding_columns_sorted() {
    let strategy = complex_strategy();
    assert_eq!(strategy.sharding_columns(), vec!["order_id", "user_id"]);
}

// =============================================================================
// Hint Strategy Tests
// =============================================================================

#[test]
fn test_hint_uses_hint_values() {
    let strategy = build(ShardingStrategyConfiguration::hint(
        AlgorithmConfiguration::new("HINT_INLINE").prop("algorithm-expression", "ds_${value % 2}"),
    ));
    let mut hints = HintValues::new();
    hints.add_database_value("t_order", 3_i64);
    let values = hints.database_route_values("t_order");
    assert_eq!(
        strategy.resolve(&names(&["ds_0", "ds_1"]), &values).unwrap(),
        vec!["ds_1"]
    );
    assert!(strategy.is_hint());
    assert!(strategy.sharding_columns().is_empty());
}

#[test]
fn test_hint_without_values_returns_all() {
    let strategy = build(ShardingStrategyConfiguration::hint(AlgorithmConfiguration::new("HINT_INLINE")));
    assert_eq!(
        strategy.resolve(&names(&["ds_0", "ds_1"]), &[]).unwrap(),
        names(&["ds_0", "ds_1"])
    );
}

#[test]
fn test_hint_ignores_sql_values() {
    let strategy = build(ShardingStrategyConfiguration::hint(
        AlgorithmConfiguration::new("HINT_INLINE").prop("algorithm-expression", "ds_${value}"),
    ));
    let values = vec![
        RouteValue::list("t_order", "status", [1_i64]),
        RouteValue::range("t_order", "order_id", ValueRange::closed(1, 5)),
    ];
    assert_eq!(
        strategy.resolve(&names(&["ds_0", "ds_1"]), &values).unwrap(),
        names(&["ds_0", "ds_1"])
    );

    let mut mixed = values.clone();
    mixed.push(RouteValue::hint("t_order", [0_i64]));
    assert_eq!(strategy.resolve(&names(&["ds_0", "ds_1"]), &mixed).unwrap(), vec!["ds_0"]);
}

#[test]
fn test_standard_ignores_hint_values() {
    let strategy = table_inline_strategy();
    let values = vec![RouteValue::hint("t_order", [1_i64])];
    assert_eq!(strategy.resolve(&four_tables(), &values).unwrap(), four_tables());
    assert!(!values[0].is_for_column(""));
}

// =============================================================================
// None Strategy Tests
// =============================================================================

#[test]
fn test_none_returns_available_unchanged() {
    let strategy = build(ShardingStrategyConfiguration::none());
    let available = names(&["ds_1", "ds_0"]);
    let values = vec![RouteValue::list("t_order", "order_id", [1_i64])];
    assert_eq!(strategy.resolve(&available, &values).unwrap(), available);
    assert!(strategy.is_none());
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_standard_missing_column_fails() {
    let config = ShardingStrategyConfiguration::Standard {
        sharding_column: None,
        algorithm: Some(AlgorithmConfiguration::new("MOD").prop("sharding-count", 2)),
    };
    let err = ShardingStrategy::from_config(&config, &AlgorithmRegistry::default()).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_standard_blank_column_fails() {
    let config = ShardingStrategyConfiguration::standard(
        "  ",
        AlgorithmConfiguration::new("MOD").prop("sharding-count", 2),
    );
    assert!(ShardingStrategy::from_config(&config, &AlgorithmRegistry::default())
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_standard_missing_algorithm_fails() {
    let config = ShardingStrategyConfiguration::Standard {
        sharding_column: Some("order_id".to_string()),
        algorithm: None,
    };
    assert!(ShardingStrategy::from_config(&config, &AlgorithmRegistry::default())
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_complex_missing_columns_fails() {
    let config = ShardingStrategyConfiguration::Complex {
        sharding_columns: Some(" , ".to_string()),
        algorithm: Some(AlgorithmConfiguration::new("COMPLEX_INLINE").prop("algorithm-expression", "t")),
    };
    assert!(ShardingStrategy::from_config(&config, &AlgorithmRegistry::default())
        .unwrap_err()
        .is_configuration());
}

#[test]
fn test_hint_missing_algorithm_fails() {
    let config = ShardingStrategyConfiguration::Hint { algorithm: None };
    assert!(ShardingStrategy::from_config(&config, &AlgorithmRegistry::default())
        .unwrap_err()
        .is_configuration());
}
