//! Sharding Rule Context Tests
//!
//! Tests verify:
//! - Snapshots are shared, not copied
//! - Successful reloads swap the snapshot
//! - Rejected reloads keep the previous snapshot
//! - Readers holding an old snapshot are unaffected by reloads

use std::sync::Arc;
use std::thread;

use shardroute::{
    AlgorithmConfiguration, AlgorithmRegistry, HintValues, RouteValue, ShardingRuleConfiguration,
    ShardingRuleContext, ShardingStrategyConfiguration, TableRuleConfiguration,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn order_config(shards: usize) -> ShardingRuleConfiguration {
    ShardingRuleConfiguration::builder()
        .table(
            TableRuleConfiguration::new("t_order", format!("ds_0.t_order_${{0..{}}}", shards - 1)).table_strategy(
                ShardingStrategyConfiguration::standard(
                    "order_id",
                    AlgorithmConfiguration::new("INLINE")
                        .prop("algorithm-expression", format!("t_order_${{order_id % {}}}", shards)),
                ),
            ),
        )
        .build()
}

fn route_order(context: &ShardingRuleContext, order_id: i64) -> String {
    let values = vec![RouteValue::list("t_order", "order_id", [order_id])];
    let nodes = context
        .snapshot()
        .route("t_order", &values, &HintValues::new())
        .unwrap();
    assert_eq!(nodes.len(), 1);
    nodes[0].to_string()
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_initial_snapshot() {
    let context = ShardingRuleContext::new(&order_config(2), ["ds_0"]).unwrap();
    assert_eq!(route_order(&context, 3), "ds_0.t_order_1");
    assert_eq!(context.snapshot().table_rules().len(), 1);
}

#[test]
fn test_snapshots_share_one_rule() {
    let context = ShardingRuleContext::new(&order_config(2), ["ds_0"]).unwrap();
    assert!(Arc::ptr_eq(&context.snapshot(), &context.snapshot()));
}

#[test]
fn test_invalid_initial_config_fails() {
    let err = ShardingRuleContext::new(&order_config(2), Vec::<String>::new()).unwrap_err();
    assert!(err.is_illegal_argument());
}

#[test]
fn test_custom_registry_is_kept() {
    let registry = AlgorithmRegistry::empty();
    let config = ShardingRuleConfiguration::builder()
        .table(TableRuleConfiguration::new("t_order", "ds_0.t_order"))
        .default_key_generator(shardroute::KeyGeneratorConfiguration::new(
            "id",
            AlgorithmConfiguration::new("SNOWFLAKE"),
        ))
        .build();
    assert!(ShardingRuleContext::with_registry(&config, ["ds_0"], registry).is_err());

    let context = ShardingRuleContext::new(&order_config(2), ["ds_0"]).unwrap();
    assert!(context.registry().contains("INLINE"));
}

// =============================================================================
// Reload Tests
// =============================================================================

#[test]
fn test_reload_swaps_snapshot() {
    let context = ShardingRuleContext::new(&order_config(2), ["ds_0"]).unwrap();
    let before = context.snapshot();

    context.reload(&order_config(4), ["ds_0"]).unwrap();

    assert!(!Arc::ptr_eq(&before, &context.snapshot()));
    assert_eq!(route_order(&context, 3), "ds_0.t_order_3");
}

#[test]
fn test_rejected_reload_keeps_previous_snapshot() {
    let context = ShardingRuleContext::new(&order_config(2), ["ds_0"]).unwrap();
    let before = context.snapshot();

    let broken = ShardingRuleConfiguration::builder()
        .table(TableRuleConfiguration::new("t_order", "ds_9.t_order"))
        .build();
    assert!(context.reload(&broken, ["ds_0"]).unwrap_err().is_configuration());

    assert!(Arc::ptr_eq(&before, &context.snapshot()));
    assert_eq!(route_order(&context, 3), "ds_0.t_order_1");
}

#[test]
fn test_old_snapshot_survives_reload() {
    let context = ShardingRuleContext::new(&order_config(2), ["ds_0"]).unwrap();
    let held = context.snapshot();

    context.reload(&order_config(4), ["ds_0"]).unwrap();

    assert_eq!(held.find_table_rule("t_order").unwrap().actual_data_nodes().len(), 2);
    assert_eq!(
        context.snapshot().find_table_rule("t_order").unwrap().actual_data_nodes().len(),
        4
    );
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_during_reload() {
    let context = Arc::new(ShardingRuleContext::new(&order_config(2), ["ds_0"]).unwrap());
    let mut handles = vec![];

    for _ in 0..4 {
        let context_clone = Arc::clone(&context);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                // Each snapshot is internally consistent whichever config it came from
                let rule = context_clone.snapshot();
                let shards = rule.find_table_rule("t_order").unwrap().actual_data_nodes().len() as i64;
                let values = vec![RouteValue::list("t_order", "order_id", [i])];
                let nodes = rule.route("t_order", &values, &HintValues::new()).unwrap();
                assert_eq!(nodes[0].table_name(), format!("t_order_{}", i % shards));
            }
        }));
    }

    for round in 0..20 {
        let shards = if round % 2 == 0 { 4 } else { 2 };
        context.reload(&order_config(shards), ["ds_0"]).unwrap();
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
