//! shardroute CLI
//!
//! Loads a JSON rule document and prints the data nodes a statement against
//! one logic table would touch.

use std::ops::Bound;

use clap::Parser;
use shardroute::{
    HintValues, Result, RouteValue, ShardingConfigFile, ShardingError, ShardingRule, ShardingValue, ValueRange,
};
use tracing_subscriber::{fmt, EnvFilter};

/// shardroute CLI
#[derive(Parser, Debug)]
#[command(name = "shard-route")]
#[command(about = "Resolve sharding route values to physical data nodes")]
#[command(version)]
struct Args {
    /// JSON rule document (data_source_names + rule)
    #[arg(short, long)]
    config: String,

    /// Logic table to route
    #[arg(short, long)]
    table: String,

    /// Equality value, `column=value` (repeatable)
    #[arg(short, long = "value")]
    values: Vec<String>,

    /// Closed range, `column=lo..hi`; either end may be empty (repeatable)
    #[arg(short, long = "range")]
    ranges: Vec<String>,

    /// Database hint value for Hint strategies (repeatable)
    #[arg(long = "hint-db")]
    hint_database: Vec<String>,

    /// Table hint value for Hint strategies (repeatable)
    #[arg(long = "hint-table")]
    hint_table: Vec<String>,

    /// Also generate one key for the table
    #[arg(short, long)]
    generate_key: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shardroute=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("shard-route v{}", shardroute::VERSION);
    tracing::info!("Rule document: {}", args.config);

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let document = ShardingConfigFile::from_path(&args.config)?;
    let rule = ShardingRule::new(&document.rule, document.data_source_names.clone())?;

    let mut route_values = Vec::with_capacity(args.values.len() + args.ranges.len());
    for raw in &args.values {
        let (column, value) = split_assignment(raw)?;
        route_values.push(RouteValue::list(&args.table, column, [parse_value(value)]));
    }
    for raw in &args.ranges {
        let (column, range) = split_assignment(raw)?;
        route_values.push(RouteValue::range(&args.table, column, parse_range(range)?));
    }

    let mut hints = HintValues::new();
    for value in &args.hint_database {
        hints.add_database_value(&args.table, parse_value(value));
    }
    for value in &args.hint_table {
        hints.add_table_value(&args.table, parse_value(value));
    }

    let nodes = rule.route(&args.table, &route_values, &hints)?;
    tracing::debug!("{} data node(s) for {}", nodes.len(), args.table);
    for node in &nodes {
        println!("{}", node);
    }

    if args.generate_key {
        let key = rule.generate_key(&args.table)?;
        println!("key={}", key);
    }
    Ok(())
}

fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(column, value)| (column.trim(), value.trim()))
        .filter(|(column, _)| !column.is_empty())
        .ok_or_else(|| ShardingError::IllegalArgument(format!("Expected column=value, got '{}'", raw)))
}

fn parse_value(raw: &str) -> ShardingValue {
    match raw.parse::<i64>() {
        Ok(v) => ShardingValue::Int(v),
        Err(_) => ShardingValue::Str(raw.to_string()),
    }
}

fn parse_range(raw: &str) -> Result<ValueRange> {
    let (lower, upper) = raw
        .split_once("..")
        .ok_or_else(|| ShardingError::IllegalArgument(format!("Expected lo..hi, got '{}'", raw)))?;
    let bound = |s: &str| match s.trim() {
        "" => Bound::Unbounded,
        v => Bound::Included(parse_value(v)),
    };
    Ok(ValueRange::new(bound(lower), bound(upper)))
}
