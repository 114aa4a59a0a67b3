//! Integration test for the stress harness.
//!
//! Run with: cargo test --package turnstile_harness --test stress_test -- --nocapture

use std::path::Path;

use turnstile_core::{LockError, ResourceBudget, SubResource};
use turnstile_harness::{run, HarnessError, StressConfig};

fn shipped_config() -> StressConfig {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/stress.toml");
    StressConfig::load(path).unwrap()
}

#[test]
fn test_shipped_config_parses() {
    let config = shipped_config();
    assert_eq!(config.readers, 8);
    assert_eq!(config.writers, 2);
    assert_eq!(config.lock.label, "stress");
}

#[test]
fn test_read_heavy_run_is_clean() {
    let config = StressConfig {
        operations_per_thread: 100,
        ..shipped_config()
    };

    let report = run(&config).unwrap();

    println!("\n=== Read-Heavy Stress ===");
    println!("reads: {}  writes: {}", report.reads.operations, report.writes.operations);
    println!(
        "read wait mean/max: {:?}/{:?}",
        report.reads.mean_wait(),
        report.reads.max_wait
    );
    println!(
        "write wait mean/max: {:?}/{:?}",
        report.writes.mean_wait(),
        report.writes.max_wait
    );

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.reads.operations, 800);
    assert_eq!(report.writes.operations, 200);
    assert_eq!(report.ledger_writes, 200);
    assert_eq!(report.torn_reads, 0);
    assert_eq!(report.exclusion_violations, 0);
}

#[test]
fn test_write_heavy_run_is_clean() {
    let config = StressConfig {
        readers: 2,
        writers: 6,
        operations_per_thread: 100,
        read_hold_us: 10,
        write_hold_us: 10,
        ..StressConfig::default()
    };

    let report = run(&config).unwrap();
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.writes.operations, 600);
    assert_eq!(report.final_state.stats.write_acquisitions, 600);
}

#[test]
fn test_readers_only_never_contend() {
    let config = StressConfig {
        readers: 6,
        writers: 0,
        operations_per_thread: 200,
        ..StressConfig::quick()
    };

    let report = run(&config).unwrap();
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.final_state.stats.contended_reads, 0);
    assert_eq!(report.final_state.stats.writer_wakeups, 0);
    assert_eq!(report.final_state.stats.reader_broadcasts, 0);
}

#[test]
fn test_config_errors_surface() {
    let err = StressConfig::from_toml_str("readers = \"many\"").unwrap_err();
    assert!(matches!(err, HarnessError::ConfigParse(_)));
    assert!(err.to_string().starts_with("cannot parse config"));
}

#[test]
fn test_exhausted_budget_fails_before_spawning() {
    let budget = ResourceBudget::new(2);
    let mut config = StressConfig::quick();
    config.lock = config.lock.with_budget(budget.clone());

    let err = run(&config).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Lock(LockError::ResourceInitFailure {
            resource: SubResource::WriterChannel
        })
    ));
    assert_eq!(budget.in_use(), 0);
}
