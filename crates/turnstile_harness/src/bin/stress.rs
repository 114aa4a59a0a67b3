//! # Stress Runner
//!
//! Hammers the writer-priority lock with a configurable reader/writer mix
//! and prints what it observed.
//!
//! ## Usage
//!
//! ```bash
//! stress --config crates/turnstile_harness/config/stress.toml --writers 4
//! ```
//!
//! Exits with status 1 if any guarantee was violated, 2 on a setup error.

use std::process::ExitCode;
use std::str::FromStr;

use turnstile_harness::{run, HarnessError, HarnessResult, StressConfig, StressReport};

fn main() -> ExitCode {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TURNSTILE STRESS RUNNER                                  ║");
    println!("║         WRITER-PRIORITY READER/WRITER LOCK                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();
    let config = match parse_args(&args) {
        Ok(Some(config)) => config,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Lock Label:         {}", config.lock.label);
    println!("│ Readers:            {}", config.readers);
    println!("│ Writers:            {}", config.writers);
    println!("│ Ops / Thread:       {}", config.operations_per_thread);
    println!("│ Read Hold:          0..={} μs", config.read_hold_us);
    println!("│ Write Hold:         0..={} μs", config.write_hold_us);
    println!("│ Seed:               {}", config.seed);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    match run(&config) {
        Ok(report) => {
            print_report(&report);
            if report.is_clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

/// Builds the config from `--config`, then `--quick`, then flag overrides.
///
/// The layering does not depend on where the flags appear. Returns
/// `Ok(None)` when help was printed.
fn parse_args(args: &[String]) -> HarnessResult<Option<StressConfig>> {
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(None);
    }

    let mut config = match args.iter().position(|a| a == "--config" || a == "-c") {
        Some(i) => StressConfig::load(required(&args[i], args.get(i + 1))?)?,
        None => StressConfig::default(),
    };

    if args.iter().any(|a| a == "--quick" || a == "-q") {
        let lock = config.lock.clone();
        config = StressConfig { lock, ..StressConfig::quick() };
    }

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match flag {
            "--config" | "-c" => {
                i += 1;
            }
            "--readers" | "-r" => {
                config.readers = parse_number(flag, value)?;
                i += 1;
            }
            "--writers" | "-w" => {
                config.writers = parse_number(flag, value)?;
                i += 1;
            }
            "--ops" | "-n" => {
                config.operations_per_thread = parse_number(flag, value)?;
                i += 1;
            }
            "--read-hold" => {
                config.read_hold_us = parse_number(flag, value)?;
                i += 1;
            }
            "--write-hold" => {
                config.write_hold_us = parse_number(flag, value)?;
                i += 1;
            }
            "--seed" | "-s" => {
                config.seed = parse_number(flag, value)?;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    config.validate()?;
    Ok(Some(config))
}

fn print_help() {
    println!("Usage: stress [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <FILE>      TOML workload file (default: built-in)");
    println!("  -q, --quick              Small smoke-test workload (applied over --config)");
    println!("  -r, --readers <NUM>      Reader threads (default: 8)");
    println!("  -w, --writers <NUM>      Writer threads (default: 2)");
    println!("  -n, --ops <NUM>          Operations per thread (default: 500)");
    println!("      --read-hold <US>     Max hold under the read role (default: 20)");
    println!("      --write-hold <US>    Max hold under the write role (default: 50)");
    println!("  -s, --seed <SEED>        Jitter seed (default: 42)");
    println!("  -h, --help               Show this help");
    println!();
    println!("Flags override --quick, which overrides --config.");
}

fn required<'a>(flag: &str, value: Option<&'a String>) -> HarnessResult<&'a String> {
    value.ok_or_else(|| HarnessError::InvalidConfig(format!("{flag} needs a value")))
}

fn parse_number<T: FromStr>(flag: &str, value: Option<&String>) -> HarnessResult<T> {
    let value = required(flag, value)?;
    value
        .parse()
        .map_err(|_| HarnessError::InvalidConfig(format!("{flag} expects a number, got {value:?}")))
}

fn print_report(report: &StressReport) {
    let stats = &report.final_state.stats;

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    STRESS REPORT                                 ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Reads:              {:>10}                                   ║", report.reads.operations);
    println!("║ Writes:             {:>10}                                   ║", report.writes.operations);
    println!("║ Throughput:         {:>10.0} ops/sec                           ║", report.throughput());
    println!("║ Elapsed:            {:>10.3} ms                                ║", report.elapsed.as_secs_f64() * 1000.0);
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Read Wait (mean):   {:>10} μs                                ║", report.reads.mean_wait().as_micros());
    println!("║ Read Wait (max):    {:>10} μs                                ║", report.reads.max_wait.as_micros());
    println!("║ Write Wait (mean):  {:>10} μs                                ║", report.writes.mean_wait().as_micros());
    println!("║ Write Wait (max):   {:>10} μs                                ║", report.writes.max_wait.as_micros());
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Contended Reads:    {:>10}                                   ║", stats.contended_reads);
    println!("║ Contended Writes:   {:>10}                                   ║", stats.contended_writes);
    println!("║ Writer Wakeups:     {:>10}                                   ║", stats.writer_wakeups);
    println!("║ Reader Broadcasts:  {:>10}                                   ║", stats.reader_broadcasts);
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║ Torn Reads:         {:>10}                                   ║", report.torn_reads);
    println!("║ Exclusion Breaks:   {:>10}                                   ║", report.exclusion_violations);
    println!("║ Status:             {:>10}                                   ║",
        if report.is_clean() { "✓ PASS" } else { "✗ FAIL" });
    println!("╚══════════════════════════════════════════════════════════════════╝");
}
