//! # Stress Workload
//!
//! Spawns reader and writer threads over one [`RawRwLock`] and checks the
//! lock's guarantees from the outside.
//!
//! ## Architecture
//!
//! ```text
//!   reader 0..R ──┐                              ┌── Ledger (left, right)
//!                 ├── RawRwLock ── sequences ────┤
//!   writer 0..W ──┘                              └── Occupancy monitor
//!        │
//!        └── WaitSample ──> [crossbeam channel] ──> collector (this thread)
//! ```
//!
//! The lock never touches the ledger; it only orders access to it. Writers
//! bump `left`, hold, then bump `right`, so a reader that sees them differ
//! has observed a writer mid-update. The occupancy monitor counts who is
//! inside independently of the lock's own counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use turnstile_core::{LockSnapshot, RawRwLock};

use crate::config::StressConfig;
use crate::error::{HarnessError, HarnessResult};

/// Mixes the thread index into the seed so threads get distinct streams.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Which role a worker plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Acquires the read role.
    Reader,
    /// Acquires the write role.
    Writer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader => f.write_str("reader"),
            Self::Writer => f.write_str("writer"),
        }
    }
}

/// Wait and hold statistics for one role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleStats {
    /// Completed acquire/release cycles.
    pub operations: u64,
    /// Longest time spent inside an acquire call.
    pub max_wait: Duration,
    /// Sum of all acquire times.
    pub total_wait: Duration,
}

impl RoleStats {
    fn record(&mut self, wait: Duration) {
        self.operations += 1;
        self.max_wait = self.max_wait.max(wait);
        self.total_wait += wait;
    }

    /// Mean time spent inside an acquire call.
    #[must_use]
    pub fn mean_wait(&self) -> Duration {
        if self.operations == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_wait.as_nanos() / u128::from(self.operations);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Outcome of a stress run.
#[derive(Clone, Debug)]
pub struct StressReport {
    /// Read-role statistics.
    pub reads: RoleStats,
    /// Write-role statistics.
    pub writes: RoleStats,
    /// Reads that saw a half-applied write.
    pub torn_reads: u64,
    /// Times a worker found someone inside that should have been excluded.
    pub exclusion_violations: u64,
    /// Completed writes according to the ledger.
    pub ledger_writes: u64,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Lock counters after every worker finished, before destroy.
    pub final_state: LockSnapshot,
}

impl StressReport {
    /// Returns true when the run observed no violation of any guarantee.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.torn_reads == 0
            && self.exclusion_violations == 0
            && self.ledger_writes == self.writes.operations
            && self.final_state.is_quiescent()
            && self.final_state.stats.read_acquisitions == self.reads.operations
            && self.final_state.stats.write_acquisitions == self.writes.operations
    }

    /// Completed acquire/release cycles per second.
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let total = (self.reads.operations + self.writes.operations) as f64;
        total / secs
    }
}

/// The protected resource. Only ever accessed under the lock.
#[derive(Debug, Default)]
struct Ledger {
    left: AtomicU64,
    right: AtomicU64,
}

/// Who is inside, counted independently of the lock.
#[derive(Debug, Default)]
struct Occupancy {
    readers: AtomicUsize,
    writers: AtomicUsize,
    violations: AtomicU64,
    torn_reads: AtomicU64,
}

/// Everything the workers share.
#[derive(Debug)]
struct Shared {
    lock: RawRwLock,
    ledger: Ledger,
    occupancy: Occupancy,
}

/// One acquisition's wait time, sent back to the collector.
#[derive(Clone, Copy, Debug)]
struct WaitSample {
    role: Role,
    wait: Duration,
}

/// Per-thread parameters.
struct Worker {
    role: Role,
    index: usize,
    operations: usize,
    max_hold_us: u64,
    rng: ChaCha8Rng,
    shared: Arc<Shared>,
    samples: Sender<WaitSample>,
}

impl Worker {
    fn run(mut self) -> HarnessResult<()> {
        for _ in 0..self.operations {
            let started = Instant::now();
            match self.role {
                Role::Reader => self.shared.lock.acquire_read()?,
                Role::Writer => self.shared.lock.acquire_write()?,
            }
            let wait = started.elapsed();

            match self.role {
                Role::Reader => self.read_section(),
                Role::Writer => self.write_section(),
            }

            self.shared.lock.release()?;

            // The collector only goes away once every worker has finished.
            if self.samples.send(WaitSample { role: self.role, wait }).is_err() {
                break;
            }
        }
        Ok(())
    }

    fn read_section(&mut self) {
        let occupancy = &self.shared.occupancy;
        occupancy.readers.fetch_add(1, Ordering::SeqCst);
        if occupancy.writers.load(Ordering::SeqCst) != 0 {
            self.report_violation("writer inside during read");
        }

        let ledger = &self.shared.ledger;
        let before = ledger.left.load(Ordering::Relaxed);
        hold(&mut self.rng, self.max_hold_us);
        let left = ledger.left.load(Ordering::Relaxed);
        let right = ledger.right.load(Ordering::Relaxed);
        if left != right || left != before {
            occupancy.torn_reads.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(reader = self.index, left, right, before, "torn read");
        }

        occupancy.readers.fetch_sub(1, Ordering::SeqCst);
    }

    fn write_section(&mut self) {
        let occupancy = &self.shared.occupancy;
        let writers_before = occupancy.writers.fetch_add(1, Ordering::SeqCst);
        if writers_before != 0 {
            self.report_violation("second writer inside");
        }
        if occupancy.readers.load(Ordering::SeqCst) != 0 {
            self.report_violation("reader inside during write");
        }

        let ledger = &self.shared.ledger;
        ledger.left.fetch_add(1, Ordering::Relaxed);
        hold(&mut self.rng, self.max_hold_us);
        ledger.right.fetch_add(1, Ordering::Relaxed);

        occupancy.writers.fetch_sub(1, Ordering::SeqCst);
    }

    fn report_violation(&self, what: &str) {
        self.shared.occupancy.violations.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(role = %self.role, worker = self.index, "exclusion violation: {what}");
    }
}

/// Sleeps for a random `0..=max_us` microseconds.
fn hold(rng: &mut ChaCha8Rng, max_us: u64) {
    if max_us == 0 {
        return;
    }
    let micros = rng.gen_range(0..=max_us);
    if micros > 0 {
        thread::sleep(Duration::from_micros(micros));
    }
}

/// Joins every worker, even after one has failed.
///
/// Returns the first failure in spawn order.
fn join_workers(handles: Vec<(String, JoinHandle<HarnessResult<()>>)>) -> HarnessResult<()> {
    let mut first_error = None;
    for (name, handle) in handles {
        let outcome = handle
            .join()
            .map_err(|_| HarnessError::WorkerPanicked(name.clone()))
            .and_then(|result| result);
        if let Err(err) = outcome {
            tracing::warn!(worker = %name, error = %err, "worker failed");
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// Runs one stress workload to completion.
///
/// The lock is initialized from `config.lock`, driven by
/// `config.readers + config.writers` threads, and destroyed after all of them
/// have joined.
///
/// # Errors
///
/// - [`HarnessError::InvalidConfig`] if the config does not validate.
/// - [`HarnessError::Lock`] if the lock cannot be initialized or reports an
///   error mid-run.
/// - [`HarnessError::WorkerPanicked`] if a worker thread panics. The
///   remaining workers are still joined and the lock is still destroyed.
/// - [`HarnessError::LockStillShared`] if the lock cannot be reclaimed for
///   destroy after the workers have joined.
pub fn run(config: &StressConfig) -> HarnessResult<StressReport> {
    config.validate()?;

    let mut lock = RawRwLock::uninit();
    lock.init_with(&config.lock)?;

    let shared = Arc::new(Shared {
        lock,
        ledger: Ledger::default(),
        occupancy: Occupancy::default(),
    });

    tracing::info!(
        lock = %config.lock.label,
        readers = config.readers,
        writers = config.writers,
        operations = config.operations_per_thread,
        "stress run starting"
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let started = Instant::now();

    let roles = std::iter::repeat(Role::Writer)
        .take(config.writers)
        .chain(std::iter::repeat(Role::Reader).take(config.readers));

    let mut handles: Vec<(String, JoinHandle<HarnessResult<()>>)> = Vec::with_capacity(config.thread_count());
    for (index, role) in roles.enumerate() {
        let max_hold_us = match role {
            Role::Reader => config.read_hold_us,
            Role::Writer => config.write_hold_us,
        };
        let worker = Worker {
            role,
            index,
            operations: config.operations_per_thread,
            max_hold_us,
            rng: ChaCha8Rng::seed_from_u64(config.seed ^ (index as u64).wrapping_mul(SEED_STRIDE)),
            shared: Arc::clone(&shared),
            samples: tx.clone(),
        };
        let name = format!("{role}-{index}");
        handles.push((name, thread::spawn(move || worker.run())));
    }
    drop(tx);

    let mut reads = RoleStats::default();
    let mut writes = RoleStats::default();
    for sample in rx {
        match sample.role {
            Role::Reader => reads.record(sample.wait),
            Role::Writer => writes.record(sample.wait),
        }
    }

    let joined = join_workers(handles);
    let elapsed = started.elapsed();

    // Every worker has been joined, so their clones of `shared` are gone.
    let mut shared = Arc::into_inner(shared).ok_or(HarnessError::LockStillShared)?;
    let final_state = shared.lock.snapshot();
    shared.lock.destroy()?;
    joined?;

    let report = StressReport {
        reads,
        writes,
        torn_reads: shared.occupancy.torn_reads.load(Ordering::Relaxed),
        exclusion_violations: shared.occupancy.violations.load(Ordering::Relaxed),
        ledger_writes: shared.ledger.right.load(Ordering::Relaxed),
        elapsed,
        final_state: final_state?,
    };

    tracing::info!(
        clean = report.is_clean(),
        reads = report.reads.operations,
        writes = report.writes.operations,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "stress run finished"
    );

    Ok(report)
}
