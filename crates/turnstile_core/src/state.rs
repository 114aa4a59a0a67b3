//! # Lock State
//!
//! The counters and flag every lock operation inspects and mutates, plus the
//! copies of them handed out for observation.
//!
//! ```text
//!                 acquire_read                    acquire_read
//!   ┌──────────┐  (no writer active/waiting)  ┌─────────────┐ ──┐ (k -> k+1)
//!   │   Idle   │ ──────────────────────────> │ ReadHeld(k) │ <─┘
//!   │          │ <────────────────────────── │             │
//!   └──────────┘  release of last reader     └─────────────┘
//!     │      ▲
//!     │      │ release
//!     ▼      │
//!   ┌──────────┐
//!   │WriteHeld │   entered only when nobody is active
//!   └──────────┘
//! ```

/// The shared counters. Only ever touched while the guard mutex is held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LockState {
    /// Readers currently inside the critical section.
    pub(crate) active_readers: usize,
    /// Whether a writer currently holds the lock.
    pub(crate) active_writer: bool,
    /// Readers suspended inside `acquire_read`.
    pub(crate) waiting_readers: usize,
    /// Writers suspended inside `acquire_write`.
    pub(crate) waiting_writers: usize,
    /// Cumulative counters.
    pub(crate) stats: LockStats,
}

impl LockState {
    /// A reader must wait while a writer is active or any writer is queued.
    #[inline]
    pub(crate) const fn blocks_reader(&self) -> bool {
        self.active_writer || self.waiting_writers > 0
    }

    /// A writer must wait while anyone is active. Queued readers are ignored.
    #[inline]
    pub(crate) const fn blocks_writer(&self) -> bool {
        self.active_readers > 0 || self.active_writer
    }

    /// Copies the state for an observer.
    #[inline]
    pub(crate) const fn snapshot(&self) -> LockSnapshot {
        LockSnapshot {
            active_readers: self.active_readers,
            active_writer: self.active_writer,
            waiting_readers: self.waiting_readers,
            waiting_writers: self.waiting_writers,
            stats: self.stats,
        }
    }
}

/// Cumulative counters kept alongside the lock state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockStats {
    /// Successful read acquisitions.
    pub read_acquisitions: u64,
    /// Successful write acquisitions.
    pub write_acquisitions: u64,
    /// Read acquisitions that had to suspend at least once.
    pub contended_reads: u64,
    /// Write acquisitions that had to suspend at least once.
    pub contended_writes: u64,
    /// Releases that woke exactly one waiting writer.
    pub writer_wakeups: u64,
    /// Releases that woke every waiting reader.
    pub reader_broadcasts: u64,
}

/// Which role, if any, currently holds the lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockPhase {
    /// Nobody holds the lock.
    Idle,
    /// `k > 0` readers hold the lock.
    ReadHeld(usize),
    /// One writer holds the lock.
    WriteHeld,
}

/// A point-in-time copy of a lock's counters.
///
/// Taken under the guard, so the four counters are mutually consistent.
/// By the time the caller looks at it the lock may have moved on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Readers currently inside the critical section.
    pub active_readers: usize,
    /// Whether a writer currently holds the lock.
    pub active_writer: bool,
    /// Readers blocked in `acquire_read`.
    pub waiting_readers: usize,
    /// Writers blocked in `acquire_write`.
    pub waiting_writers: usize,
    /// Cumulative counters.
    pub stats: LockStats,
}

impl LockSnapshot {
    /// Returns the state-machine phase.
    ///
    /// An inconsistent snapshot (writer and readers at once) reports
    /// `WriteHeld`.
    #[must_use]
    pub const fn phase(&self) -> LockPhase {
        if self.active_writer {
            LockPhase::WriteHeld
        } else if self.active_readers > 0 {
            LockPhase::ReadHeld(self.active_readers)
        } else {
            LockPhase::Idle
        }
    }

    /// Checks mutual exclusion between the roles.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        !(self.active_writer && self.active_readers > 0)
    }

    /// Returns true when nobody holds or waits on the lock.
    #[must_use]
    pub const fn is_quiescent(&self) -> bool {
        !self.active_writer
            && self.active_readers == 0
            && self.waiting_readers == 0
            && self.waiting_writers == 0
    }
}
