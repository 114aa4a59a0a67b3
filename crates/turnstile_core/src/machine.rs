//! # Lock State Machine
//!
//! The state machine shared by [`RawRwLock`](crate::RawRwLock) and
//! [`PriorityRwLock`](crate::PriorityRwLock).
//!
//! One mutex guards [`LockState`]. Blocked readers sleep on one condition
//! variable and blocked writers on another, so a release can wake exactly the
//! role it wants to:
//!
//! ```text
//!   release by writer ──┬── waiting_writers > 0 ──> notify_one(writers)
//!                       └── waiting_readers > 0 ──> notify_all(readers)
//!
//!   release by last reader ── waiting_writers > 0 ──> notify_one(writers)
//! ```
//!
//! Every wait sits in a loop that re-checks its predicate, so spurious wakeups
//! and threads that barge in between the notify and the re-lock are harmless.

use parking_lot::{Condvar, Mutex};

use crate::budget::ResourceClaims;
use crate::config::LockConfig;
use crate::error::LockResult;
use crate::state::{LockSnapshot, LockState};

/// Guard mutex, both wait channels and the metering claims of one lock.
#[derive(Debug)]
pub(crate) struct LockCore {
    state: Mutex<LockState>,
    readers: Condvar,
    writers: Condvar,
    label: String,
    /// Held for the lifetime of the core; dropped last.
    _claims: Option<ResourceClaims>,
}

impl LockCore {
    /// Builds an unmetered core. Cannot fail.
    pub(crate) fn new(label: String) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            label,
            _claims: None,
        }
    }

    /// Builds a core, claiming its sub-resources from the configured budget.
    pub(crate) fn from_config(config: &LockConfig) -> LockResult<Self> {
        let claims = config
            .budget
            .as_ref()
            .map(ResourceClaims::acquire)
            .transpose()?;

        tracing::debug!(lock = %config.label, metered = claims.is_some(), "lock initialized");

        Ok(Self {
            _claims: claims,
            ..Self::new(config.label.clone())
        })
    }

    /// Returns the label carried on log events.
    #[inline]
    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// Blocks until no writer is active or waiting, then enters as a reader.
    pub(crate) fn acquire_read(&self) {
        let mut state = self.state.lock();
        state.waiting_readers += 1;

        if state.blocks_reader() {
            state.stats.contended_reads += 1;
            tracing::trace!(
                lock = %self.label,
                active_writer = state.active_writer,
                waiting_writers = state.waiting_writers,
                "reader suspended"
            );
            while state.blocks_reader() {
                self.readers.wait(&mut state);
            }
        }

        state.waiting_readers -= 1;
        state.active_readers += 1;
        state.stats.read_acquisitions += 1;
    }

    /// Blocks until nobody is active, then enters as the writer.
    pub(crate) fn acquire_write(&self) {
        let mut state = self.state.lock();
        state.waiting_writers += 1;

        if state.blocks_writer() {
            state.stats.contended_writes += 1;
            tracing::trace!(
                lock = %self.label,
                active_readers = state.active_readers,
                active_writer = state.active_writer,
                "writer suspended"
            );
            while state.blocks_writer() {
                self.writers.wait(&mut state);
            }
        }

        state.waiting_writers -= 1;
        state.active_writer = true;
        state.stats.write_acquisitions += 1;
    }

    /// Enters as a reader if that needs no waiting.
    pub(crate) fn try_acquire_read(&self) -> bool {
        let mut state = self.state.lock();
        if state.blocks_reader() {
            return false;
        }
        state.active_readers += 1;
        state.stats.read_acquisitions += 1;
        true
    }

    /// Enters as the writer if that needs no waiting.
    pub(crate) fn try_acquire_write(&self) -> bool {
        let mut state = self.state.lock();
        if state.blocks_writer() {
            return false;
        }
        state.active_writer = true;
        state.stats.write_acquisitions += 1;
        true
    }

    /// Releases whichever role the state says is held.
    ///
    /// An active writer wins over active readers; an idle lock is left alone.
    pub(crate) fn release_inferred(&self) {
        let mut state = self.state.lock();
        if state.active_writer {
            self.leave_write(&mut state);
        } else if state.active_readers > 0 {
            self.leave_read(&mut state);
        }
    }

    /// Releases one read hold.
    pub(crate) fn release_read(&self) {
        let mut state = self.state.lock();
        self.leave_read(&mut state);
    }

    /// Releases the write hold.
    pub(crate) fn release_write(&self) {
        let mut state = self.state.lock();
        self.leave_write(&mut state);
    }

    /// Copies the counters under the guard.
    pub(crate) fn snapshot(&self) -> LockSnapshot {
        self.state.lock().snapshot()
    }

    fn leave_write(&self, state: &mut LockState) {
        debug_assert!(state.active_writer, "write release without a writer");
        state.active_writer = false;

        if state.waiting_writers > 0 {
            state.stats.writer_wakeups += 1;
            tracing::trace!(lock = %self.label, waiting_writers = state.waiting_writers, "handing off to writer");
            self.writers.notify_one();
        } else if state.waiting_readers > 0 {
            state.stats.reader_broadcasts += 1;
            tracing::trace!(lock = %self.label, waiting_readers = state.waiting_readers, "waking all readers");
            self.readers.notify_all();
        }
    }

    fn leave_read(&self, state: &mut LockState) {
        debug_assert!(state.active_readers > 0, "read release without a reader");
        state.active_readers -= 1;

        if state.active_readers == 0 && state.waiting_writers > 0 {
            state.stats.writer_wakeups += 1;
            tracing::trace!(lock = %self.label, waiting_writers = state.waiting_writers, "last reader out, waking writer");
            self.writers.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LockPhase;

    #[test]
    fn test_uncontended_read_write_cycle() {
        let core = LockCore::new("test".to_owned());

        core.acquire_read();
        core.acquire_read();
        assert_eq!(core.snapshot().phase(), LockPhase::ReadHeld(2));

        core.release_read();
        core.release_read();
        assert_eq!(core.snapshot().phase(), LockPhase::Idle);

        core.acquire_write();
        assert_eq!(core.snapshot().phase(), LockPhase::WriteHeld);
        core.release_write();

        let snapshot = core.snapshot();
        assert!(snapshot.is_quiescent());
        assert_eq!(snapshot.stats.read_acquisitions, 2);
        assert_eq!(snapshot.stats.write_acquisitions, 1);
        assert_eq!(snapshot.stats.contended_reads, 0);
        assert_eq!(snapshot.stats.contended_writes, 0);
    }

    #[test]
    fn test_inferred_release_prefers_writer() {
        let core = LockCore::new("test".to_owned());

        core.acquire_write();
        core.release_inferred();
        assert_eq!(core.snapshot().phase(), LockPhase::Idle);

        core.acquire_read();
        core.release_inferred();
        assert_eq!(core.snapshot().phase(), LockPhase::Idle);
    }

    #[test]
    fn test_inferred_release_on_idle_is_noop() {
        let core = LockCore::new("test".to_owned());
        core.release_inferred();
        assert!(core.snapshot().is_quiescent());
    }

    #[test]
    fn test_try_acquire_respects_roles() {
        let core = LockCore::new("test".to_owned());

        assert!(core.try_acquire_read());
        assert!(!core.try_acquire_write());
        assert!(core.try_acquire_read());
        core.release_read();
        core.release_read();

        assert!(core.try_acquire_write());
        assert!(!core.try_acquire_read());
        assert!(!core.try_acquire_write());
        core.release_write();

        assert!(core.snapshot().is_quiescent());
    }

    #[test]
    fn test_label_from_config() {
        let core = LockCore::from_config(&LockConfig::labeled("ledger")).unwrap();
        assert_eq!(core.label(), "ledger");
    }
}
