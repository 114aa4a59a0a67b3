//! # Raw Lock Handle
//!
//! The handle-based interface: explicit `init`, `destroy`, `acquire_read`,
//! `acquire_write` and a role-inferring `release`.
//!
//! ## Contract
//!
//! - `release` decides what to release from the lock state alone: if a writer
//!   is active it releases the write hold, otherwise one read hold. Call it
//!   exactly once per successful acquire, from the thread that acquired.
//! - No reentrancy. A thread holding the write role that calls
//!   `acquire_write` again blocks forever.
//! - No timeouts and no cancellation. A blocked acquire returns only after
//!   another thread's `release` satisfies it.
//! - `destroy` takes `&mut self`, so nobody else can be holding or waiting
//!   on the handle while it runs.
//!
//! Code that owns the data it protects should prefer
//! [`PriorityRwLock`](crate::PriorityRwLock), whose guards release their own
//! role.

use crate::config::LockConfig;
use crate::error::{LockError, LockResult};
use crate::machine::LockCore;
use crate::state::LockSnapshot;

/// A writer-priority reader/writer lock handle.
///
/// The handle starts uninitialized; every operation except `init` returns
/// [`LockError::InvalidArgument`] until it is initialized, and again after
/// it is destroyed.
///
/// ## Usage
///
/// ```rust,ignore
/// let lock = Arc::new(RawRwLock::new()?);
///
/// // Aggregation step of a worker
/// lock.acquire_write()?;
/// totals.add(local_count);
/// lock.release()?;
///
/// // Shared lookup
/// lock.acquire_read()?;
/// let value = table.get(key);
/// lock.release()?;
/// ```
#[derive(Debug, Default)]
pub struct RawRwLock {
    core: Option<LockCore>,
}

impl RawRwLock {
    /// Returns an uninitialized handle.
    #[must_use]
    pub const fn uninit() -> Self {
        Self { core: None }
    }

    /// Returns a handle initialized with the default config.
    ///
    /// # Errors
    ///
    /// Same as `init`. The default config has no budget, so this cannot fail
    /// in practice.
    pub fn new() -> LockResult<Self> {
        let mut lock = Self::uninit();
        lock.init()?;
        Ok(lock)
    }

    /// Initializes the handle with the default config.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is already initialized.
    pub fn init(&mut self) -> LockResult<()> {
        self.init_with(&LockConfig::default())
    }

    /// Initializes the handle.
    ///
    /// Sub-resources are constructed in the order guard, reader channel,
    /// writer channel. If any of them fails, those already built are torn
    /// down and the handle stays uninitialized.
    ///
    /// # Errors
    ///
    /// - [`LockError::InvalidArgument`] if the handle is already initialized.
    /// - [`LockError::ResourceInitFailure`] if the config's budget is exhausted.
    pub fn init_with(&mut self, config: &LockConfig) -> LockResult<()> {
        if self.core.is_some() {
            return Err(LockError::InvalidArgument);
        }
        self.core = Some(LockCore::from_config(config)?);
        Ok(())
    }

    /// Tears down the guard and both wait channels.
    ///
    /// The handle returns to the uninitialized state and may be initialized
    /// again.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is not initialized.
    pub fn destroy(&mut self) -> LockResult<()> {
        let core = self.core.take().ok_or(LockError::InvalidArgument)?;
        tracing::debug!(lock = %core.label(), "lock destroyed");
        Ok(())
    }

    /// Returns whether the handle is initialized.
    #[inline]
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    /// Acquires the read role, blocking while a writer is active or waiting.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is not initialized.
    pub fn acquire_read(&self) -> LockResult<()> {
        self.core()?.acquire_read();
        Ok(())
    }

    /// Acquires the write role, blocking while any reader or writer is active.
    ///
    /// Readers that are merely waiting do not delay a writer.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is not initialized.
    pub fn acquire_write(&self) -> LockResult<()> {
        self.core()?.acquire_write();
        Ok(())
    }

    /// Acquires the read role only if no writer is active or waiting.
    ///
    /// Returns whether the role was acquired. Never blocks on the lock state.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is not initialized.
    pub fn try_acquire_read(&self) -> LockResult<bool> {
        Ok(self.core()?.try_acquire_read())
    }

    /// Acquires the write role only if nobody is active.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is not initialized.
    pub fn try_acquire_write(&self) -> LockResult<bool> {
        Ok(self.core()?.try_acquire_write())
    }

    /// Releases the role the lock state says is held.
    ///
    /// Releasing a write hold wakes one waiting writer if there is one,
    /// otherwise every waiting reader. Releasing the last read hold wakes one
    /// waiting writer. Releasing an idle lock does nothing.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is not initialized.
    pub fn release(&self) -> LockResult<()> {
        self.core()?.release_inferred();
        Ok(())
    }

    /// Copies the lock counters.
    ///
    /// # Errors
    ///
    /// [`LockError::InvalidArgument`] if the handle is not initialized.
    pub fn snapshot(&self) -> LockResult<LockSnapshot> {
        Ok(self.core()?.snapshot())
    }

    #[inline]
    fn core(&self) -> LockResult<&LockCore> {
        self.core.as_ref().ok_or(LockError::InvalidArgument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::ResourceBudget;
    use crate::error::SubResource;
    use crate::state::LockPhase;
    use std::sync::Arc;

    #[test]
    fn test_uninit_handle_rejects_everything() {
        let mut lock = RawRwLock::uninit();
        assert!(!lock.is_initialized());
        assert_eq!(lock.acquire_read(), Err(LockError::InvalidArgument));
        assert_eq!(lock.acquire_write(), Err(LockError::InvalidArgument));
        assert_eq!(lock.try_acquire_read(), Err(LockError::InvalidArgument));
        assert_eq!(lock.try_acquire_write(), Err(LockError::InvalidArgument));
        assert_eq!(lock.release(), Err(LockError::InvalidArgument));
        assert_eq!(lock.snapshot(), Err(LockError::InvalidArgument));
        assert_eq!(lock.destroy(), Err(LockError::InvalidArgument));
    }

    #[test]
    fn test_init_destroy_lifecycle() {
        let mut lock = RawRwLock::uninit();
        lock.init().unwrap();
        assert!(lock.is_initialized());
        assert!(lock.snapshot().unwrap().is_quiescent());

        lock.destroy().unwrap();
        assert!(!lock.is_initialized());
        assert_eq!(lock.acquire_read(), Err(LockError::InvalidArgument));
        assert_eq!(lock.destroy(), Err(LockError::InvalidArgument));

        // A destroyed handle can be initialized again.
        lock.init().unwrap();
        lock.acquire_write().unwrap();
        lock.release().unwrap();
        lock.destroy().unwrap();
    }

    #[test]
    fn test_double_init_rejected() {
        let mut lock = RawRwLock::new().unwrap();
        lock.acquire_read().unwrap();

        assert_eq!(lock.init(), Err(LockError::InvalidArgument));
        // The existing state survived the rejected init.
        assert_eq!(lock.snapshot().unwrap().phase(), LockPhase::ReadHeld(1));

        lock.release().unwrap();
        lock.destroy().unwrap();
    }

    #[test]
    fn test_release_infers_role() {
        let lock = RawRwLock::new().unwrap();

        lock.acquire_read().unwrap();
        lock.acquire_read().unwrap();
        lock.release().unwrap();
        assert_eq!(lock.snapshot().unwrap().phase(), LockPhase::ReadHeld(1));
        lock.release().unwrap();
        assert_eq!(lock.snapshot().unwrap().phase(), LockPhase::Idle);

        lock.acquire_write().unwrap();
        lock.release().unwrap();
        assert_eq!(lock.snapshot().unwrap().phase(), LockPhase::Idle);

        // Idle release is a silent success.
        lock.release().unwrap();
        assert!(lock.snapshot().unwrap().is_quiescent());
    }

    #[test]
    fn test_init_failure_leaves_handle_uninitialized() {
        let budget = ResourceBudget::new(5);
        let config = LockConfig::labeled("metered").with_budget(Arc::clone(&budget));

        let mut first = RawRwLock::uninit();
        first.init_with(&config).unwrap();
        assert_eq!(budget.in_use(), 3);

        let mut second = RawRwLock::uninit();
        assert_eq!(
            second.init_with(&config),
            Err(LockError::ResourceInitFailure {
                resource: SubResource::WriterChannel
            })
        );
        assert!(!second.is_initialized());
        assert_eq!(budget.in_use(), 3);

        first.destroy().unwrap();
        assert_eq!(budget.in_use(), 0);

        second.init_with(&config).unwrap();
        assert_eq!(budget.in_use(), 3);
        second.destroy().unwrap();
        assert_eq!(budget.in_use(), 0);
    }
}
