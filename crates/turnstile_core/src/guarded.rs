//! # Guarded Lock
//!
//! Owns the protected data and hands out role-bound guards.
//!
//! ## Safety Note
//!
//! This module requires unsafe code to hand out references into the data
//! cell. Every unsafe block relies on the state machine's mutual exclusion:
//! a `WriteGuard` exists only while `active_writer` is set, and a
//! `ReadGuard` only while `active_readers` counts it.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::config::{LockConfig, DEFAULT_LABEL};
use crate::error::LockResult;
use crate::machine::LockCore;
use crate::state::LockSnapshot;

/// A writer-priority reader/writer lock that owns its data.
///
/// Same policy as [`RawRwLock`](crate::RawRwLock), but each acquire returns
/// a guard whose `Drop` releases exactly the role it was acquired with.
///
/// ## Usage
///
/// ```rust,ignore
/// let table = PriorityRwLock::new(HashMap::new());
///
/// {
///     let mut w = table.write();
///     w.insert("answer", 42);
/// } // write role released here
///
/// let r = table.read();
/// assert_eq!(r.get("answer"), Some(&42));
/// ```
pub struct PriorityRwLock<T: ?Sized> {
    core: LockCore,
    data: UnsafeCell<T>,
}

// SAFETY: Moving the lock moves the data; T must be Send.
unsafe impl<T: ?Sized + Send> Send for PriorityRwLock<T> {}
// SAFETY: Readers share &T across threads (T: Sync) and a writer may be on
// any thread (T: Send).
unsafe impl<T: ?Sized + Send + Sync> Sync for PriorityRwLock<T> {}

impl<T> PriorityRwLock<T> {
    /// Creates an unmetered lock around `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            core: LockCore::new(DEFAULT_LABEL.to_owned()),
            data: UnsafeCell::new(value),
        }
    }

    /// Creates a lock around `value` with the given config.
    ///
    /// # Errors
    ///
    /// [`LockError::ResourceInitFailure`](crate::LockError::ResourceInitFailure)
    /// if the config's budget is exhausted. `value` is dropped in that case.
    pub fn with_config(value: T, config: &LockConfig) -> LockResult<Self> {
        Ok(Self {
            core: LockCore::from_config(config)?,
            data: UnsafeCell::new(value),
        })
    }

    /// Consumes the lock and returns the data.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> PriorityRwLock<T> {
    /// Acquires shared access, blocking while a writer is active or waiting.
    pub fn read(&self) -> ReadGuard<'_, T> {
        self.core.acquire_read();
        ReadGuard { lock: self }
    }

    /// Acquires exclusive access, blocking while anyone is active.
    pub fn write(&self) -> WriteGuard<'_, T> {
        self.core.acquire_write();
        WriteGuard { lock: self }
    }

    /// Acquires shared access if no writer is active or waiting.
    pub fn try_read(&self) -> Option<ReadGuard<'_, T>> {
        self.core
            .try_acquire_read()
            .then(|| ReadGuard { lock: self })
    }

    /// Acquires exclusive access if nobody is active.
    pub fn try_write(&self) -> Option<WriteGuard<'_, T>> {
        self.core
            .try_acquire_write()
            .then(|| WriteGuard { lock: self })
    }

    /// Returns a mutable reference to the data; no locking needed.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    /// Copies the lock counters.
    #[must_use]
    pub fn snapshot(&self) -> LockSnapshot {
        self.core.snapshot()
    }
}

impl<T: Default> Default for PriorityRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> fmt::Debug for PriorityRwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityRwLock")
            .field("label", &self.core.label())
            .field("state", &self.core.snapshot())
            .finish_non_exhaustive()
    }
}

/// Shared access to the data of a [`PriorityRwLock`].
///
/// Releases one read hold when dropped.
#[must_use = "the read role is released as soon as the guard is dropped"]
pub struct ReadGuard<'a, T: ?Sized> {
    lock: &'a PriorityRwLock<T>,
}

impl<T: ?Sized> Deref for ReadGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: This guard is counted in active_readers, so no writer is active.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.core.release_read();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for ReadGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Exclusive access to the data of a [`PriorityRwLock`].
///
/// Releases the write hold when dropped.
#[must_use = "the write role is released as soon as the guard is dropped"]
pub struct WriteGuard<'a, T: ?Sized> {
    lock: &'a PriorityRwLock<T>,
}

impl<T: ?Sized> Deref for WriteGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: active_writer is set for this guard; nobody else has access.
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for WriteGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: active_writer is set for this guard; nobody else has access.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.core.release_write();
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for WriteGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
