//! # Resource Budget
//!
//! Meters sub-resource construction for `init`.
//!
//! `parking_lot` mutexes and condition variables cannot fail to construct, so
//! a budget is the only way `init` can run out of resources. Each lock claims
//! three slots (guard, reader channel, writer channel) and gives them back
//! when it is destroyed. A claim that fails leaves the budget exactly as it
//! was before `init` started.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{LockError, LockResult, SubResource};

/// A shared, fixed-capacity pool of sub-resource slots.
///
/// # Example
///
/// ```rust,ignore
/// let budget = ResourceBudget::new(3);
/// let config = LockConfig::default().with_budget(Arc::clone(&budget));
///
/// let mut first = RawRwLock::uninit();
/// first.init_with(&config)?;          // uses all three slots
///
/// let mut second = RawRwLock::uninit();
/// assert!(second.init_with(&config).is_err());
/// assert_eq!(budget.in_use(), 3);      // nothing leaked by the failed init
/// ```
#[derive(Debug)]
pub struct ResourceBudget {
    /// Total slots.
    capacity: usize,
    /// Slots currently claimed.
    in_use: AtomicUsize,
}

impl ResourceBudget {
    /// Creates a budget with `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            in_use: AtomicUsize::new(0),
        })
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of claimed slots.
    #[inline]
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn available(&self) -> usize {
        self.capacity - self.in_use()
    }

    /// Claims one slot for `resource`.
    ///
    /// The slot is returned when the claim is dropped.
    pub(crate) fn claim(self: &Arc<Self>, resource: SubResource) -> LockResult<ResourceClaim> {
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.capacity).then_some(used + 1)
            })
            .map_err(|_| LockError::ResourceInitFailure { resource })?;

        Ok(ResourceClaim {
            budget: Arc::clone(self),
            resource,
        })
    }
}

/// One claimed slot. Dropping it tears the sub-resource down.
#[derive(Debug)]
pub(crate) struct ResourceClaim {
    budget: Arc<ResourceBudget>,
    resource: SubResource,
}

impl Drop for ResourceClaim {
    fn drop(&mut self) {
        self.budget.in_use.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(resource = %self.resource, "sub-resource released");
    }
}

/// The three claims held by a metered lock.
#[derive(Debug)]
pub(crate) struct ResourceClaims {
    _guard: ResourceClaim,
    _reader_channel: ResourceClaim,
    _writer_channel: ResourceClaim,
}

impl ResourceClaims {
    /// Claims guard, reader channel and writer channel in that order.
    ///
    /// On failure the claims already taken are dropped before the error is
    /// returned.
    pub(crate) fn acquire(budget: &Arc<ResourceBudget>) -> LockResult<Self> {
        let guard = budget.claim(SubResource::Guard)?;
        let reader_channel = budget.claim(SubResource::ReaderChannel)?;
        let writer_channel = budget.claim(SubResource::WriterChannel)?;

        Ok(Self {
            _guard: guard,
            _reader_channel: reader_channel,
            _writer_channel: writer_channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let budget = ResourceBudget::new(2);
        assert_eq!(budget.available(), 2);

        let claim = budget.claim(SubResource::Guard).unwrap();
        assert_eq!(budget.in_use(), 1);

        drop(claim);
        assert_eq!(budget.in_use(), 0);
    }

    #[test]
    fn test_exhausted_budget_reports_resource() {
        let budget = ResourceBudget::new(1);
        let _held = budget.claim(SubResource::Guard).unwrap();

        let err = budget.claim(SubResource::ReaderChannel).unwrap_err();
        assert_eq!(
            err,
            LockError::ResourceInitFailure {
                resource: SubResource::ReaderChannel
            }
        );
        assert_eq!(budget.in_use(), 1);
    }

    #[test]
    fn test_partial_acquire_leaks_nothing() {
        for capacity in 0..3 {
            let budget = ResourceBudget::new(capacity);
            let err = ResourceClaims::acquire(&budget).unwrap_err();
            assert_eq!(
                err,
                LockError::ResourceInitFailure {
                    resource: SubResource::ALL[capacity]
                }
            );
            assert_eq!(budget.in_use(), 0, "capacity {capacity} leaked a claim");
        }
    }

    #[test]
    fn test_full_acquire_holds_three_slots() {
        let budget = ResourceBudget::new(3);
        let claims = ResourceClaims::acquire(&budget).unwrap();
        assert_eq!(budget.in_use(), 3);
        assert_eq!(budget.available(), 0);

        drop(claims);
        assert_eq!(budget.in_use(), 0);
    }
}
