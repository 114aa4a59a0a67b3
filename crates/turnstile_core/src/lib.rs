//! # TURNSTILE Core
//!
//! A reader/writer lock with a **writer-priority** policy:
//!
//! - Any number of readers may hold the lock together.
//! - One writer holds it alone.
//! - A reader arriving while a writer is *waiting* queues behind that writer,
//!   even if no writer is active. A steady stream of readers cannot starve a
//!   writer: its wait is bounded by the readers already inside when it arrived.
//! - A writer does not wait for readers that are merely queued.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────── LockCore ────────────────────────────┐
//!   │  Mutex<LockState>   readers: Condvar        writers: Condvar     │
//!   │  active_readers     (notify_all after a     (notify_one after a  │
//!   │  active_writer       write release with      write release or    │
//!   │  waiting_readers     no queued writer)       last read release)  │
//!   │  waiting_writers                                                 │
//!   └──────────────┬─────────────────────────────────────┬─────────────┘
//!                  │                                     │
//!          ┌───────┴───────┐                   ┌─────────┴─────────┐
//!          │   RawRwLock   │                   │ PriorityRwLock<T> │
//!          │ init/destroy  │                   │ read()  -> guard  │
//!          │ acquire_*     │                   │ write() -> guard  │
//!          │ release()     │                   │ Drop releases     │
//!          └───────────────┘                   └───────────────────┘
//! ```
//!
//! [`RawRwLock`] is the handle-based interface with a role-inferring
//! `release`. [`PriorityRwLock`] owns its data and ties each release to the
//! guard that acquired it.
//!
//! ## Preconditions
//!
//! No reentrant acquisition, no upgrade or downgrade, no timeouts. Each
//! successful acquire is paired with exactly one release of the same role.
//!
//! ## Example
//!
//! ```rust,ignore
//! use turnstile_core::PriorityRwLock;
//!
//! let totals = PriorityRwLock::new(0u64);
//! *totals.write() += local_count;
//! let seen = *totals.read();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod budget;
pub mod config;
pub mod error;
pub mod guarded;
mod machine;
pub mod raw;
pub mod state;

pub use budget::ResourceBudget;
pub use config::LockConfig;
pub use error::{LockError, LockResult, SubResource};
pub use guarded::{PriorityRwLock, ReadGuard, WriteGuard};
pub use raw::RawRwLock;
pub use state::{LockPhase, LockSnapshot, LockStats};
