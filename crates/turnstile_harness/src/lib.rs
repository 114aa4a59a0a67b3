//! # TURNSTILE Harness
//!
//! Configurable stress workloads for the writer-priority lock.
//!
//! A workload drives one [`RawRwLock`](turnstile_core::RawRwLock) the way a
//! parallel numeric kernel would: writers fold results into shared totals,
//! readers look them up. The harness checks from the outside that no reader
//! ever overlapped a writer and that every acquisition was paired with a
//! release.
//!
//! ## Example
//!
//! ```rust,ignore
//! use turnstile_harness::{run, StressConfig};
//!
//! let config = StressConfig::load("crates/turnstile_harness/config/stress.toml")?;
//! let report = run(&config)?;
//! assert!(report.is_clean());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod workload;

pub use config::StressConfig;
pub use error::{HarnessError, HarnessResult};
pub use workload::{run, Role, RoleStats, StressReport};
