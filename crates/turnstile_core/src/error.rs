//! # Lock Error Types
//!
//! Every error the lock can report. Contract violations (reentrant acquisition,
//! mismatched release, destroying a held lock) are not part of this taxonomy:
//! they are not detected.

use std::fmt;

use thiserror::Error;

/// A sub-resource constructed by `init`, in construction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubResource {
    /// The mutex guarding the lock state.
    Guard,
    /// The wait channel blocked readers sleep on.
    ReaderChannel,
    /// The wait channel blocked writers sleep on.
    WriterChannel,
}

impl SubResource {
    /// All sub-resources in the order `init` constructs them.
    pub const ALL: [Self; 3] = [Self::Guard, Self::ReaderChannel, Self::WriterChannel];
}

impl fmt::Display for SubResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Guard => "guard mutex",
            Self::ReaderChannel => "reader wait channel",
            Self::WriterChannel => "writer wait channel",
        };
        f.write_str(name)
    }
}

/// Errors that can occur when operating a lock handle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The handle is uninitialized, already destroyed, or (for `init`)
    /// already initialized.
    #[error("invalid argument: lock handle is not in a usable state")]
    InvalidArgument,

    /// A sub-resource could not be constructed during `init`. Everything
    /// constructed before it has been torn down.
    #[error("failed to construct {resource}")]
    ResourceInitFailure {
        /// The sub-resource whose construction failed.
        resource: SubResource,
    },
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
