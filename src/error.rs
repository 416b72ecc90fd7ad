//! Crate-wide error taxonomy.
//!
//! Fatal conditions are never represented here — they `panic!`
//! directly at the point of detection. This enum covers tier 2 (recoverable,
//! propagated with `?`) and tier 3 (user-visible shell diagnostics).

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KalioError {
    /// The heap has reached `MAX_BUNDLES` and cannot grow further.
    OutOfBundles,
    /// The requested size is larger than the biggest size class.
    OversizedRequest,
    /// A VFS node could not be allocated (node arena exhausted).
    FsAllocFailed,
    /// A ring buffer could not be initialized.
    RingBufferInitFailed,
    /// The timer arena is full.
    TimerArenaFull,

    /// The typed command does not match any entry in the command table.
    UnknownCommand,
    /// The argument count fell outside `[min_args, max_args]`.
    BadArgCount,
    /// A path component does not exist under the current node.
    NotFound,
    /// `rmdir` was asked to remove a non-empty directory.
    NotEmpty,
    /// `rm`/`cat`/`write` was asked to operate on a directory.
    NotADirectory,
    /// `cd` was asked to descend into a non-directory.
    NotADirectoryTarget,
    /// `open` was called on a node that is already open.
    AlreadyOpen,
}

impl fmt::Display for KalioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            KalioError::OutOfBundles => "out of bundles",
            KalioError::OversizedRequest => "request exceeds largest size class",
            KalioError::FsAllocFailed => "filesystem node allocation failed",
            KalioError::RingBufferInitFailed => "ring buffer init failed",
            KalioError::TimerArenaFull => "timer arena full",
            KalioError::UnknownCommand => "unknown command",
            KalioError::BadArgCount => "bad argument count",
            KalioError::NotFound => "not found",
            KalioError::NotEmpty => "not empty",
            KalioError::NotADirectory => "not a directory",
            KalioError::NotADirectoryTarget => "not a directory",
            KalioError::AlreadyOpen => "already open",
        };
        write!(f, "{}", msg)
    }
}

pub type KalioResult<T> = Result<T, KalioError>;
