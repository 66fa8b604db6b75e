//! The structured error type returned by every fallible operation in this crate.

use thiserror::Error;

/// A single error type for all fallible operations, propagated up the call
/// stack with `?` and converted to a one-line diagnostic by the CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// A transition referenced a location that was never declared.
    #[error("unknown location '{0}'")]
    UnknownLocation(String),
    /// A transition or clock constraint referenced a clock that was never declared.
    #[error("unknown clock '{0}'")]
    UnknownClock(String),
    /// A transition referenced an action that is not in the automaton's alphabet.
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    /// A timed word did not start at time zero, or had a decreasing timestamp.
    #[error("invalid timed word: {0}")]
    InvalidTimedWord(String),
    /// Two consecutive symbol steps were taken without an intervening time step,
    /// or a time step was taken on an empty ATA run.
    #[error("invalid ATA transition: {0}")]
    AtaTransitionViolation(String),
    /// The MTL alphabet used one of the translator's reserved location names.
    #[error("alphabet must not contain the reserved symbol '{0}'")]
    ReservedName(String),
    /// A canonical word violated one of the §3 structural invariants.
    ///
    /// This indicates an implementation bug rather than a user error.
    #[error("invalid canonical word: {0}")]
    InvalidCanonicalWord(String),
    /// A clock constraint used a comparator that cannot be serialized.
    #[error("invalid clock constraint comparator: {0}")]
    InvalidClockComparator(String),
    /// A text-format document could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// Human-readable description of the problem.
        message: String,
        /// 1-based line number at which parsing failed.
        line: usize,
    },
    /// A job was submitted to the worker pool after its queue was closed.
    #[error("cannot add job: queue is closed")]
    QueueClosed,
    /// The worker pool was started more than once.
    #[error("worker pool was already started")]
    PoolAlreadyStarted,
    /// An I/O error occurred while reading or writing a file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
