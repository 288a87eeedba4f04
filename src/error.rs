//! # Error Types
//!
//! Errors raised by the biclustering engine. Configuration and data problems
//! are reported at start-up, before any worker is spawned; invariant
//! violations stop a running engine immediately.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use moeba::error::{MoebaError, Result};
//!
//! fn check_population(size: usize) -> Result<()> {
//!     if size < 2 {
//!         return Err(MoebaError::Configuration(
//!             "population size must be at least 2".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_population(1).is_err());
//! ```
//!
//! Adding context to a foreign error:
//!
//! ```rust
//! use moeba::error::{Result, ResultExt};
//!
//! fn parse_weight(raw: &str) -> Result<f64> {
//!     raw.parse::<f64>().context("invalid rowsweight")
//! }
//!
//! assert!(parse_weight("abc").is_err());
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur while configuring or running the engine.
#[derive(Error, Debug)]
pub enum MoebaError {
    /// Unknown operator, objective, observer or algorithm name, wrong arity,
    /// malformed parameters or out-of-range values.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or unsupported column types, ragged rows, unparsable cells.
    #[error("Data error: {0}")]
    Data(String),

    /// A condition that should be impossible was observed at runtime.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// An objective produced a non-finite value.
    #[error("Fitness calculation error: {0}")]
    FitnessCalculation(String),

    /// An operation required a non-empty population.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// The worker pool stopped answering.
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Error that occurs when an I/O operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, MoebaError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use moeba::error::ResultExt;
///
/// fn parse_count(raw: &str) -> moeba::error::Result<usize> {
///     raw.parse::<usize>().context("invalid count")
/// }
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error into a configuration error prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| MoebaError::Configuration(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
///
/// ## Examples
///
/// ```rust
/// use moeba::error::{MoebaError, OptionExt};
///
/// fn first(values: &[f64]) -> moeba::error::Result<f64> {
///     values.first().copied().ok_or_else_moeba(|| MoebaError::EmptyPopulation)
/// }
/// ```
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, MoebaError>` using `err_fn`.
    fn ok_or_else_moeba<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> MoebaError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_moeba<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> MoebaError,
    {
        self.ok_or_else(err_fn)
    }
}
