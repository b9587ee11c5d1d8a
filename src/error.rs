//! Structured error types for the settings tree.
//!
//! Only defects and file I/O surface as errors. Out-of-range values are
//! clamped at read time, failed migration steps are logged and recovered,
//! and a newer-than-supported file triggers the hard-downgrade path; none
//! of those three propagate to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the configuration tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Two siblings were declared with the same name. This is a defect in
    /// the static schema, not user input, and is fatal at construction.
    #[error("duplicate child {name:?} under {parent:?}")]
    DuplicateName {
        /// Base path of the owning container ("" for the root).
        parent: String,
        /// The colliding child name.
        name: String,
    },

    /// A value of the wrong scalar kind was written to a node.
    #[error("cannot write {got} to {path:?}, which holds {expected}")]
    TypeMismatch {
        /// Value path of the node being written.
        path: String,
        /// Scalar kind declared for the node.
        expected: &'static str,
        /// Scalar kind of the rejected value.
        got: &'static str,
    },

    /// The backing file could not be read.
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file could not be written.
    #[error("failed to write config file {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not valid YAML or is not a mapping at the root.
    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
