//! Crate-wide error type.
//!
//! Only the *fatal* outcomes named in the error taxonomy get a variant here.
//! `NoRoute` and `ExhaustedQueue` are domain outcomes, not errors: they are
//! recorded on `Order`/as a normal `run` return rather than raised, so no
//! `SimError` variant exists for them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid TSPLIB format in {path}: {reason}")]
    InvalidFormat { path: String, reason: String },

    #[error("unknown node id: {0}")]
    UnknownNode(String),

    #[error("unknown edge: {0} -> {1}")]
    UnknownEdge(String, String),

    #[error("graph build produced zero nodes")]
    EmptyGraph,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
