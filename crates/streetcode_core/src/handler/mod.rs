//! Request handlers.
//!
//! # Responsibility
//! - Accept one typed query or command and orchestrate repository calls.
//! - Translate every failure into a typed error, logged once where detected.
//!
//! # Invariants
//! - Handlers never panic on bad input; every failure is an `Err`.
//! - A failed command leaves no staged or persisted partial change.

use std::fmt::{Display, Formatter};

pub mod art;
pub mod fact;
pub mod image;

/// Handles one request type.
pub trait RequestHandler<Q> {
    type Response;
    type Error;

    fn handle(&self, request: &Q) -> Result<Self::Response, Self::Error>;
}

/// Coarse classification of handler failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed or absent input.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// Input disagrees with stored state (e.g. counts differ).
    Consistency,
    /// A commit went through but changed nothing.
    Persistence,
    /// The storage layer itself failed.
    Storage,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Consistency => "consistency",
            Self::Persistence => "persistence",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}
