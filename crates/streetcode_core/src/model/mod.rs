//! Storage entities for the content core.
//!
//! # Responsibility
//! - Define the records repositories read and write.
//! - Hold entity-level validation rules.
//!
//! # Invariants
//! - Every entity is identified by a database-assigned integer id.
//! - Facts of one streetcode carry numbers forming `1..=N`.

pub mod art;
pub mod fact;
pub mod image;
pub mod streetcode;
