//! Streetcode entity, the parent grouping facts and arts.

use serde::{Deserialize, Serialize};

pub type StreetcodeId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streetcode {
    pub id: StreetcodeId,
    /// Public, unique streetcode number.
    pub index: i64,
    pub title: String,
}

/// Insert model for a streetcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStreetcode {
    pub index: i64,
    pub title: String,
}
