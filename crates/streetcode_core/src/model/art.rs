//! Art entity and its streetcode join records.
//!
//! # Invariants
//! - Every art references exactly one image.
//! - `streetcode_arts` is ordered by join `index` when loaded.

use crate::model::image::{Image, ImageId};
use crate::model::streetcode::StreetcodeId;
use serde::{Deserialize, Serialize};

pub type ArtId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Art {
    pub id: ArtId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_id: ImageId,
    /// Loaded alongside the art; `None` only if the image row is gone.
    pub image: Option<Image>,
    pub streetcode_arts: Vec<StreetcodeArt>,
}

/// Placement of one art inside one streetcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreetcodeArt {
    pub index: i64,
    pub streetcode_id: StreetcodeId,
    pub art_id: ArtId,
}

/// Insert model for an art.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArt {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_id: ImageId,
}
