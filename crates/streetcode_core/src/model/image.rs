//! Image entity referenced by arts and facts.

use serde::{Deserialize, Serialize};

pub type ImageId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: ImageId,
    /// Storage key of the image blob.
    pub blob_name: String,
    pub mime_type: String,
    pub alt: Option<String>,
}

/// Insert model for an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub blob_name: String,
    pub mime_type: String,
    pub alt: Option<String>,
}
