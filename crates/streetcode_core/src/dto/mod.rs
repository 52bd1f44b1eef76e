//! Transfer objects exchanged with callers of the handler layer.
//!
//! # Responsibility
//! - Define the external shape of entities and requests.
//! - Provide the serializable success/failure response envelope.
//!
//! # Invariants
//! - DTOs serialize with camelCase keys.
//! - An envelope carries either a value or at least one error message.

use crate::model::art::ArtId;
use crate::model::fact::FactId;
use crate::model::image::ImageId;
use crate::model::streetcode::StreetcodeId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod mapper;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDto {
    pub id: ImageId,
    pub blob_name: String,
    pub mime_type: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtDto {
    pub id: ArtId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_id: ImageId,
    pub image: Option<ImageDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactDto {
    pub id: FactId,
    pub number: i64,
    pub title: String,
    pub fact_content: String,
    pub image_id: Option<ImageId>,
    pub streetcode_id: StreetcodeId,
}

/// Desired order of a streetcode's facts.
///
/// Position `i` in `reordered_ids` becomes number `i + 1`. `None` models an
/// absent list in the incoming payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFactRequest {
    pub streetcode_id: StreetcodeId,
    #[serde(default)]
    pub reordered_ids: Option<Vec<FactId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFactResponse {
    pub is_reordered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFactRequest {
    pub streetcode_id: StreetcodeId,
    pub title: String,
    pub fact_content: String,
    #[serde(default)]
    pub image_id: Option<ImageId>,
}

/// Serializable handler outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    pub is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(value: T) -> Self {
        Self {
            is_success: true,
            value: Some(value),
            errors: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            is_success: false,
            value: None,
            errors: vec![message.into()],
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for ResponseEnvelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(err) => Self::fail(err.to_string()),
        }
    }
}
