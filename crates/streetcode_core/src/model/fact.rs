//! Fact entity.
//!
//! # Responsibility
//! - Define the fact record and its insert model.
//! - Validate user-facing text limits before persistence.
//!
//! # Invariants
//! - `number` is the 1-based position among facts of the same streetcode.
//! - `title` and `fact_content` are non-blank and within their char limits.

use crate::model::image::ImageId;
use crate::model::streetcode::StreetcodeId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FactId = i64;

pub const FACT_TITLE_MAX_CHARS: usize = 68;
pub const FACT_CONTENT_MAX_CHARS: usize = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub number: i64,
    pub title: String,
    pub fact_content: String,
    pub image_id: Option<ImageId>,
    pub streetcode_id: StreetcodeId,
}

/// Insert model for a fact. The number is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFact {
    pub streetcode_id: StreetcodeId,
    pub title: String,
    pub fact_content: String,
    pub image_id: Option<ImageId>,
}

/// Validation failures for fact text and numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactValidationError {
    BlankTitle,
    TitleTooLong { chars: usize },
    BlankContent,
    ContentTooLong { chars: usize },
    NonPositiveNumber(i64),
}

impl Display for FactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "fact title must not be blank"),
            Self::TitleTooLong { chars } => write!(
                f,
                "fact title has {chars} characters; at most {FACT_TITLE_MAX_CHARS} allowed"
            ),
            Self::BlankContent => write!(f, "fact content must not be blank"),
            Self::ContentTooLong { chars } => write!(
                f,
                "fact content has {chars} characters; at most {FACT_CONTENT_MAX_CHARS} allowed"
            ),
            Self::NonPositiveNumber(number) => {
                write!(f, "fact number must be at least 1, got {number}")
            }
        }
    }
}

impl Error for FactValidationError {}

impl NewFact {
    pub fn validate(&self) -> Result<(), FactValidationError> {
        validate_text(&self.title, &self.fact_content)
    }
}

impl Fact {
    pub fn validate(&self) -> Result<(), FactValidationError> {
        if self.number < 1 {
            return Err(FactValidationError::NonPositiveNumber(self.number));
        }
        validate_text(&self.title, &self.fact_content)
    }
}

fn validate_text(title: &str, content: &str) -> Result<(), FactValidationError> {
    if title.trim().is_empty() {
        return Err(FactValidationError::BlankTitle);
    }
    let title_chars = title.chars().count();
    if title_chars > FACT_TITLE_MAX_CHARS {
        return Err(FactValidationError::TitleTooLong { chars: title_chars });
    }
    if content.trim().is_empty() {
        return Err(FactValidationError::BlankContent);
    }
    let content_chars = content.chars().count();
    if content_chars > FACT_CONTENT_MAX_CHARS {
        return Err(FactValidationError::ContentTooLong {
            chars: content_chars,
        });
    }
    Ok(())
}
