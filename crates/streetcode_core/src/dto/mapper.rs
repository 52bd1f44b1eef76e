//! Entity to DTO translation.
//!
//! Handlers receive a `Mapper` so the translation step can be observed or
//! replaced in tests.

use crate::dto::{ArtDto, FactDto, ImageDto};
use crate::model::art::Art;
use crate::model::fact::Fact;
use crate::model::image::Image;

/// Translates `S` into its external representation `T`.
pub trait Mapper<S: ?Sized, T> {
    fn map(&self, source: &S) -> T;
}

/// Default field-by-field mapper for all core entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityMapper;

impl Mapper<Image, ImageDto> for EntityMapper {
    fn map(&self, image: &Image) -> ImageDto {
        ImageDto {
            id: image.id,
            blob_name: image.blob_name.clone(),
            mime_type: image.mime_type.clone(),
            alt: image.alt.clone(),
        }
    }
}

impl Mapper<Art, ArtDto> for EntityMapper {
    fn map(&self, art: &Art) -> ArtDto {
        ArtDto {
            id: art.id,
            title: art.title.clone(),
            description: art.description.clone(),
            image_id: art.image_id,
            image: art.image.as_ref().map(|image| self.map(image)),
        }
    }
}

impl Mapper<[Art], Vec<ArtDto>> for EntityMapper {
    fn map(&self, arts: &[Art]) -> Vec<ArtDto> {
        arts.iter().map(|art| self.map(art)).collect()
    }
}

impl Mapper<Fact, FactDto> for EntityMapper {
    fn map(&self, fact: &Fact) -> FactDto {
        FactDto {
            id: fact.id,
            number: fact.number,
            title: fact.title.clone(),
            fact_content: fact.fact_content.clone(),
            image_id: fact.image_id,
            streetcode_id: fact.streetcode_id,
        }
    }
}

impl Mapper<[Fact], Vec<FactDto>> for EntityMapper {
    fn map(&self, facts: &[Fact]) -> Vec<FactDto> {
        facts.iter().map(|fact| self.map(fact)).collect()
    }
}
