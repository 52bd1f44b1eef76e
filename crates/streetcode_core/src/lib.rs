//! Content core for the Streetcode platform.
//! This crate owns fact numbering invariants and the handler layer over
//! facts, arts and images.

pub mod db;
pub mod dto;
pub mod handler;
pub mod logging;
pub mod model;
pub mod repo;

pub use dto::mapper::{EntityMapper, Mapper};
pub use dto::{
    ArtDto, CreateFactRequest, FactDto, ImageDto, ReorderFactRequest, ReorderFactResponse,
    ResponseEnvelope,
};
pub use handler::art::{
    ArtError, GetAllArtsHandler, GetAllArtsQuery, GetArtByIdHandler, GetArtByIdQuery,
    GetArtsByStreetcodeIdHandler, GetArtsByStreetcodeIdQuery, ListArtsHandler,
};
pub use handler::fact::{
    CreateFactCommand, CreateFactHandler, DeleteFactCommand, DeleteFactHandler, FactError,
    GetFactByIdHandler, GetFactByIdQuery, GetFactsByStreetcodeIdHandler,
    GetFactsByStreetcodeIdQuery, ReorderFactCommand, ReorderFactHandler,
};
pub use handler::image::{GetImageByIdHandler, GetImageByIdQuery, ImageError};
pub use handler::{ErrorCategory, RequestHandler};
pub use logging::{
    default_log_level, init_logging, logging_status, CoreRequestLogger, LoggingConfig,
    LoggingError, RequestLogger,
};
pub use model::art::{Art, ArtId, NewArt, StreetcodeArt};
pub use model::fact::{Fact, FactId, FactValidationError, NewFact};
pub use model::image::{Image, ImageId, NewImage};
pub use model::streetcode::{NewStreetcode, Streetcode, StreetcodeId};
pub use repo::art_repo::{ArtFilter, ArtRepository, SqliteArtRepository};
pub use repo::fact_repo::{FactFilter, FactRepository, SqliteFactRepository};
pub use repo::image_repo::{ImageRepository, SqliteImageRepository};
pub use repo::streetcode_repo::{SqliteStreetcodeRepository, StreetcodeRepository};
pub use repo::{RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
