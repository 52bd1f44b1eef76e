//! Art handlers.

use crate::dto::mapper::Mapper;
use crate::dto::ArtDto;
use crate::handler::{ErrorCategory, RequestHandler};
use crate::logging::RequestLogger;
use crate::model::art::{Art, ArtId};
use crate::model::streetcode::StreetcodeId;
use crate::repo::art_repo::{ArtFilter, ArtRepository};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetArtByIdQuery {
    pub id: ArtId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetAllArtsQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetArtsByStreetcodeIdQuery {
    pub streetcode_id: StreetcodeId,
}

#[derive(Debug)]
pub enum ArtError {
    ArtNotFound(ArtId),
    Repo(RepoError),
}

impl ArtError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ArtNotFound(_) => ErrorCategory::NotFound,
            Self::Repo(_) => ErrorCategory::Storage,
        }
    }
}

impl Display for ArtError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArtNotFound(id) => write!(f, "Cannot find an art with corresponding id: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArtError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::ArtNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ArtError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "art", id } => Self::ArtNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct GetArtByIdHandler<R, M, L> {
    repo: R,
    mapper: M,
    logger: L,
}

impl<R, M, L> GetArtByIdHandler<R, M, L>
where
    R: ArtRepository,
    M: Mapper<Art, ArtDto>,
    L: RequestLogger,
{
    pub fn new(repo: R, mapper: M, logger: L) -> Self {
        Self {
            repo,
            mapper,
            logger,
        }
    }

    fn fail(&self, query: &GetArtByIdQuery, err: ArtError) -> ArtError {
        self.logger.log_error(query, &err.to_string());
        err
    }
}

impl<R, M, L> RequestHandler<GetArtByIdQuery> for GetArtByIdHandler<R, M, L>
where
    R: ArtRepository,
    M: Mapper<Art, ArtDto>,
    L: RequestLogger,
{
    type Response = ArtDto;
    type Error = ArtError;

    fn handle(&self, query: &GetArtByIdQuery) -> Result<ArtDto, ArtError> {
        let art = self
            .repo
            .find_art(&ArtFilter::by_id(query.id))
            .map_err(|err| self.fail(query, err.into()))?
            .ok_or_else(|| self.fail(query, ArtError::ArtNotFound(query.id)))?;
        Ok(self.mapper.map(&art))
    }
}

/// Lists arts, optionally restricted to one streetcode.
///
/// The whole collection goes through the mapper in one call.
pub struct ListArtsHandler<R, M, L> {
    repo: R,
    mapper: M,
    logger: L,
}

pub type GetAllArtsHandler<R, M, L> = ListArtsHandler<R, M, L>;
pub type GetArtsByStreetcodeIdHandler<R, M, L> = ListArtsHandler<R, M, L>;

impl<R, M, L> ListArtsHandler<R, M, L>
where
    R: ArtRepository,
    M: Mapper<[Art], Vec<ArtDto>>,
    L: RequestLogger,
{
    pub fn new(repo: R, mapper: M, logger: L) -> Self {
        Self {
            repo,
            mapper,
            logger,
        }
    }

    fn list(&self, request: &dyn Debug, filter: &ArtFilter) -> Result<Vec<ArtDto>, ArtError> {
        let arts = self.repo.list_arts(filter).map_err(|err| {
            let err = ArtError::from(err);
            self.logger.log_error(request, &err.to_string());
            err
        })?;
        Ok(self.mapper.map(arts.as_slice()))
    }
}

impl<R, M, L> RequestHandler<GetAllArtsQuery> for ListArtsHandler<R, M, L>
where
    R: ArtRepository,
    M: Mapper<[Art], Vec<ArtDto>>,
    L: RequestLogger,
{
    type Response = Vec<ArtDto>;
    type Error = ArtError;

    fn handle(&self, query: &GetAllArtsQuery) -> Result<Vec<ArtDto>, ArtError> {
        self.list(query, &ArtFilter::default())
    }
}

impl<R, M, L> RequestHandler<GetArtsByStreetcodeIdQuery> for ListArtsHandler<R, M, L>
where
    R: ArtRepository,
    M: Mapper<[Art], Vec<ArtDto>>,
    L: RequestLogger,
{
    type Response = Vec<ArtDto>;
    type Error = ArtError;

    fn handle(&self, query: &GetArtsByStreetcodeIdQuery) -> Result<Vec<ArtDto>, ArtError> {
        self.list(query, &ArtFilter::by_streetcode(query.streetcode_id))
    }
}
