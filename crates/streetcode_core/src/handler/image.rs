//! Image handlers.

use crate::dto::mapper::Mapper;
use crate::dto::ImageDto;
use crate::handler::{ErrorCategory, RequestHandler};
use crate::logging::RequestLogger;
use crate::model::image::{Image, ImageId};
use crate::repo::image_repo::ImageRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetImageByIdQuery {
    pub id: ImageId,
}

#[derive(Debug)]
pub enum ImageError {
    ImageNotFound(ImageId),
    Repo(RepoError),
}

impl ImageError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ImageNotFound(_) => ErrorCategory::NotFound,
            Self::Repo(_) => ErrorCategory::Storage,
        }
    }
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImageNotFound(id) => {
                write!(f, "Cannot find an image with corresponding id: {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::ImageNotFound(_) => None,
        }
    }
}

pub struct GetImageByIdHandler<R, M, L> {
    repo: R,
    mapper: M,
    logger: L,
}

impl<R, M, L> GetImageByIdHandler<R, M, L>
where
    R: ImageRepository,
    M: Mapper<Image, ImageDto>,
    L: RequestLogger,
{
    pub fn new(repo: R, mapper: M, logger: L) -> Self {
        Self {
            repo,
            mapper,
            logger,
        }
    }
}

impl<R, M, L> RequestHandler<GetImageByIdQuery> for GetImageByIdHandler<R, M, L>
where
    R: ImageRepository,
    M: Mapper<Image, ImageDto>,
    L: RequestLogger,
{
    type Response = ImageDto;
    type Error = ImageError;

    fn handle(&self, query: &GetImageByIdQuery) -> Result<ImageDto, ImageError> {
        let image = match self.repo.get_image(query.id) {
            Ok(Some(image)) => image,
            Ok(None) => {
                let err = ImageError::ImageNotFound(query.id);
                self.logger.log_error(query, &err.to_string());
                return Err(err);
            }
            Err(err) => {
                let err = ImageError::Repo(err);
                self.logger.log_error(query, &err.to_string());
                return Err(err);
            }
        };
        Ok(self.mapper.map(&image))
    }
}
