//! Fact handlers: lookups, create, delete and reorder.
//!
//! # Responsibility
//! - Keep fact numbering a contiguous `1..=N` per streetcode.
//! - Validate reorder input fully before any number changes are committed.
//!
//! # Invariants
//! - Reorder either commits one full permutation or changes nothing.
//! - Duplicate ids in a reorder list are rejected regardless of list length.

use crate::dto::mapper::Mapper;
use crate::dto::{CreateFactRequest, FactDto, ReorderFactRequest, ReorderFactResponse};
use crate::handler::{ErrorCategory, RequestHandler};
use crate::logging::RequestLogger;
use crate::model::fact::{Fact, FactId, FactValidationError, NewFact};
use crate::model::streetcode::StreetcodeId;
use crate::repo::fact_repo::{FactFilter, FactRepository};
use crate::repo::streetcode_repo::StreetcodeRepository;
use crate::repo::RepoError;
use log::info;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetFactByIdQuery {
    pub id: FactId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetFactsByStreetcodeIdQuery {
    pub streetcode_id: StreetcodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderFactCommand {
    pub request: ReorderFactRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFactCommand {
    pub request: CreateFactRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteFactCommand {
    pub id: FactId,
}

/// Errors from fact handlers.
#[derive(Debug)]
pub enum FactError {
    /// Reorder list is absent or empty.
    EmptyReorderList,
    NoFactsInStreetcode(StreetcodeId),
    IdCountMismatch {
        provided: usize,
        existing: usize,
        streetcode_id: StreetcodeId,
    },
    DuplicateFactId {
        fact_id: FactId,
        streetcode_id: StreetcodeId,
    },
    /// Id is unknown or belongs to another streetcode.
    FactNotInStreetcode {
        fact_id: FactId,
        streetcode_id: StreetcodeId,
    },
    /// Commit of new numbers did not write exactly one row per id.
    NumbersNotUpdated(StreetcodeId),
    FactNotFound(FactId),
    StreetcodeNotFound(StreetcodeId),
    Invalid(FactValidationError),
    Repo(RepoError),
}

impl FactError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyReorderList | Self::DuplicateFactId { .. } | Self::Invalid(_) => {
                ErrorCategory::Validation
            }
            Self::NoFactsInStreetcode(_)
            | Self::FactNotInStreetcode { .. }
            | Self::FactNotFound(_)
            | Self::StreetcodeNotFound(_) => ErrorCategory::NotFound,
            Self::IdCountMismatch { .. } => ErrorCategory::Consistency,
            Self::NumbersNotUpdated(_) => ErrorCategory::Persistence,
            Self::Repo(_) => ErrorCategory::Storage,
        }
    }
}

impl Display for FactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyReorderList => write!(f, "Incoming array of fact ids is null or empty"),
            Self::NoFactsInStreetcode(streetcode_id) => write!(
                f,
                "Cannot find any fact by a streetcode id: {streetcode_id}"
            ),
            Self::IdCountMismatch {
                provided,
                existing,
                streetcode_id,
            } => write!(
                f,
                "Incorrect number of ids in array: got {provided}, \
                 streetcode {streetcode_id} has {existing} facts"
            ),
            Self::DuplicateFactId {
                fact_id,
                streetcode_id,
            } => write!(
                f,
                "Fact id {fact_id} is listed more than once for streetcode {streetcode_id}"
            ),
            Self::FactNotInStreetcode {
                fact_id,
                streetcode_id,
            } => write!(
                f,
                "Fact with id {fact_id} does not belong to streetcode {streetcode_id}"
            ),
            Self::NumbersNotUpdated(streetcode_id) => write!(
                f,
                "Cannot update numbers of facts in streetcode {streetcode_id}"
            ),
            Self::FactNotFound(id) => write!(f, "Cannot find a fact with corresponding id: {id}"),
            Self::StreetcodeNotFound(id) => {
                write!(f, "Cannot find a streetcode with corresponding id: {id}")
            }
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FactError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for FactError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "fact",
                id,
            } => Self::FactNotFound(id),
            RepoError::Validation(err) => Self::Invalid(err),
            other => Self::Repo(other),
        }
    }
}

fn report(logger: &impl RequestLogger, request: &dyn Debug, err: FactError) -> FactError {
    logger.log_error(request, &err.to_string());
    err
}

/// Reassigns fact numbers of one streetcode to follow a requested order.
pub struct ReorderFactHandler<R: FactRepository, L: RequestLogger> {
    repo: R,
    logger: L,
}

impl<R: FactRepository, L: RequestLogger> ReorderFactHandler<R, L> {
    pub fn new(repo: R, logger: L) -> Self {
        Self { repo, logger }
    }

    fn validate_ids(&self, request: &ReorderFactRequest) -> Result<(), FactError> {
        let streetcode_id = request.streetcode_id;
        let ids = match request.reordered_ids.as_deref() {
            Some(ids) if !ids.is_empty() => ids,
            _ => return Err(FactError::EmptyReorderList),
        };

        let existing = self
            .repo
            .count_facts(&FactFilter::by_streetcode(streetcode_id))?;
        if existing == 0 {
            return Err(FactError::NoFactsInStreetcode(streetcode_id));
        }
        if ids.len() != existing {
            return Err(FactError::IdCountMismatch {
                provided: ids.len(),
                existing,
                streetcode_id,
            });
        }

        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(&fact_id) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(FactError::DuplicateFactId {
                fact_id,
                streetcode_id,
            });
        }
        Ok(())
    }

    fn stage_numbers(&self, streetcode_id: StreetcodeId, ids: &[FactId]) -> Result<(), FactError> {
        for (position, &fact_id) in ids.iter().enumerate() {
            let mut fact = self
                .repo
                .find_fact(&FactFilter::in_streetcode(fact_id, streetcode_id))?
                .ok_or(FactError::FactNotInStreetcode {
                    fact_id,
                    streetcode_id,
                })?;
            fact.number = position as i64 + 1;
            self.repo.update_fact(&fact)?;
        }
        Ok(())
    }

    fn reorder(&self, request: &ReorderFactRequest) -> Result<usize, FactError> {
        self.validate_ids(request)?;

        let ids = request.reordered_ids.as_deref().unwrap_or_default();
        if let Err(err) = self.stage_numbers(request.streetcode_id, ids) {
            self.repo.discard_changes();
            return Err(err);
        }

        // Anything short of one row per id means the batch did not land whole.
        let affected = self.repo.save_changes()?;
        if affected != ids.len() {
            return Err(FactError::NumbersNotUpdated(request.streetcode_id));
        }
        Ok(affected)
    }
}

impl<R: FactRepository, L: RequestLogger> RequestHandler<ReorderFactCommand>
    for ReorderFactHandler<R, L>
{
    type Response = ReorderFactResponse;
    type Error = FactError;

    fn handle(&self, command: &ReorderFactCommand) -> Result<ReorderFactResponse, FactError> {
        let request = &command.request;
        let affected = self
            .reorder(request)
            .map_err(|err| report(&self.logger, request, err))?;

        info!(
            "event=facts_reorder module=handler status=ok streetcode_id={} affected={}",
            request.streetcode_id, affected
        );
        Ok(ReorderFactResponse { is_reordered: true })
    }
}

pub struct GetFactByIdHandler<R, M, L> {
    repo: R,
    mapper: M,
    logger: L,
}

impl<R, M, L> GetFactByIdHandler<R, M, L>
where
    R: FactRepository,
    M: Mapper<Fact, FactDto>,
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

impl<R, M, L> RequestHandler<GetFactByIdQuery> for GetFactByIdHandler<R, M, L>
where
    R: FactRepository,
    M: Mapper<Fact, FactDto>,
    L: RequestLogger,
{
    type Response = FactDto;
    type Error = FactError;

    fn handle(&self, query: &GetFactByIdQuery) -> Result<FactDto, FactError> {
        let fact = self
            .repo
            .find_fact(&FactFilter::by_id(query.id))
            .map_err(|err| report(&self.logger, query, err.into()))?
            .ok_or_else(|| report(&self.logger, query, FactError::FactNotFound(query.id)))?;
        Ok(self.mapper.map(&fact))
    }
}

pub struct GetFactsByStreetcodeIdHandler<R, M, L> {
    repo: R,
    mapper: M,
    logger: L,
}

impl<R, M, L> GetFactsByStreetcodeIdHandler<R, M, L>
where
    R: FactRepository,
    M: Mapper<[Fact], Vec<FactDto>>,
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

impl<R, M, L> RequestHandler<GetFactsByStreetcodeIdQuery> for GetFactsByStreetcodeIdHandler<R, M, L>
where
    R: FactRepository,
    M: Mapper<[Fact], Vec<FactDto>>,
    L: RequestLogger,
{
    type Response = Vec<FactDto>;
    type Error = FactError;

    /// Facts in `number` order; empty when the streetcode has none.
    fn handle(&self, query: &GetFactsByStreetcodeIdQuery) -> Result<Vec<FactDto>, FactError> {
        let facts = self
            .repo
            .list_facts(&FactFilter::by_streetcode(query.streetcode_id))
            .map_err(|err| report(&self.logger, query, err.into()))?;
        Ok(self.mapper.map(facts.as_slice()))
    }
}

/// Appends a new fact to its streetcode.
pub struct CreateFactHandler<F, S, M, L> {
    facts: F,
    streetcodes: S,
    mapper: M,
    logger: L,
}

impl<F, S, M, L> CreateFactHandler<F, S, M, L>
where
    F: FactRepository,
    S: StreetcodeRepository,
    M: Mapper<Fact, FactDto>,
    L: RequestLogger,
{
    pub fn new(facts: F, streetcodes: S, mapper: M, logger: L) -> Self {
        Self {
            facts,
            streetcodes,
            mapper,
            logger,
        }
    }

    fn create(&self, request: &CreateFactRequest) -> Result<Fact, FactError> {
        let new_fact = NewFact {
            streetcode_id: request.streetcode_id,
            title: request.title.trim().to_string(),
            fact_content: request.fact_content.trim().to_string(),
            image_id: request.image_id,
        };
        new_fact.validate().map_err(FactError::Invalid)?;

        if self
            .streetcodes
            .get_streetcode(request.streetcode_id)?
            .is_none()
        {
            return Err(FactError::StreetcodeNotFound(request.streetcode_id));
        }
        Ok(self.facts.create_fact(&new_fact)?)
    }
}

impl<F, S, M, L> RequestHandler<CreateFactCommand> for CreateFactHandler<F, S, M, L>
where
    F: FactRepository,
    S: StreetcodeRepository,
    M: Mapper<Fact, FactDto>,
    L: RequestLogger,
{
    type Response = FactDto;
    type Error = FactError;

    fn handle(&self, command: &CreateFactCommand) -> Result<FactDto, FactError> {
        let fact = self
            .create(&command.request)
            .map_err(|err| report(&self.logger, command, err))?;
        info!(
            "event=fact_create module=handler status=ok fact_id={} streetcode_id={} number={}",
            fact.id, fact.streetcode_id, fact.number
        );
        Ok(self.mapper.map(&fact))
    }
}

/// Removes a fact and closes the gap in its streetcode's numbering.
pub struct DeleteFactHandler<R, M, L> {
    repo: R,
    mapper: M,
    logger: L,
}

impl<R, M, L> DeleteFactHandler<R, M, L>
where
    R: FactRepository,
    M: Mapper<Fact, FactDto>,
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

impl<R, M, L> RequestHandler<DeleteFactCommand> for DeleteFactHandler<R, M, L>
where
    R: FactRepository,
    M: Mapper<Fact, FactDto>,
    L: RequestLogger,
{
    type Response = FactDto;
    type Error = FactError;

    fn handle(&self, command: &DeleteFactCommand) -> Result<FactDto, FactError> {
        let deleted = self
            .repo
            .delete_fact(command.id)
            .map_err(|err| report(&self.logger, command, err.into()))?;
        info!(
            "event=fact_delete module=handler status=ok fact_id={} streetcode_id={}",
            deleted.id, deleted.streetcode_id
        );
        Ok(self.mapper.map(&deleted))
    }
}
