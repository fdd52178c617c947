//! Essay use-case service.
//!
//! # Responsibility
//! - Polish drafts and persist them as new versions with lineage.
//! - Synchronize client-supplied batches under the authenticated owner.
//! - Delegate list/delete to the repository contract.
//!
//! # Invariants
//! - `sync_essays` force-stamps the owner on every incoming record; a client
//!   can never write into another user's partition.
//! - `polish_and_save` links the new version to the owner's previous newest
//!   active essay via `parent_id` (lineage only, never dereferenced).

use crate::model::essay::{Essay, EssayId, UNASSIGNED_ID};
use crate::repo::essay_repo::{EssayRepository, RepoError, RepoResult};
use crate::service::polish::{PolishError, Polisher};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for essay use-cases.
#[derive(Debug)]
pub enum EssayServiceError {
    /// Draft content must not be empty.
    EmptyContent,
    /// The polishing step failed.
    Polish(PolishError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for EssayServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "essay content must not be empty"),
            Self::Polish(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EssayServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Polish(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::EmptyContent => None,
        }
    }
}

impl From<PolishError> for EssayServiceError {
    fn from(value: PolishError) -> Self {
        Self::Polish(value)
    }
}

impl From<RepoError> for EssayServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case facade over repository and polisher implementations.
pub struct EssayService<R: EssayRepository, P: Polisher> {
    repo: R,
    polisher: P,
}

impl<R: EssayRepository, P: Polisher> EssayService<R, P> {
    pub fn new(repo: R, polisher: P) -> Self {
        Self { repo, polisher }
    }

    /// Polishes `content` and persists the result as a new version for
    /// `owner`, linked to the previous newest active essay.
    pub fn polish_and_save(
        &self,
        owner: &str,
        title: &str,
        content: &str,
    ) -> Result<Essay, EssayServiceError> {
        if content.trim().is_empty() {
            return Err(EssayServiceError::EmptyContent);
        }

        let polished = self.polisher.polish(title, content)?;
        let parent_id = self
            .repo
            .list_active(owner)?
            .first()
            .map_or(UNASSIGNED_ID, |newest| newest.id);

        let mut essay = Essay::draft(owner, title, content, polished);
        essay.parent_id = parent_id;
        self.repo.save(&mut essay)?;
        Ok(essay)
    }

    /// Saves every record in `essays` under `owner`, overriding whatever
    /// owner the client supplied. Returns the persisted records with their
    /// assigned ids. Stops at the first failure.
    pub fn sync_essays(
        &self,
        owner: &str,
        essays: Vec<Essay>,
    ) -> Result<Vec<Essay>, EssayServiceError> {
        let mut saved = Vec::with_capacity(essays.len());
        for mut essay in essays {
            essay.owner = owner.to_string();
            self.repo.save(&mut essay)?;
            saved.push(essay);
        }
        Ok(saved)
    }

    /// Lists active essays for `owner`, newest first.
    pub fn list_essays(&self, owner: &str) -> RepoResult<Vec<Essay>> {
        self.repo.list_active(owner)
    }

    /// Soft-deletes one essay by id.
    pub fn delete_essay(&self, owner: &str, id: EssayId) -> RepoResult<()> {
        self.repo.soft_delete(owner, id)
    }
}
