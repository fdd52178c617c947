//! Essay domain model.
//!
//! # Responsibility
//! - Define the canonical versioned essay record persisted per owner.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `(owner, id)` is unique and never reassigned once persisted.
//! - `deleted_at` is the source of truth for tombstone state; empty = active.
//! - `id == 0` means "identity not assigned yet" and triggers allocation on save.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Sort-key identifier within one owner partition.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type EssayId = i64;

/// Sentinel value meaning "allocate an id on save".
pub const UNASSIGNED_ID: EssayId = 0;

/// Canonical persisted essay record.
///
/// Field serialization names follow the external API contract, which mixes
/// snake_case timestamps with camelCase content fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Essay {
    /// Partition key. Identity of the owning user. Must be non-empty.
    pub owner: String,
    /// Sort key within the owner partition. `0` requests allocation.
    #[serde(default)]
    pub id: EssayId,
    /// RFC3339 write timestamp. Stamped by the repository when empty.
    #[serde(default)]
    pub updated_at: String,
    /// RFC3339 soft-delete timestamp. Empty means the record is active.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deleted_at: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "originalContent")]
    pub original_content: String,
    #[serde(default, rename = "polishedContent")]
    pub polished_content: String,
    /// Back-reference to the prior version of the same logical essay.
    /// Lineage only; never dereferenced or enforced. `0` means no parent.
    #[serde(default, rename = "parentId", skip_serializing_if = "id_is_unassigned")]
    pub parent_id: EssayId,
}

fn id_is_unassigned(id: &EssayId) -> bool {
    *id == UNASSIGNED_ID
}

/// Validation error for essay write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EssayValidationError {
    /// `owner` must be a non-empty string.
    EmptyOwner,
    /// `id` must not be negative.
    NegativeId(EssayId),
}

impl Display for EssayValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOwner => write!(f, "essay owner must not be empty"),
            Self::NegativeId(id) => write!(f, "essay id must not be negative, got {id}"),
        }
    }
}

impl Error for EssayValidationError {}

impl Essay {
    /// Creates an unsaved essay draft for `owner` with an unassigned id.
    pub fn draft(
        owner: impl Into<String>,
        title: impl Into<String>,
        original_content: impl Into<String>,
        polished_content: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            id: UNASSIGNED_ID,
            updated_at: String::new(),
            deleted_at: String::new(),
            title: title.into(),
            original_content: original_content.into(),
            polished_content: polished_content.into(),
            parent_id: UNASSIGNED_ID,
        }
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), EssayValidationError> {
        if self.owner.trim().is_empty() {
            return Err(EssayValidationError::EmptyOwner);
        }
        if self.id < 0 {
            return Err(EssayValidationError::NegativeId(self.id));
        }
        Ok(())
    }

    /// Returns whether this record should be considered visible/active.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_empty()
    }

    /// Stamps the soft-delete tombstone. Idempotent; repeated calls refresh
    /// the timestamp and touch nothing else.
    pub fn mark_deleted(&mut self, at: impl Into<String>) {
        self.deleted_at = at.into();
    }
}
