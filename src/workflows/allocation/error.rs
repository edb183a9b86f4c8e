use super::domain::{ApplicationId, FlatType, PersonId, ProjectId};
use super::inventory::{InventoryCounter, InventoryError};
use super::repository::RepositoryError;

/// Every way an allocation workflow can refuse to act.
///
/// A returned error always means nothing was written.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("{applicant} is not eligible for a {flat_type} flat in {project}")]
    Ineligible {
        applicant: PersonId,
        project: ProjectId,
        flat_type: FlatType,
    },
    #[error("{applicant} already holds active application {existing}")]
    DuplicateActiveApplication {
        applicant: PersonId,
        existing: ApplicationId,
    },
    #[error("cannot {operation} {entity} {id}: {reason}")]
    InvalidState {
        entity: &'static str,
        id: String,
        operation: &'static str,
        reason: String,
    },
    #[error("no {counter} left in {project}")]
    InventoryExhausted {
        project: ProjectId,
        counter: InventoryCounter,
    },
    #[error("inventory for {project} refused to go negative: {source}")]
    NegativeInventory {
        project: ProjectId,
        source: InventoryError,
    },
    #[error("inventory for {project} refused an over-release: {source}")]
    OverRelease {
        project: ProjectId,
        source: InventoryError,
    },
    #[error("officer {officer} is already pending or handling {project}")]
    AlreadyAssigned { officer: PersonId, project: ProjectId },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{field} must not be blank")]
    BlankText { field: &'static str },
    #[error("{actor} may not {action}")]
    NotPermitted { actor: PersonId, action: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AllocationError {
    pub(crate) fn invalid_state(
        entity: &'static str,
        id: impl ToString,
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            entity,
            id: id.to_string(),
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_permitted(actor: &PersonId, action: impl Into<String>) -> Self {
        Self::NotPermitted {
            actor: actor.clone(),
            action: action.into(),
        }
    }

    pub(crate) fn inventory(project: &ProjectId, source: InventoryError) -> Self {
        match source {
            InventoryError::OverRelease { .. } => Self::OverRelease {
                project: project.clone(),
                source,
            },
            InventoryError::Negative { .. } | InventoryError::Inconsistent { .. } => {
                Self::NegativeInventory {
                    project: project.clone(),
                    source,
                }
            }
        }
    }
}
