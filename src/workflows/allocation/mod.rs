//! Allocation and lifecycle engine for subsidized housing projects.
//!
//! The pure state machines (`lifecycle`, `staffing`, `withdrawal`, `enquiry`) operate on
//! owned entity values; [`AllocationService`] loads those values from the repositories,
//! runs a transition under the ledger lock, and writes the results back.

pub mod domain;
pub mod eligibility;
pub mod enquiry;
pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;
pub mod staffing;
pub mod store;
pub mod withdrawal;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationStatus, AssignmentStatus, Booking, Enquiry, EnquiryId,
    EnquiryStatus, FlatType, MaritalStatus, Person, PersonId, Project, ProjectDraft, ProjectId,
    Receipt, Role, StaffAssignment,
};
pub use eligibility::{is_visible_to, EligibilityPolicy};
pub use error::AllocationError;
pub use inventory::{InventoryCounter, InventoryError, ProjectInventory};
pub use repository::{MemoryRepository, Record, Repository, RepositoryError};
pub use router::allocation_router;
pub use service::AllocationService;
pub use store::{AllocationSnapshot, Repositories};
pub use withdrawal::WithdrawalOutcome;
