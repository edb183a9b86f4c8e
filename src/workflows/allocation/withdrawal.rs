use serde::Serialize;

use super::domain::{Application, ApplicationStatus, Person, Project};
use super::error::AllocationError;
use super::inventory::InventoryCounter;
use super::lifecycle::{clear_candidate, ensure_owner};

/// Result of a manager's withdrawal decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WithdrawalOutcome {
    pub approved: bool,
    pub previous_status: ApplicationStatus,
    pub status: ApplicationStatus,
    /// Whether a committed unit went back into the project inventory.
    pub unit_released: bool,
}

/// Flag the applicant's active application for withdrawal. The status is left alone until a
/// manager decides.
pub fn request_withdrawal(application: &mut Application) -> Result<(), AllocationError> {
    if !application.status.is_active() {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "withdraw",
            "application is already unsuccessful",
        ));
    }

    if application.withdrawal_requested {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "withdraw",
            "withdrawal already requested",
        ));
    }

    application.withdrawal_requested = true;
    Ok(())
}

pub fn decide_withdrawal(
    manager: &Person,
    applicant: &mut Person,
    application: &mut Application,
    project: &mut Project,
    approve: bool,
) -> Result<WithdrawalOutcome, AllocationError> {
    ensure_owner(manager, project, "decide withdrawals for")?;

    if !application.status.is_active() {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "decide withdrawal of",
            "application is already unsuccessful",
        ));
    }

    if !application.withdrawal_requested {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "decide withdrawal of",
            "no withdrawal was requested",
        ));
    }

    let previous_status = application.status;

    if !approve {
        application.withdrawal_requested = false;
        return Ok(WithdrawalOutcome {
            approved: false,
            previous_status,
            status: previous_status,
            unit_released: false,
        });
    }

    let unit_released = application.holds_unit();
    if unit_released {
        project
            .inventory
            .increment(InventoryCounter::Units(application.flat_type))
            .map_err(|source| AllocationError::inventory(&project.id, source))?;
        applicant.booking = None;
    }

    clear_candidate(applicant, application);
    application.status = ApplicationStatus::Unsuccessful;
    application.withdrawal_requested = false;

    Ok(WithdrawalOutcome {
        approved: true,
        previous_status,
        status: ApplicationStatus::Unsuccessful,
        unit_released,
    })
}
