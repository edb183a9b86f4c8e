//! Application state machine.
//!
//! ```text
//! PENDING ──approve──▶ SUCCESSFUL ──book──▶ BOOKED
//!    │                     │                  │
//!    └──reject──▶ UNSUCCESSFUL ◀──withdraw────┘
//! ```
//!
//! Each transition validates everything it needs before touching any entity, so an `Err`
//! leaves the caller's values exactly as they were passed in.

use chrono::NaiveDate;

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Booking, FlatType, Person, Project, Receipt,
};
use super::eligibility::EligibilityPolicy;
use super::error::AllocationError;
use super::inventory::InventoryCounter;

/// Open a PENDING application for `applicant`.
///
/// `applications` is every application in the system; only the applicant's own are consulted.
pub fn submit(
    policy: &EligibilityPolicy,
    applicant: &mut Person,
    project: &Project,
    flat_type: FlatType,
    applications: &[Application],
    issue_id: impl FnOnce() -> ApplicationId,
    today: NaiveDate,
) -> Result<Application, AllocationError> {
    if applicant.is_manager() {
        return Err(AllocationError::not_permitted(
            &applicant.id,
            "apply for a flat as a manager",
        ));
    }

    if let Some(assignment) = applicant.assignment() {
        if assignment.involves(&project.id) {
            return Err(AllocationError::not_permitted(
                &applicant.id,
                format!("apply for {} while registered to administer it", project.id),
            ));
        }
    }

    let history: Vec<Application> = applications
        .iter()
        .filter(|application| application.applicant_id == applicant.id)
        .cloned()
        .collect();

    if let Some(existing) = history.iter().find(|application| application.status.is_active()) {
        return Err(AllocationError::DuplicateActiveApplication {
            applicant: applicant.id.clone(),
            existing: existing.id.clone(),
        });
    }

    if !policy
        .eligible_flat_types(applicant, project, &history)
        .contains(&flat_type)
    {
        return Err(AllocationError::Ineligible {
            applicant: applicant.id.clone(),
            project: project.id.clone(),
            flat_type,
        });
    }

    applicant.candidate_project = Some(project.id.clone());

    Ok(Application {
        id: issue_id(),
        applicant_id: applicant.id.clone(),
        project_id: project.id.clone(),
        submitted_on: today,
        flat_type,
        status: ApplicationStatus::Pending,
        withdrawal_requested: false,
    })
}

/// Manager decision on a PENDING application. Approval reserves nothing; units are only
/// consumed by [`book`].
pub fn decide(
    manager: &Person,
    applicant: &mut Person,
    application: &mut Application,
    project: &Project,
    approve: bool,
) -> Result<ApplicationStatus, AllocationError> {
    ensure_owner(manager, project, "decide applications for")?;

    if application.status != ApplicationStatus::Pending {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "decide",
            format!("status is already {}", application.status),
        ));
    }

    let status = if approve && project.units_available(application.flat_type) > 0 {
        ApplicationStatus::Successful
    } else {
        ApplicationStatus::Unsuccessful
    };

    if status == ApplicationStatus::Unsuccessful {
        clear_candidate(applicant, application);
    }
    application.status = status;

    Ok(status)
}

/// Commit one unit of the application's flat type and mark it BOOKED.
pub fn book(
    officer: &Person,
    applicant: &mut Person,
    application: &mut Application,
    project: &mut Project,
    flat_type: FlatType,
) -> Result<(), AllocationError> {
    if !officer.handles(&application.project_id) {
        return Err(AllocationError::not_permitted(
            &officer.id,
            format!("book flats for {}", application.project_id),
        ));
    }

    if application.status != ApplicationStatus::Successful {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "book",
            format!("status is {}, expected successful", application.status),
        ));
    }

    if flat_type != application.flat_type {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "book",
            format!(
                "requested {} but the application selected {}",
                flat_type, application.flat_type
            ),
        ));
    }

    let counter = InventoryCounter::Units(flat_type);
    if project.inventory.available(counter) == 0 {
        return Err(AllocationError::InventoryExhausted {
            project: project.id.clone(),
            counter,
        });
    }

    project
        .inventory
        .decrement(counter)
        .map_err(|source| AllocationError::inventory(&project.id, source))?;

    applicant.booking = Some(Booking {
        project_id: project.id.clone(),
        flat_type,
    });
    application.status = ApplicationStatus::Booked;

    Ok(())
}

/// Receipt for a SUCCESSFUL or BOOKED application.
pub fn receipt(
    application: &Application,
    applicant: &Person,
    project: &Project,
) -> Result<Receipt, AllocationError> {
    if !matches!(
        application.status,
        ApplicationStatus::Successful | ApplicationStatus::Booked
    ) {
        return Err(AllocationError::invalid_state(
            "application",
            &application.id,
            "issue a receipt for",
            format!("status is {}", application.status),
        ));
    }

    Ok(Receipt {
        application_id: application.id.clone(),
        applicant_id: applicant.id.clone(),
        applicant_name: applicant.name.clone(),
        age: applicant.age,
        marital_status: applicant.marital_status,
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        neighborhood: project.neighborhood.clone(),
        flat_type: application.flat_type,
        status: application.status,
    })
}

pub(crate) fn ensure_owner(
    manager: &Person,
    project: &Project,
    action: &str,
) -> Result<(), AllocationError> {
    if manager.owns(project) {
        Ok(())
    } else {
        Err(AllocationError::not_permitted(
            &manager.id,
            format!("{action} {}", project.id),
        ))
    }
}

pub(crate) fn clear_candidate(applicant: &mut Person, application: &Application) {
    if applicant.candidate_project.as_ref() == Some(&application.project_id) {
        applicant.candidate_project = None;
    }
}
