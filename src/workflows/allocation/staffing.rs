use super::domain::{Application, AssignmentStatus, Person, Project, StaffAssignment};
use super::error::AllocationError;
use super::inventory::InventoryCounter;
use super::lifecycle::ensure_owner;

fn assignment_of<'a>(
    officer: &'a Person,
    action: &str,
) -> Result<&'a StaffAssignment, AllocationError> {
    officer
        .assignment()
        .ok_or_else(|| AllocationError::not_permitted(&officer.id, action.to_string()))
}

/// File a request for `officer` to administer `project`.
pub fn request_assignment(
    officer: &mut Person,
    project: &Project,
    applications: &[Application],
) -> Result<(), AllocationError> {
    let assignment = assignment_of(officer, "register to administer a project")?;

    if assignment.is_engaged() {
        let project_id = assignment
            .handling_project
            .clone()
            .or_else(|| assignment.pending_project.clone())
            .unwrap_or_else(|| project.id.clone());
        return Err(AllocationError::AlreadyAssigned {
            officer: officer.id.clone(),
            project: project_id,
        });
    }

    if project.inventory.staff_slots() == 0 {
        return Err(AllocationError::InventoryExhausted {
            project: project.id.clone(),
            counter: InventoryCounter::StaffSlots,
        });
    }

    let applied = applications.iter().any(|application| {
        application.applicant_id == officer.id
            && application.project_id == project.id
            && application.status.is_active()
    });
    if applied {
        return Err(AllocationError::not_permitted(
            &officer.id,
            format!("administer {} while applying for it", project.id),
        ));
    }

    if let Some(assignment) = officer.assignment_mut() {
        assignment.pending_project = Some(project.id.clone());
        assignment.status = AssignmentStatus::Pending;
    }

    Ok(())
}

/// Approve or reject the officer's pending request. A since-exhausted slot turns an approval
/// into a rejection; the pending reference is cleared either way.
pub fn decide_assignment(
    manager: &Person,
    officer: &mut Person,
    project: &mut Project,
    approve: bool,
) -> Result<AssignmentStatus, AllocationError> {
    let assignment = assignment_of(officer, "be assigned to a project")?;

    if assignment.pending_project.as_ref() != Some(&project.id) {
        return Err(AllocationError::invalid_state(
            "officer",
            &officer.id,
            "decide registration for",
            format!("no pending request for {}", project.id),
        ));
    }

    ensure_owner(manager, project, "approve officers for")?;

    let status = if approve && project.inventory.staff_slots() > 0 {
        project
            .inventory
            .decrement(InventoryCounter::StaffSlots)
            .map_err(|source| AllocationError::inventory(&project.id, source))?;
        AssignmentStatus::Approved
    } else {
        AssignmentStatus::Rejected
    };

    if let Some(assignment) = officer.assignment_mut() {
        let pending = assignment.pending_project.take();
        if status == AssignmentStatus::Approved {
            assignment.handling_project = pending;
        }
        assignment.status = status;
    }

    Ok(status)
}
