use super::common::*;
use crate::workflows::allocation::domain::{AssignmentStatus, FlatType, StaffAssignment};
use crate::workflows::allocation::inventory::InventoryCounter;
use crate::workflows::allocation::{AllocationError, AllocationService};

fn assignment(service: &AllocationService, officer: &str) -> StaffAssignment {
    service
        .person(&pid(officer))
        .expect("officer")
        .assignment()
        .cloned()
        .expect("officer role")
}

#[test]
fn request_marks_officer_pending() {
    let service = build_service();

    let officer = service
        .request_assignment(&pid(DANIEL), &prj(ACACIA))
        .expect("request filed");

    let state = officer.assignment().expect("officer role");
    assert_eq!(state.pending_project, Some(prj(ACACIA)));
    assert_eq!(state.handling_project, None);
    assert_eq!(state.status, AssignmentStatus::Pending);
    let project = service.project(&prj(ACACIA)).expect("project");
    assert_eq!(project.inventory.staff_slots(), 3);
}

#[test]
fn approval_consumes_a_staff_slot() {
    let service = build_service();
    service
        .request_assignment(&pid(DANIEL), &prj(CEDAR))
        .expect("request filed");

    let officer = service
        .decide_assignment(&pid(MICHAEL), &pid(DANIEL), true)
        .expect("approved");

    let state = officer.assignment().expect("officer role");
    assert_eq!(state.handling_project, Some(prj(CEDAR)));
    assert_eq!(state.pending_project, None);
    assert_eq!(state.status, AssignmentStatus::Approved);
    assert_eq!(
        service.project(&prj(CEDAR)).expect("project").inventory.staff_slots(),
        0
    );
}

#[test]
fn project_without_slots_refuses_requests() {
    let service = build_service();

    match service.request_assignment(&pid(DANIEL), &prj(DAHLIA)) {
        Err(AllocationError::InventoryExhausted { project, counter }) => {
            assert_eq!(project, prj(DAHLIA));
            assert_eq!(counter, InventoryCounter::StaffSlots);
        }
        other => panic!("expected exhausted slots, got {other:?}"),
    }
    assert_eq!(assignment(&service, DANIEL), StaffAssignment::default());
}

#[test]
fn officer_holds_one_registration_at_a_time() {
    let service = build_service();
    service
        .request_assignment(&pid(DANIEL), &prj(ACACIA))
        .expect("first request");

    match service.request_assignment(&pid(DANIEL), &prj(BIRCH)) {
        Err(AllocationError::AlreadyAssigned { officer, project }) => {
            assert_eq!(officer, pid(DANIEL));
            assert_eq!(project, prj(ACACIA));
        }
        other => panic!("expected already assigned, got {other:?}"),
    }

    service
        .decide_assignment(&pid(MICHAEL), &pid(DANIEL), true)
        .expect("approved");
    assert!(matches!(
        service.request_assignment(&pid(DANIEL), &prj(BIRCH)),
        Err(AllocationError::AlreadyAssigned { .. })
    ));
}

#[test]
fn slot_taken_while_pending_turns_approval_into_rejection() {
    let service = build_service();
    service
        .request_assignment(&pid(DANIEL), &prj(CEDAR))
        .expect("daniel requests");
    service
        .request_assignment(&pid(EMILY), &prj(CEDAR))
        .expect("emily requests while a slot remains");

    service
        .decide_assignment(&pid(MICHAEL), &pid(DANIEL), true)
        .expect("daniel approved");
    let emily = service
        .decide_assignment(&pid(MICHAEL), &pid(EMILY), true)
        .expect("decision recorded");

    let state = emily.assignment().expect("officer role");
    assert_eq!(state.status, AssignmentStatus::Rejected);
    assert_eq!(state.handling_project, None);
    assert_eq!(state.pending_project, None);
    assert_eq!(
        service.project(&prj(CEDAR)).expect("project").inventory.staff_slots(),
        0
    );
}

#[test]
fn only_the_owning_manager_decides_registrations() {
    let service = build_service();
    service
        .request_assignment(&pid(DANIEL), &prj(ACACIA))
        .expect("request filed");

    assert!(matches!(
        service.decide_assignment(&pid(JESSICA), &pid(DANIEL), true),
        Err(AllocationError::NotPermitted { .. })
    ));

    let state = assignment(&service, DANIEL);
    assert_eq!(state.status, AssignmentStatus::Pending);
    assert_eq!(state.pending_project, Some(prj(ACACIA)));
    assert_eq!(
        service.project(&prj(ACACIA)).expect("project").inventory.staff_slots(),
        3
    );
}

#[test]
fn deciding_without_a_pending_request_is_invalid() {
    let service = build_service();

    assert!(matches!(
        service.decide_assignment(&pid(MICHAEL), &pid(DANIEL), true),
        Err(AllocationError::InvalidState { .. })
    ));
}

#[test]
fn non_officers_cannot_register() {
    let service = build_service();

    assert!(matches!(
        service.request_assignment(&pid(SARAH), &prj(ACACIA)),
        Err(AllocationError::NotPermitted { .. })
    ));
    assert!(matches!(
        service.request_assignment(&pid(MICHAEL), &prj(ACACIA)),
        Err(AllocationError::NotPermitted { .. })
    ));
}

#[test]
fn officer_cannot_administer_a_project_they_applied_for() {
    let service = build_service();
    service
        .submit_application(&pid(DANIEL), &prj(BIRCH), FlatType::TwoRoom, today())
        .expect("officer applies as an applicant");

    assert!(matches!(
        service.request_assignment(&pid(DANIEL), &prj(BIRCH)),
        Err(AllocationError::NotPermitted { .. })
    ));
    service
        .request_assignment(&pid(DANIEL), &prj(ACACIA))
        .expect("a different project is fine");
}

#[test]
fn rejected_officer_may_request_again() {
    let service = build_service();
    service
        .request_assignment(&pid(DANIEL), &prj(ACACIA))
        .expect("request filed");
    let rejected = service
        .decide_assignment(&pid(MICHAEL), &pid(DANIEL), false)
        .expect("rejected");
    assert_eq!(
        rejected.assignment().expect("officer role").status,
        AssignmentStatus::Rejected
    );
    assert_eq!(
        service.project(&prj(ACACIA)).expect("project").inventory.staff_slots(),
        3
    );

    let again = service
        .request_assignment(&pid(DANIEL), &prj(BIRCH))
        .expect("new request after rejection");
    assert_eq!(
        again.assignment().expect("officer role").pending_project,
        Some(prj(BIRCH))
    );
}

#[test]
fn handling_officer_sees_hidden_project() {
    let service = build_service();
    assign_officer(&service, DANIEL, ACACIA);
    service
        .set_visibility(&pid(MICHAEL), &prj(ACACIA), false)
        .expect("hidden");

    let daniel: Vec<_> = service
        .visible_projects(&pid(DANIEL))
        .expect("listing")
        .into_iter()
        .map(|project| project.id)
        .collect();
    assert!(daniel.contains(&prj(ACACIA)));

    let emily: Vec<_> = service
        .visible_projects(&pid(EMILY))
        .expect("listing")
        .into_iter()
        .map(|project| project.id)
        .collect();
    assert!(!emily.contains(&prj(ACACIA)));
}
