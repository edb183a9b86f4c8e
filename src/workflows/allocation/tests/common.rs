use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::allocation::domain::{
    Application, FlatType, MaritalStatus, Person, PersonId, Project, ProjectId, Role,
    StaffAssignment,
};
use crate::workflows::allocation::inventory::ProjectInventory;
use crate::workflows::allocation::{
    allocation_router, AllocationService, AllocationSnapshot, EligibilityPolicy, Repositories,
};

pub(super) const JOHN: &str = "S1234567A";
pub(super) const SARAH: &str = "T7654321B";
pub(super) const GRACE: &str = "S9876543C";
pub(super) const JAMES: &str = "T2345678D";
pub(super) const RACHEL: &str = "S3456789E";
pub(super) const DANIEL: &str = "T2109876H";
pub(super) const EMILY: &str = "S6543210I";
pub(super) const MICHAEL: &str = "T8765432F";
pub(super) const JESSICA: &str = "S5678901G";

pub(super) const ACACIA: &str = "acacia";
pub(super) const BIRCH: &str = "birch";
pub(super) const CEDAR: &str = "cedar";
pub(super) const DAHLIA: &str = "dahlia";

pub(super) fn pid(raw: &str) -> PersonId {
    PersonId::from(raw)
}

pub(super) fn prj(raw: &str) -> ProjectId {
    ProjectId::from(raw)
}

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 20).expect("valid date")
}

fn applicant(id: &str, name: &str, age: u8, marital_status: MaritalStatus) -> Person {
    Person::new(id, name, age, marital_status, Role::Applicant)
}

fn officer(id: &str, name: &str, age: u8, marital_status: MaritalStatus) -> Person {
    Person::new(
        id,
        name,
        age,
        marital_status,
        Role::Officer(StaffAssignment::default()),
    )
}

fn manager(id: &str, name: &str, age: u8, marital_status: MaritalStatus) -> Person {
    Person::new(id, name, age, marital_status, Role::Manager)
}

pub(super) fn project(id: &str, manager: &str, inventory: ProjectInventory) -> Project {
    Project {
        id: prj(id),
        name: format!("{} Residences", id),
        neighborhood: "Yishun".to_string(),
        opening_date: NaiveDate::from_ymd_opt(2025, 2, 15).expect("valid"),
        closing_date: NaiveDate::from_ymd_opt(2025, 3, 20).expect("valid"),
        visible: true,
        manager_id: pid(manager),
        inventory,
    }
}

pub(super) fn people() -> Vec<Person> {
    vec![
        applicant(JOHN, "John", 35, MaritalStatus::Single),
        applicant(SARAH, "Sarah", 40, MaritalStatus::Married),
        applicant(GRACE, "Grace", 37, MaritalStatus::Married),
        applicant(JAMES, "James", 30, MaritalStatus::Married),
        applicant(RACHEL, "Rachel", 25, MaritalStatus::Single),
        officer(DANIEL, "Daniel", 36, MaritalStatus::Single),
        officer(EMILY, "Emily", 28, MaritalStatus::Single),
        manager(MICHAEL, "Michael", 36, MaritalStatus::Single),
        manager(JESSICA, "Jessica", 26, MaritalStatus::Married),
    ]
}

pub(super) fn projects() -> Vec<Project> {
    vec![
        project(ACACIA, MICHAEL, ProjectInventory::new(2, 3, 3)),
        project(BIRCH, JESSICA, ProjectInventory::new(5, 5, 2)),
        project(CEDAR, MICHAEL, ProjectInventory::new(1, 0, 1)),
        project(DAHLIA, MICHAEL, ProjectInventory::new(4, 4, 0)),
    ]
}

pub(super) fn snapshot() -> AllocationSnapshot {
    AllocationSnapshot {
        people: people(),
        projects: projects(),
        ..AllocationSnapshot::default()
    }
}

pub(super) fn build_service() -> AllocationService {
    service_from(snapshot())
}

pub(super) fn service_from(snapshot: AllocationSnapshot) -> AllocationService {
    let repositories = Repositories::from_snapshot(snapshot).expect("seed repositories");
    AllocationService::new(repositories, EligibilityPolicy::default()).expect("service builds")
}

/// Register and approve `officer` for `project`.
pub(super) fn assign_officer(service: &AllocationService, officer: &str, project: &str) {
    service
        .request_assignment(&pid(officer), &prj(project))
        .expect("registration filed");
    let owner = service.project(&prj(project)).expect("project").manager_id;
    service
        .decide_assignment(&owner, &pid(officer), true)
        .expect("registration decided");
}

/// Submit and approve an application, returning it in SUCCESSFUL state.
pub(super) fn successful_application(
    service: &AllocationService,
    applicant: &str,
    project: &str,
    flat_type: FlatType,
) -> Application {
    let application = service
        .submit_application(&pid(applicant), &prj(project), flat_type, today())
        .expect("submission accepted");
    let owner = service.project(&prj(project)).expect("project").manager_id;
    service
        .decide_application(&owner, &application.id, true)
        .expect("decision recorded")
}

pub(super) fn units(service: &AllocationService, project: &str, flat_type: FlatType) -> u32 {
    service
        .project(&prj(project))
        .expect("project present")
        .units_available(flat_type)
}

pub(super) fn router_with_service(service: AllocationService) -> axum::Router {
    allocation_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
