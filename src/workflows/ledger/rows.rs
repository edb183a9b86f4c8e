use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::workflows::allocation::{
    Application, ApplicationId, ApplicationStatus, AssignmentStatus, Booking, Enquiry, EnquiryId,
    EnquiryStatus, FlatType, InventoryCounter, MaritalStatus, Person, PersonId, Project,
    ProjectId, ProjectInventory, Role, StaffAssignment,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RoleKind {
    Applicant,
    Officer,
    Manager,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersonRow {
    #[serde(deserialize_with = "trimmed")]
    id: String,
    name: String,
    credential: String,
    age: u8,
    marital_status: MaritalStatus,
    role: RoleKind,
    #[serde(default)]
    income: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    candidate_project: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    booked_project: Option<String>,
    #[serde(default)]
    booked_flat_type: Option<FlatType>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pending_project: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    handling_project: Option<String>,
    #[serde(default)]
    assignment_status: Option<AssignmentStatus>,
}

impl From<&Person> for PersonRow {
    fn from(person: &Person) -> Self {
        let (role, assignment) = match &person.role {
            Role::Applicant => (RoleKind::Applicant, None),
            Role::Officer(assignment) => (RoleKind::Officer, Some(assignment)),
            Role::Manager => (RoleKind::Manager, None),
        };

        Self {
            id: person.id.to_string(),
            name: person.name.clone(),
            credential: person.credential.clone(),
            age: person.age,
            marital_status: person.marital_status,
            role,
            income: person.income,
            candidate_project: person.candidate_project.as_ref().map(ToString::to_string),
            booked_project: person
                .booking
                .as_ref()
                .map(|booking| booking.project_id.to_string()),
            booked_flat_type: person.booking.as_ref().map(|booking| booking.flat_type),
            pending_project: assignment
                .and_then(|assignment| assignment.pending_project.as_ref())
                .map(ToString::to_string),
            handling_project: assignment
                .and_then(|assignment| assignment.handling_project.as_ref())
                .map(ToString::to_string),
            assignment_status: assignment.map(|assignment| assignment.status),
        }
    }
}

impl PersonRow {
    pub(crate) fn into_person(self) -> Result<Person, String> {
        let role = match self.role {
            RoleKind::Applicant | RoleKind::Manager => {
                if self.pending_project.is_some() || self.handling_project.is_some() {
                    return Err(format!(
                        "{} is not an officer but carries a project registration",
                        self.id
                    ));
                }
                if self.role == RoleKind::Manager {
                    Role::Manager
                } else {
                    Role::Applicant
                }
            }
            RoleKind::Officer => Role::Officer(self.assignment()?),
        };

        let booking = match (self.booked_project, self.booked_flat_type) {
            (Some(project), Some(flat_type)) => Some(Booking {
                project_id: ProjectId(project),
                flat_type,
            }),
            (None, None) => None,
            _ => {
                return Err(format!(
                    "{} must set both booked_project and booked_flat_type or neither",
                    self.id
                ))
            }
        };

        Ok(Person {
            id: PersonId(self.id),
            name: self.name,
            credential: self.credential,
            age: self.age,
            marital_status: self.marital_status,
            role,
            income: self.income,
            candidate_project: self.candidate_project.map(ProjectId),
            booking,
        })
    }

    fn assignment(&self) -> Result<StaffAssignment, String> {
        let status = self.assignment_status.unwrap_or_default();
        let consistent = match (&self.pending_project, &self.handling_project) {
            (Some(_), Some(_)) => false,
            (Some(_), None) => status == AssignmentStatus::Pending,
            (None, Some(_)) => status == AssignmentStatus::Approved,
            (None, None) => !matches!(
                status,
                AssignmentStatus::Pending | AssignmentStatus::Approved
            ),
        };
        if !consistent {
            return Err(format!(
                "officer {} has registration status {} inconsistent with its project references",
                self.id,
                status.label()
            ));
        }

        Ok(StaffAssignment {
            pending_project: self.pending_project.clone().map(ProjectId),
            handling_project: self.handling_project.clone().map(ProjectId),
            status,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProjectRow {
    #[serde(deserialize_with = "trimmed")]
    id: String,
    name: String,
    neighborhood: String,
    opening_date: NaiveDate,
    closing_date: NaiveDate,
    visible: bool,
    #[serde(deserialize_with = "trimmed")]
    manager_id: String,
    two_room_available: u32,
    two_room_capacity: u32,
    three_room_available: u32,
    three_room_capacity: u32,
    staff_slots_available: u32,
    staff_slots_capacity: u32,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        let inventory = &project.inventory;
        let two_room = inventory.counter(InventoryCounter::Units(FlatType::TwoRoom));
        let three_room = inventory.counter(InventoryCounter::Units(FlatType::ThreeRoom));
        let staff_slots = inventory.counter(InventoryCounter::StaffSlots);

        Self {
            id: project.id.to_string(),
            name: project.name.clone(),
            neighborhood: project.neighborhood.clone(),
            opening_date: project.opening_date,
            closing_date: project.closing_date,
            visible: project.visible,
            manager_id: project.manager_id.to_string(),
            two_room_available: two_room.available(),
            two_room_capacity: two_room.capacity(),
            three_room_available: three_room.available(),
            three_room_capacity: three_room.capacity(),
            staff_slots_available: staff_slots.available(),
            staff_slots_capacity: staff_slots.capacity(),
        }
    }
}

impl ProjectRow {
    pub(crate) fn into_project(self) -> Result<Project, String> {
        if self.closing_date < self.opening_date {
            return Err(format!("project {} closes before it opens", self.id));
        }

        let inventory = ProjectInventory::restore(
            (self.two_room_available, self.two_room_capacity),
            (self.three_room_available, self.three_room_capacity),
            (self.staff_slots_available, self.staff_slots_capacity),
        )
        .map_err(|err| format!("project {}: {err}", self.id))?;

        Ok(Project {
            id: ProjectId(self.id),
            name: self.name,
            neighborhood: self.neighborhood,
            opening_date: self.opening_date,
            closing_date: self.closing_date,
            visible: self.visible,
            manager_id: PersonId(self.manager_id),
            inventory,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApplicationRow {
    #[serde(deserialize_with = "trimmed")]
    id: String,
    #[serde(deserialize_with = "trimmed")]
    applicant_id: String,
    #[serde(deserialize_with = "trimmed")]
    project_id: String,
    submitted_on: NaiveDate,
    flat_type: FlatType,
    status: ApplicationStatus,
    #[serde(default)]
    withdrawal_requested: bool,
}

impl From<&Application> for ApplicationRow {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id.to_string(),
            applicant_id: application.applicant_id.to_string(),
            project_id: application.project_id.to_string(),
            submitted_on: application.submitted_on,
            flat_type: application.flat_type,
            status: application.status,
            withdrawal_requested: application.withdrawal_requested,
        }
    }
}

impl ApplicationRow {
    pub(crate) fn into_application(self) -> Result<Application, String> {
        if self.withdrawal_requested && !self.status.is_active() {
            return Err(format!(
                "application {} is unsuccessful but still flagged for withdrawal",
                self.id
            ));
        }

        Ok(Application {
            id: ApplicationId(self.id),
            applicant_id: PersonId(self.applicant_id),
            project_id: ProjectId(self.project_id),
            submitted_on: self.submitted_on,
            flat_type: self.flat_type,
            status: self.status,
            withdrawal_requested: self.withdrawal_requested,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EnquiryRow {
    #[serde(deserialize_with = "trimmed")]
    id: String,
    #[serde(deserialize_with = "trimmed")]
    project_id: String,
    #[serde(deserialize_with = "trimmed")]
    applicant_id: String,
    message: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    response: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    responder_id: Option<String>,
    status: EnquiryStatus,
}

impl From<&Enquiry> for EnquiryRow {
    fn from(enquiry: &Enquiry) -> Self {
        Self {
            id: enquiry.id.to_string(),
            project_id: enquiry.project_id.to_string(),
            applicant_id: enquiry.applicant_id.to_string(),
            message: enquiry.message.clone(),
            response: enquiry.response.clone(),
            responder_id: enquiry.responder_id.as_ref().map(ToString::to_string),
            status: enquiry.status,
        }
    }
}

impl EnquiryRow {
    pub(crate) fn into_enquiry(self) -> Result<Enquiry, String> {
        let answered = self.response.is_some() && self.responder_id.is_some();
        let expected = if answered {
            EnquiryStatus::Replied
        } else {
            EnquiryStatus::Pending
        };
        if self.status != expected
            || (!answered && (self.response.is_some() || self.responder_id.is_some()))
        {
            return Err(format!(
                "enquiry {} status does not match its response fields",
                self.id
            ));
        }

        Ok(Enquiry {
            id: EnquiryId(self.id),
            project_id: ProjectId(self.project_id),
            applicant_id: PersonId(self.applicant_id),
            message: self.message,
            response: self.response,
            responder_id: self.responder_id.map(PersonId),
            status: self.status,
        })
    }
}

/// Identifier columns tolerate padding; free-text columns are kept verbatim.
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
