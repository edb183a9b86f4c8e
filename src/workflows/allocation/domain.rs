use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::inventory::ProjectInventory;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// National identity number of a person; unique across every role.
    PersonId
);
string_id!(
    /// Identifier of a housing project.
    ProjectId
);
string_id!(
    /// Identifier wrapper for submitted applications.
    ApplicationId
);
string_id!(EnquiryId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
}

impl MaritalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatType {
    TwoRoom,
    ThreeRoom,
}

impl FlatType {
    pub const fn ordered() -> [Self; 2] {
        [Self::TwoRoom, Self::ThreeRoom]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TwoRoom => "2-Room",
            Self::ThreeRoom => "3-Room",
        }
    }
}

impl fmt::Display for FlatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress of an officer's request to administer a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Unassigned,
    Pending,
    Approved,
    Rejected,
}

impl AssignmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Project references held by an officer. At most one of `pending_project` and
/// `handling_project` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaffAssignment {
    pub pending_project: Option<ProjectId>,
    pub handling_project: Option<ProjectId>,
    pub status: AssignmentStatus,
}

impl StaffAssignment {
    pub fn is_engaged(&self) -> bool {
        self.pending_project.is_some() || self.handling_project.is_some()
    }

    pub fn handles(&self, project_id: &ProjectId) -> bool {
        self.handling_project.as_ref() == Some(project_id)
    }

    pub fn involves(&self, project_id: &ProjectId) -> bool {
        self.handles(project_id) || self.pending_project.as_ref() == Some(project_id)
    }
}

/// Capabilities attached to a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Applicant,
    Officer(StaffAssignment),
    Manager,
}

impl Role {
    pub const fn label(&self) -> &'static str {
        match self {
            Role::Applicant => "applicant",
            Role::Officer(_) => "officer",
            Role::Manager => "manager",
        }
    }
}

/// A unit the applicant has been allocated. Project and flat type are always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub project_id: ProjectId,
    pub flat_type: FlatType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    #[serde(skip_serializing, default)]
    pub credential: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub role: Role,
    /// Declared monthly income. Informational; no allocation rule reads it.
    pub income: u32,
    /// Project of the applicant's latest submission, cleared once it becomes unsuccessful.
    pub candidate_project: Option<ProjectId>,
    pub booking: Option<Booking>,
}

impl Person {
    pub fn new(
        id: impl Into<PersonId>,
        name: impl Into<String>,
        age: u8,
        marital_status: MaritalStatus,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            credential: "password".to_string(),
            age,
            marital_status,
            role,
            income: 0,
            candidate_project: None,
            booking: None,
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self.role, Role::Manager)
    }

    pub fn assignment(&self) -> Option<&StaffAssignment> {
        match &self.role {
            Role::Officer(assignment) => Some(assignment),
            _ => None,
        }
    }

    pub fn assignment_mut(&mut self) -> Option<&mut StaffAssignment> {
        match &mut self.role {
            Role::Officer(assignment) => Some(assignment),
            _ => None,
        }
    }

    pub fn handles(&self, project_id: &ProjectId) -> bool {
        self.assignment()
            .map(|assignment| assignment.handles(project_id))
            .unwrap_or(false)
    }

    pub fn owns(&self, project: &Project) -> bool {
        self.is_manager() && project.manager_id == self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub neighborhood: String,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    pub visible: bool,
    pub manager_id: PersonId,
    pub inventory: ProjectInventory,
}

impl Project {
    pub fn units_available(&self, flat_type: FlatType) -> u32 {
        self.inventory.units_available(flat_type)
    }
}

/// Fields a manager supplies when opening a new project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub id: ProjectId,
    pub name: String,
    pub neighborhood: String,
    pub opening_date: NaiveDate,
    pub closing_date: NaiveDate,
    #[serde(default)]
    pub visible: bool,
    pub two_room_units: u32,
    pub three_room_units: u32,
    pub staff_slots: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Successful,
    Unsuccessful,
    Booked,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Successful => "successful",
            Self::Unsuccessful => "unsuccessful",
            Self::Booked => "booked",
        }
    }

    /// Statuses that count against the one-application-per-applicant limit.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Unsuccessful)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_id: PersonId,
    pub project_id: ProjectId,
    pub submitted_on: NaiveDate,
    pub flat_type: FlatType,
    pub status: ApplicationStatus,
    pub withdrawal_requested: bool,
}

impl Application {
    /// A booked application holds one unit of its flat type.
    pub fn holds_unit(&self) -> bool {
        self.status == ApplicationStatus::Booked
    }
}

/// Read-only projection of a successful or booked application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub application_id: ApplicationId,
    pub applicant_id: PersonId,
    pub applicant_name: String,
    pub age: u8,
    pub marital_status: MaritalStatus,
    pub project_id: ProjectId,
    pub project_name: String,
    pub neighborhood: String,
    pub flat_type: FlatType,
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    Pending,
    Replied,
}

impl EnquiryStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Replied => "replied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enquiry {
    pub id: EnquiryId,
    pub project_id: ProjectId,
    pub applicant_id: PersonId,
    pub message: String,
    pub response: Option<String>,
    pub responder_id: Option<PersonId>,
    pub status: EnquiryStatus,
}
