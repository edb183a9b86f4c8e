use chrono::NaiveDate;

use crate::workflows::allocation::{
    AllocationSnapshot, MaritalStatus, Person, PersonId, Project, ProjectId, ProjectInventory,
    Role, StaffAssignment,
};

struct SampleProject {
    id: &'static str,
    name: &'static str,
    neighborhood: &'static str,
    manager: &'static str,
    opening: (i32, u32, u32),
    closing: (i32, u32, u32),
    units: (u32, u32),
    staff_slots: u32,
}

const APPLICANTS: [(&str, &str, u8, MaritalStatus); 5] = [
    ("S1234567A", "John", 35, MaritalStatus::Single),
    ("T7654321B", "Sarah", 40, MaritalStatus::Married),
    ("S9876543C", "Grace", 37, MaritalStatus::Married),
    ("T2345678D", "James", 30, MaritalStatus::Married),
    ("S3456789E", "Rachel", 25, MaritalStatus::Single),
];

const OFFICERS: [(&str, &str, u8, MaritalStatus); 3] = [
    ("T2109876H", "Daniel", 36, MaritalStatus::Single),
    ("S6543210I", "Emily", 28, MaritalStatus::Single),
    ("T1234567J", "David", 29, MaritalStatus::Married),
];

const MANAGERS: [(&str, &str, u8, MaritalStatus); 2] = [
    ("T8765432F", "Michael", 36, MaritalStatus::Single),
    ("S5678901G", "Jessica", 26, MaritalStatus::Married),
];

const PROJECTS: [SampleProject; 3] = [
    SampleProject {
        id: "acacia-breeze",
        name: "Acacia Breeze",
        neighborhood: "Yishun",
        manager: "T8765432F",
        opening: (2025, 2, 15),
        closing: (2025, 3, 20),
        units: (2, 3),
        staff_slots: 3,
    },
    SampleProject {
        id: "birch-heights",
        name: "Birch Heights",
        neighborhood: "Boon Lay",
        manager: "S5678901G",
        opening: (2025, 3, 1),
        closing: (2025, 4, 30),
        units: (40, 25),
        staff_slots: 10,
    },
    SampleProject {
        id: "cedar-grove",
        name: "Cedar Grove",
        neighborhood: "Tampines",
        manager: "T8765432F",
        opening: (2025, 1, 10),
        closing: (2025, 2, 28),
        units: (1, 0),
        staff_slots: 1,
    },
];

fn date((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// Seed data used when no ledger exists yet: applicants, officers, two managers and three
/// open projects, with no applications or enquiries.
pub fn sample_snapshot() -> AllocationSnapshot {
    let people = APPLICANTS
        .iter()
        .map(|&(id, name, age, status)| Person::new(id, name, age, status, Role::Applicant))
        .chain(OFFICERS.iter().map(|&(id, name, age, status)| {
            Person::new(
                id,
                name,
                age,
                status,
                Role::Officer(StaffAssignment::default()),
            )
        }))
        .chain(
            MANAGERS
                .iter()
                .map(|&(id, name, age, status)| Person::new(id, name, age, status, Role::Manager)),
        )
        .collect();

    let projects = PROJECTS
        .iter()
        .map(|sample| Project {
            id: ProjectId::from(sample.id),
            name: sample.name.to_string(),
            neighborhood: sample.neighborhood.to_string(),
            opening_date: date(sample.opening),
            closing_date: date(sample.closing),
            visible: true,
            manager_id: PersonId::from(sample.manager),
            inventory: ProjectInventory::new(sample.units.0, sample.units.1, sample.staff_slots),
        })
        .collect();

    AllocationSnapshot {
        people,
        projects,
        ..AllocationSnapshot::default()
    }
}
