use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{Application, FlatType, MaritalStatus, Person, Project};

/// Age thresholds applied by the eligibility rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    pub married_min_age: u8,
    pub single_min_age: u8,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            married_min_age: 21,
            single_min_age: 35,
        }
    }
}

impl EligibilityPolicy {
    /// Flat types the person's age and marital status qualify for, ignoring supply.
    pub fn qualifying_flat_types(&self, person: &Person) -> &'static [FlatType] {
        match person.marital_status {
            MaritalStatus::Married if person.age >= self.married_min_age => {
                &[FlatType::TwoRoom, FlatType::ThreeRoom]
            }
            MaritalStatus::Single if person.age >= self.single_min_age => &[FlatType::TwoRoom],
            _ => &[],
        }
    }

    /// Flat types `applicant` may apply for in `project` right now.
    ///
    /// `history` is the applicant's own applications; it only matters for the visibility
    /// exception on hidden projects. The result reflects current supply and is never cached.
    pub fn eligible_flat_types(
        &self,
        applicant: &Person,
        project: &Project,
        history: &[Application],
    ) -> BTreeSet<FlatType> {
        if !is_visible_to(applicant, project, history) {
            return BTreeSet::new();
        }

        self.qualifying_flat_types(applicant)
            .iter()
            .copied()
            .filter(|flat_type| project.units_available(*flat_type) > 0)
            .collect()
    }
}

/// Whether `viewer` can see `project`.
///
/// Hidden projects stay visible to applicants with an active or booked application for them,
/// to the officer handling them, and to the owning manager.
pub fn is_visible_to(viewer: &Person, project: &Project, history: &[Application]) -> bool {
    project.visible
        || viewer.owns(project)
        || viewer.handles(&project.id)
        || history.iter().any(|application| {
            application.applicant_id == viewer.id
                && application.project_id == project.id
                && application.status.is_active()
        })
}
