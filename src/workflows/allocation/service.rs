use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use tracing::{debug, info};

use super::domain::{
    Application, ApplicationId, AssignmentStatus, Enquiry, EnquiryId, EnquiryStatus, FlatType,
    Person, PersonId, Project, ProjectDraft, ProjectId, Receipt,
};
use super::eligibility::{is_visible_to, EligibilityPolicy};
use super::error::AllocationError;
use super::inventory::ProjectInventory;
use super::repository::{Record, Repository};
use super::store::{Change, ChangeSet, Repositories};
use super::withdrawal::WithdrawalOutcome;
use super::{enquiry, lifecycle, staffing, withdrawal};

/// Monotonic `prefix-000001` style identifiers that resume after previously issued ones.
struct IdSequence {
    prefix: &'static str,
    next: AtomicU64,
}

impl IdSequence {
    fn resume<'a>(prefix: &'static str, existing: impl Iterator<Item = &'a str>) -> Self {
        let highest = existing
            .filter_map(|id| id.strip_prefix(prefix)?.strip_prefix('-')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            prefix,
            next: AtomicU64::new(highest + 1),
        }
    }

    fn next(&self) -> String {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{id:06}", self.prefix)
    }
}

fn fetch<E: Record>(repository: &dyn Repository<E>, id: &E::Id) -> Result<E, AllocationError> {
    repository
        .get(id)?
        .ok_or_else(|| AllocationError::NotFound {
            kind: E::KIND,
            id: id.to_string(),
        })
}

fn traced<T>(
    operation: &'static str,
    result: Result<T, AllocationError>,
) -> Result<T, AllocationError> {
    if let Err(err) = &result {
        debug!(operation, error = %err, "allocation request rejected");
    }
    result
}

/// Service composing the repositories, eligibility policy, and workflow state machines.
///
/// Every mutating call holds the ledger lock from its first read to its last write, so
/// decisions, bookings, and withdrawals never interleave. Reads take no lock.
pub struct AllocationService {
    store: Repositories,
    policy: EligibilityPolicy,
    ledger: Mutex<()>,
    application_ids: IdSequence,
    enquiry_ids: IdSequence,
}

impl AllocationService {
    pub fn new(store: Repositories, policy: EligibilityPolicy) -> Result<Self, AllocationError> {
        let applications = store.applications.all()?;
        let enquiries = store.enquiries.all()?;

        let application_ids = IdSequence::resume(
            "app",
            applications.iter().map(|application| application.id.as_str()),
        );
        let enquiry_ids =
            IdSequence::resume("enq", enquiries.iter().map(|enquiry| enquiry.id.as_str()));

        Ok(Self {
            store,
            policy,
            ledger: Mutex::new(()),
            application_ids,
            enquiry_ids,
        })
    }

    pub fn store(&self) -> &Repositories {
        &self.store
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    fn serialize(&self) -> MutexGuard<'_, ()> {
        // Workflows never write before their checks pass, so a poisoned guard protects
        // nothing half-done.
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn person(&self, id: &PersonId) -> Result<Person, AllocationError> {
        fetch(self.store.people.as_ref(), id)
    }

    pub fn project(&self, id: &ProjectId) -> Result<Project, AllocationError> {
        fetch(self.store.projects.as_ref(), id)
    }

    pub fn application(&self, id: &ApplicationId) -> Result<Application, AllocationError> {
        fetch(self.store.applications.as_ref(), id)
    }

    pub fn enquiry(&self, id: &EnquiryId) -> Result<Enquiry, AllocationError> {
        fetch(self.store.enquiries.as_ref(), id)
    }

    fn applications_of(&self, applicant: &PersonId) -> Result<Vec<Application>, AllocationError> {
        Ok(self
            .store
            .applications
            .all()?
            .into_iter()
            .filter(|application| &application.applicant_id == applicant)
            .collect())
    }

    /// The applicant's PENDING, SUCCESSFUL or BOOKED application, if any.
    pub fn active_application(
        &self,
        applicant: &PersonId,
    ) -> Result<Option<Application>, AllocationError> {
        Ok(self
            .applications_of(applicant)?
            .into_iter()
            .find(|application| application.status.is_active()))
    }

    pub fn applications_for_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Application>, AllocationError> {
        Ok(self
            .store
            .applications
            .all()?
            .into_iter()
            .filter(|application| &application.project_id == project)
            .collect())
    }

    /// Projects the viewer is allowed to see, in insertion order.
    pub fn visible_projects(&self, viewer: &PersonId) -> Result<Vec<Project>, AllocationError> {
        let viewer = self.person(viewer)?;
        let history = self.applications_of(&viewer.id)?;
        Ok(self
            .store
            .projects
            .all()?
            .into_iter()
            .filter(|project| is_visible_to(&viewer, project, &history))
            .collect())
    }

    pub fn eligible_flat_types(
        &self,
        applicant: &PersonId,
        project: &ProjectId,
    ) -> Result<BTreeSet<FlatType>, AllocationError> {
        let applicant = self.person(applicant)?;
        let project = self.project(project)?;
        let history = self.applications_of(&applicant.id)?;
        Ok(self
            .policy
            .eligible_flat_types(&applicant, &project, &history))
    }

    pub fn create_project(
        &self,
        manager: &PersonId,
        draft: ProjectDraft,
    ) -> Result<Project, AllocationError> {
        let _ledger = self.serialize();
        traced("create_project", self.create_project_locked(manager, draft))
    }

    fn create_project_locked(
        &self,
        manager: &PersonId,
        draft: ProjectDraft,
    ) -> Result<Project, AllocationError> {
        let manager = self.person(manager)?;
        if !manager.is_manager() {
            return Err(AllocationError::not_permitted(&manager.id, "create projects"));
        }

        let project = Project {
            id: draft.id,
            name: draft.name,
            neighborhood: draft.neighborhood,
            opening_date: draft.opening_date,
            closing_date: draft.closing_date,
            visible: draft.visible,
            manager_id: manager.id.clone(),
            inventory: ProjectInventory::new(
                draft.two_room_units,
                draft.three_room_units,
                draft.staff_slots,
            ),
        };

        self.store.commit(vec![Change::NewProject(project.clone())])?;
        info!(project = %project.id, manager = %manager.id, "project created");
        Ok(project)
    }

    pub fn set_visibility(
        &self,
        manager: &PersonId,
        project: &ProjectId,
        visible: bool,
    ) -> Result<Project, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "set_visibility",
            self.set_visibility_locked(manager, project, visible),
        )
    }

    fn set_visibility_locked(
        &self,
        manager: &PersonId,
        project: &ProjectId,
        visible: bool,
    ) -> Result<Project, AllocationError> {
        let manager = self.person(manager)?;
        let before = self.project(project)?;
        lifecycle::ensure_owner(&manager, &before, "change visibility of")?;

        let mut after = before.clone();
        after.visible = visible;
        self.store.commit(
            ChangeSet::default()
                .project(before, after.clone())
                .into_changes(),
        )?;
        info!(project = %after.id, visible, "project visibility changed");
        Ok(after)
    }

    pub fn submit_application(
        &self,
        applicant: &PersonId,
        project: &ProjectId,
        flat_type: FlatType,
        today: NaiveDate,
    ) -> Result<Application, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "submit_application",
            self.submit_locked(applicant, project, flat_type, today),
        )
    }

    fn submit_locked(
        &self,
        applicant: &PersonId,
        project: &ProjectId,
        flat_type: FlatType,
        today: NaiveDate,
    ) -> Result<Application, AllocationError> {
        let before = self.person(applicant)?;
        let project = self.project(project)?;
        let applications = self.store.applications.all()?;

        let mut after = before.clone();
        let application = lifecycle::submit(
            &self.policy,
            &mut after,
            &project,
            flat_type,
            &applications,
            || ApplicationId(self.application_ids.next()),
            today,
        )?;

        self.store.commit(
            ChangeSet::default()
                .push(Change::NewApplication(application.clone()))
                .person(before, after)
                .into_changes(),
        )?;
        info!(
            application = %application.id,
            applicant = %application.applicant_id,
            project = %application.project_id,
            flat_type = %application.flat_type,
            "application submitted"
        );
        Ok(application)
    }

    pub fn decide_application(
        &self,
        manager: &PersonId,
        application: &ApplicationId,
        approve: bool,
    ) -> Result<Application, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "decide_application",
            self.decide_application_locked(manager, application, approve),
        )
    }

    fn decide_application_locked(
        &self,
        manager: &PersonId,
        application: &ApplicationId,
        approve: bool,
    ) -> Result<Application, AllocationError> {
        let manager = self.person(manager)?;
        let application_before = self.application(application)?;
        let applicant_before = self.person(&application_before.applicant_id)?;
        let project = self.project(&application_before.project_id)?;

        let mut application_after = application_before.clone();
        let mut applicant_after = applicant_before.clone();
        let status = lifecycle::decide(
            &manager,
            &mut applicant_after,
            &mut application_after,
            &project,
            approve,
        )?;

        self.store.commit(
            ChangeSet::default()
                .application(application_before, application_after.clone())
                .person(applicant_before, applicant_after)
                .into_changes(),
        )?;
        info!(
            application = %application_after.id,
            manager = %manager.id,
            approve,
            %status,
            "application decided"
        );
        Ok(application_after)
    }

    /// Book a unit for the applicant's successful application and return its receipt.
    pub fn book(
        &self,
        officer: &PersonId,
        applicant: &PersonId,
        flat_type: FlatType,
    ) -> Result<Receipt, AllocationError> {
        let _ledger = self.serialize();
        traced("book", self.book_locked(officer, applicant, flat_type))
    }

    fn book_locked(
        &self,
        officer: &PersonId,
        applicant: &PersonId,
        flat_type: FlatType,
    ) -> Result<Receipt, AllocationError> {
        let officer = self.person(officer)?;
        let applicant_before = self.person(applicant)?;
        let application_before =
            self.active_application(applicant)?
                .ok_or_else(|| AllocationError::NotFound {
                    kind: "active application",
                    id: applicant.to_string(),
                })?;
        let project_before = self.project(&application_before.project_id)?;

        let mut applicant_after = applicant_before.clone();
        let mut application_after = application_before.clone();
        let mut project_after = project_before.clone();
        lifecycle::book(
            &officer,
            &mut applicant_after,
            &mut application_after,
            &mut project_after,
            flat_type,
        )?;
        let receipt = lifecycle::receipt(&application_after, &applicant_after, &project_after)?;

        self.store.commit(
            ChangeSet::default()
                .project(project_before, project_after.clone())
                .application(application_before, application_after.clone())
                .person(applicant_before, applicant_after)
                .into_changes(),
        )?;
        info!(
            application = %application_after.id,
            officer = %officer.id,
            project = %project_after.id,
            %flat_type,
            remaining = project_after.units_available(flat_type),
            "flat booked"
        );
        Ok(receipt)
    }

    pub fn receipt(&self, application: &ApplicationId) -> Result<Receipt, AllocationError> {
        let application = self.application(application)?;
        let applicant = self.person(&application.applicant_id)?;
        let project = self.project(&application.project_id)?;
        traced(
            "receipt",
            lifecycle::receipt(&application, &applicant, &project),
        )
    }

    pub fn request_assignment(
        &self,
        officer: &PersonId,
        project: &ProjectId,
    ) -> Result<Person, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "request_assignment",
            self.request_assignment_locked(officer, project),
        )
    }

    fn request_assignment_locked(
        &self,
        officer: &PersonId,
        project: &ProjectId,
    ) -> Result<Person, AllocationError> {
        let before = self.person(officer)?;
        let project = self.project(project)?;
        let history = self.applications_of(officer)?;

        let mut after = before.clone();
        staffing::request_assignment(&mut after, &project, &history)?;

        self.store
            .commit(ChangeSet::default().person(before, after.clone()).into_changes())?;
        info!(officer = %after.id, project = %project.id, "officer registration requested");
        Ok(after)
    }

    pub fn decide_assignment(
        &self,
        manager: &PersonId,
        officer: &PersonId,
        approve: bool,
    ) -> Result<Person, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "decide_assignment",
            self.decide_assignment_locked(manager, officer, approve),
        )
    }

    fn decide_assignment_locked(
        &self,
        manager: &PersonId,
        officer: &PersonId,
        approve: bool,
    ) -> Result<Person, AllocationError> {
        let manager = self.person(manager)?;
        let officer_before = self.person(officer)?;
        let pending = officer_before
            .assignment()
            .and_then(|assignment| assignment.pending_project.clone())
            .ok_or_else(|| {
                AllocationError::invalid_state(
                    "officer",
                    &officer_before.id,
                    "decide registration for",
                    "no pending registration",
                )
            })?;
        let project_before = self.project(&pending)?;

        let mut officer_after = officer_before.clone();
        let mut project_after = project_before.clone();
        let status = staffing::decide_assignment(
            &manager,
            &mut officer_after,
            &mut project_after,
            approve,
        )?;

        self.store.commit(
            ChangeSet::default()
                .project(project_before, project_after.clone())
                .person(officer_before, officer_after.clone())
                .into_changes(),
        )?;
        info!(
            officer = %officer_after.id,
            project = %project_after.id,
            approved = status == AssignmentStatus::Approved,
            staff_slots = project_after.inventory.staff_slots(),
            "officer registration decided"
        );
        Ok(officer_after)
    }

    pub fn request_withdrawal(&self, applicant: &PersonId) -> Result<Application, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "request_withdrawal",
            self.request_withdrawal_locked(applicant),
        )
    }

    fn request_withdrawal_locked(
        &self,
        applicant: &PersonId,
    ) -> Result<Application, AllocationError> {
        self.person(applicant)?;
        let before = self
            .active_application(applicant)?
            .ok_or_else(|| AllocationError::NotFound {
                kind: "active application",
                id: applicant.to_string(),
            })?;

        let mut after = before.clone();
        withdrawal::request_withdrawal(&mut after)?;

        self.store
            .commit(ChangeSet::default().application(before, after.clone()).into_changes())?;
        info!(application = %after.id, applicant = %applicant, "withdrawal requested");
        Ok(after)
    }

    pub fn decide_withdrawal(
        &self,
        manager: &PersonId,
        application: &ApplicationId,
        approve: bool,
    ) -> Result<WithdrawalOutcome, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "decide_withdrawal",
            self.decide_withdrawal_locked(manager, application, approve),
        )
    }

    fn decide_withdrawal_locked(
        &self,
        manager: &PersonId,
        application: &ApplicationId,
        approve: bool,
    ) -> Result<WithdrawalOutcome, AllocationError> {
        let manager = self.person(manager)?;
        let application_before = self.application(application)?;
        let applicant_before = self.person(&application_before.applicant_id)?;
        let project_before = self.project(&application_before.project_id)?;

        let mut application_after = application_before.clone();
        let mut applicant_after = applicant_before.clone();
        let mut project_after = project_before.clone();
        let outcome = withdrawal::decide_withdrawal(
            &manager,
            &mut applicant_after,
            &mut application_after,
            &mut project_after,
            approve,
        )?;

        self.store.commit(
            ChangeSet::default()
                .project(project_before, project_after)
                .application(application_before, application_after.clone())
                .person(applicant_before, applicant_after)
                .into_changes(),
        )?;
        info!(
            application = %application_after.id,
            manager = %manager.id,
            approved = outcome.approved,
            unit_released = outcome.unit_released,
            "withdrawal decided"
        );
        Ok(outcome)
    }

    pub fn submit_enquiry(
        &self,
        applicant: &PersonId,
        project: &ProjectId,
        message: String,
    ) -> Result<Enquiry, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "submit_enquiry",
            self.submit_enquiry_locked(applicant, project, message),
        )
    }

    fn submit_enquiry_locked(
        &self,
        applicant: &PersonId,
        project: &ProjectId,
        message: String,
    ) -> Result<Enquiry, AllocationError> {
        let applicant = self.person(applicant)?;
        let project = self.project(project)?;
        let history = self.applications_of(&applicant.id)?;
        if !is_visible_to(&applicant, &project, &history) {
            return Err(AllocationError::not_permitted(
                &applicant.id,
                format!("enquire about {}", project.id),
            ));
        }
        enquiry::ensure_text("message", &message)?;

        let enquiry = Enquiry {
            id: EnquiryId(self.enquiry_ids.next()),
            project_id: project.id.clone(),
            applicant_id: applicant.id.clone(),
            message,
            response: None,
            responder_id: None,
            status: EnquiryStatus::Pending,
        };

        self.store.commit(vec![Change::NewEnquiry(enquiry.clone())])?;
        info!(enquiry = %enquiry.id, project = %enquiry.project_id, "enquiry submitted");
        Ok(enquiry)
    }

    pub fn edit_enquiry(
        &self,
        author: &PersonId,
        enquiry: &EnquiryId,
        message: String,
    ) -> Result<Enquiry, AllocationError> {
        let _ledger = self.serialize();
        traced("edit_enquiry", self.edit_enquiry_locked(author, enquiry, message))
    }

    fn edit_enquiry_locked(
        &self,
        author: &PersonId,
        enquiry: &EnquiryId,
        message: String,
    ) -> Result<Enquiry, AllocationError> {
        let author = self.person(author)?;
        let before = self.enquiry(enquiry)?;

        let mut after = before.clone();
        enquiry::edit(&author, &mut after, message)?;

        self.store
            .commit(ChangeSet::default().enquiry(before, after.clone()).into_changes())?;
        info!(enquiry = %after.id, "enquiry edited");
        Ok(after)
    }

    pub fn delete_enquiry(
        &self,
        author: &PersonId,
        enquiry: &EnquiryId,
    ) -> Result<Enquiry, AllocationError> {
        let _ledger = self.serialize();
        traced("delete_enquiry", self.delete_enquiry_locked(author, enquiry))
    }

    fn delete_enquiry_locked(
        &self,
        author: &PersonId,
        enquiry: &EnquiryId,
    ) -> Result<Enquiry, AllocationError> {
        let author = self.person(author)?;
        let existing = self.enquiry(enquiry)?;
        enquiry::ensure_deletable(&author, &existing)?;

        self.store.commit(vec![Change::RemovedEnquiry(existing.clone())])?;
        info!(enquiry = %existing.id, "enquiry deleted");
        Ok(existing)
    }

    pub fn reply_enquiry(
        &self,
        responder: &PersonId,
        enquiry: &EnquiryId,
        response: String,
    ) -> Result<Enquiry, AllocationError> {
        let _ledger = self.serialize();
        traced(
            "reply_enquiry",
            self.reply_enquiry_locked(responder, enquiry, response),
        )
    }

    fn reply_enquiry_locked(
        &self,
        responder: &PersonId,
        enquiry: &EnquiryId,
        response: String,
    ) -> Result<Enquiry, AllocationError> {
        let responder = self.person(responder)?;
        let before = self.enquiry(enquiry)?;
        let project = self.project(&before.project_id)?;

        let mut after = before.clone();
        enquiry::reply(&responder, &project, &mut after, response)?;

        self.store
            .commit(ChangeSet::default().enquiry(before, after.clone()).into_changes())?;
        info!(enquiry = %after.id, responder = %responder.id, "enquiry answered");
        Ok(after)
    }

    pub fn enquiries_by_applicant(
        &self,
        applicant: &PersonId,
    ) -> Result<Vec<Enquiry>, AllocationError> {
        Ok(self
            .store
            .enquiries
            .all()?
            .into_iter()
            .filter(|enquiry| &enquiry.applicant_id == applicant)
            .collect())
    }

    pub fn enquiries_for_project(
        &self,
        project: &ProjectId,
    ) -> Result<Vec<Enquiry>, AllocationError> {
        Ok(self
            .store
            .enquiries
            .all()?
            .into_iter()
            .filter(|enquiry| &enquiry.project_id == project)
            .collect())
    }
}
