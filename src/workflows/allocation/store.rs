use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{Application, Enquiry, Person, Project};
use super::repository::{MemoryRepository, Record, Repository, RepositoryError};

/// Full entity set, as loaded from or saved to a ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    pub people: Vec<Person>,
    pub projects: Vec<Project>,
    pub applications: Vec<Application>,
    pub enquiries: Vec<Enquiry>,
}

/// One repository per entity kind.
#[derive(Clone)]
pub struct Repositories {
    pub people: Arc<dyn Repository<Person>>,
    pub projects: Arc<dyn Repository<Project>>,
    pub applications: Arc<dyn Repository<Application>>,
    pub enquiries: Arc<dyn Repository<Enquiry>>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            people: Arc::new(MemoryRepository::<Person>::default()),
            projects: Arc::new(MemoryRepository::<Project>::default()),
            applications: Arc::new(MemoryRepository::<Application>::default()),
            enquiries: Arc::new(MemoryRepository::<Enquiry>::default()),
        }
    }

    pub fn from_snapshot(snapshot: AllocationSnapshot) -> Result<Self, RepositoryError> {
        Ok(Self {
            people: Arc::new(MemoryRepository::with_records(snapshot.people)?),
            projects: Arc::new(MemoryRepository::with_records(snapshot.projects)?),
            applications: Arc::new(MemoryRepository::with_records(snapshot.applications)?),
            enquiries: Arc::new(MemoryRepository::with_records(snapshot.enquiries)?),
        })
    }

    pub fn snapshot(&self) -> Result<AllocationSnapshot, RepositoryError> {
        Ok(AllocationSnapshot {
            people: self.people.all()?,
            projects: self.projects.all()?,
            applications: self.applications.all()?,
            enquiries: self.enquiries.all()?,
        })
    }

    /// Write every change in order. If one fails, the ones already written are reverted so
    /// the repositories end up as they were before the call.
    pub(crate) fn commit(&self, changes: Vec<Change>) -> Result<(), RepositoryError> {
        let mut applied: Vec<Change> = Vec::with_capacity(changes.len());

        for change in changes {
            if let Err(err) = self.apply(&change) {
                for done in applied.iter().rev() {
                    if let Err(revert_err) = self.revert(done) {
                        warn!(error = %revert_err, "failed to revert partially applied change");
                    }
                }
                return Err(err);
            }
            applied.push(change);
        }

        Ok(())
    }

    fn apply(&self, change: &Change) -> Result<(), RepositoryError> {
        match change {
            Change::Person { after, .. } => self.people.update(after.clone()),
            Change::Project { after, .. } => self.projects.update(after.clone()),
            Change::Application { after, .. } => self.applications.update(after.clone()),
            Change::Enquiry { after, .. } => self.enquiries.update(after.clone()),
            Change::NewProject(project) => self.projects.add(project.clone()).map(drop),
            Change::NewApplication(application) => {
                self.applications.add(application.clone()).map(drop)
            }
            Change::NewEnquiry(enquiry) => self.enquiries.add(enquiry.clone()).map(drop),
            Change::RemovedEnquiry(enquiry) => self.enquiries.delete(&enquiry.id).map(drop),
        }
    }

    fn revert(&self, change: &Change) -> Result<(), RepositoryError> {
        match change {
            Change::Person { before, .. } => self.people.update(before.clone()),
            Change::Project { before, .. } => self.projects.update(before.clone()),
            Change::Application { before, .. } => self.applications.update(before.clone()),
            Change::Enquiry { before, .. } => self.enquiries.update(before.clone()),
            Change::NewProject(project) => self.projects.delete(project.id()).map(drop),
            Change::NewApplication(application) => {
                self.applications.delete(application.id()).map(drop)
            }
            Change::NewEnquiry(enquiry) => self.enquiries.delete(enquiry.id()).map(drop),
            Change::RemovedEnquiry(enquiry) => self.enquiries.add(enquiry.clone()).map(drop),
        }
    }
}

/// A single pending repository write together with what it replaces.
#[derive(Debug, Clone)]
pub(crate) enum Change {
    Person { before: Person, after: Person },
    Project { before: Project, after: Project },
    Application { before: Application, after: Application },
    Enquiry { before: Enquiry, after: Enquiry },
    NewProject(Project),
    NewApplication(Application),
    NewEnquiry(Enquiry),
    RemovedEnquiry(Enquiry),
}

/// Collects the changes of one workflow call, skipping entities that came out unchanged.
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub(crate) fn person(mut self, before: Person, after: Person) -> Self {
        if before != after {
            self.changes.push(Change::Person { before, after });
        }
        self
    }

    pub(crate) fn project(mut self, before: Project, after: Project) -> Self {
        if before != after {
            self.changes.push(Change::Project { before, after });
        }
        self
    }

    pub(crate) fn application(mut self, before: Application, after: Application) -> Self {
        if before != after {
            self.changes.push(Change::Application { before, after });
        }
        self
    }

    pub(crate) fn enquiry(mut self, before: Enquiry, after: Enquiry) -> Self {
        if before != after {
            self.changes.push(Change::Enquiry { before, after });
        }
        self
    }

    pub(crate) fn push(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub(crate) fn into_changes(self) -> Vec<Change> {
        self.changes
    }
}
