use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::domain::{
    Application, ApplicationId, Enquiry, EnquiryId, Person, PersonId, Project, ProjectId,
};

/// Entity stored behind a [`Repository`].
pub trait Record: Clone + Send + Sync + 'static {
    type Id: Clone + PartialEq + fmt::Display + Send + Sync;

    /// Human-readable entity name used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
}

impl Record for Person {
    type Id = PersonId;
    const KIND: &'static str = "person";

    fn id(&self) -> &PersonId {
        &self.id
    }
}

impl Record for Project {
    type Id = ProjectId;
    const KIND: &'static str = "project";

    fn id(&self) -> &ProjectId {
        &self.id
    }
}

impl Record for Application {
    type Id = ApplicationId;
    const KIND: &'static str = "application";

    fn id(&self) -> &ApplicationId {
        &self.id
    }
}

impl Record for Enquiry {
    type Id = EnquiryId;
    const KIND: &'static str = "enquiry";

    fn id(&self) -> &EnquiryId {
        &self.id
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `all` returns a snapshot in insertion order; callers never hold references into the store.
pub trait Repository<E: Record>: Send + Sync {
    fn get(&self, id: &E::Id) -> Result<Option<E>, RepositoryError>;
    fn all(&self) -> Result<Vec<E>, RepositoryError>;
    fn add(&self, record: E) -> Result<E, RepositoryError>;
    fn update(&self, record: E) -> Result<(), RepositoryError>;
    fn delete(&self, id: &E::Id) -> Result<E, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{kind} {id} already exists")]
    Conflict { kind: &'static str, id: String },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    fn conflict<E: Record>(id: &E::Id) -> Self {
        Self::Conflict {
            kind: E::KIND,
            id: id.to_string(),
        }
    }

    fn not_found<E: Record>(id: &E::Id) -> Self {
        Self::NotFound {
            kind: E::KIND,
            id: id.to_string(),
        }
    }
}

/// In-process repository backed by an insertion-ordered vector.
pub struct MemoryRepository<E> {
    records: Arc<Mutex<Vec<E>>>,
}

impl<E> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<E> Clone for MemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
        }
    }
}

impl<E: Record> MemoryRepository<E> {
    pub fn with_records(records: impl IntoIterator<Item = E>) -> Result<Self, RepositoryError> {
        let repository = Self::default();
        for record in records {
            repository.add(record)?;
        }
        Ok(repository)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<E>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Record> Repository<E> for MemoryRepository<E> {
    fn get(&self, id: &E::Id) -> Result<Option<E>, RepositoryError> {
        Ok(self.lock().iter().find(|record| record.id() == id).cloned())
    }

    fn all(&self) -> Result<Vec<E>, RepositoryError> {
        Ok(self.lock().clone())
    }

    fn add(&self, record: E) -> Result<E, RepositoryError> {
        let mut guard = self.lock();
        if guard.iter().any(|existing| existing.id() == record.id()) {
            return Err(RepositoryError::conflict::<E>(record.id()));
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn update(&self, record: E) -> Result<(), RepositoryError> {
        let mut guard = self.lock();
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id() == record.id())
            .ok_or_else(|| RepositoryError::not_found::<E>(record.id()))?;
        *slot = record;
        Ok(())
    }

    fn delete(&self, id: &E::Id) -> Result<E, RepositoryError> {
        let mut guard = self.lock();
        let index = guard
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| RepositoryError::not_found::<E>(id))?;
        Ok(guard.remove(index))
    }
}
