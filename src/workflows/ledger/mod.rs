//! CSV persistence for the allocation entity set.
//!
//! A ledger directory holds `people.csv`, `projects.csv`, `applications.csv` and
//! `enquiries.csv`. Missing files read as empty. Every row is validated on the way in and the
//! loaded snapshot is cross-checked before it reaches a service.

mod rows;
mod sample;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::workflows::allocation::{AllocationSnapshot, Person, Role};

use rows::{ApplicationRow, EnquiryRow, PersonRow, ProjectRow};

pub use sample::sample_snapshot;

pub const PEOPLE_FILE: &str = "people.csv";
pub const PROJECTS_FILE: &str = "projects.csv";
pub const APPLICATIONS_FILE: &str = "applications.csv";
pub const ENQUIRIES_FILE: &str = "enquiries.csv";

#[derive(Debug)]
pub enum LedgerError {
    Io { path: PathBuf, source: std::io::Error },
    Csv { file: &'static str, source: csv::Error },
    InvalidRow {
        file: &'static str,
        line: u64,
        reason: String,
    },
    Inconsistent(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Io { path, source } => {
                write!(f, "failed to access ledger file {}: {source}", path.display())
            }
            LedgerError::Csv { file, source } => write!(f, "malformed CSV in {file}: {source}"),
            LedgerError::InvalidRow { file, line, reason } => {
                write!(f, "{file} line {line}: {reason}")
            }
            LedgerError::Inconsistent(reason) => write!(f, "inconsistent ledger: {reason}"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Io { source, .. } => Some(source),
            LedgerError::Csv { source, .. } => Some(source),
            LedgerError::InvalidRow { .. } | LedgerError::Inconsistent(_) => None,
        }
    }
}

/// A ledger rooted at one directory.
#[derive(Debug, Clone)]
pub struct CsvLedger {
    dir: PathBuf,
}

impl CsvLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a previous save left data behind.
    pub fn exists(&self) -> bool {
        self.dir.join(PEOPLE_FILE).is_file()
    }

    pub fn load(&self) -> Result<AllocationSnapshot, LedgerError> {
        let snapshot = AllocationSnapshot {
            people: self.read_file(PEOPLE_FILE, PersonRow::into_person)?,
            projects: self.read_file(PROJECTS_FILE, ProjectRow::into_project)?,
            applications: self.read_file(APPLICATIONS_FILE, ApplicationRow::into_application)?,
            enquiries: self.read_file(ENQUIRIES_FILE, EnquiryRow::into_enquiry)?,
        };
        validate(&snapshot)?;

        info!(
            dir = %self.dir.display(),
            people = snapshot.people.len(),
            projects = snapshot.projects.len(),
            applications = snapshot.applications.len(),
            enquiries = snapshot.enquiries.len(),
            "ledger loaded"
        );
        Ok(snapshot)
    }

    /// Write every file, each through a temporary sibling renamed into place.
    pub fn save(&self, snapshot: &AllocationSnapshot) -> Result<(), LedgerError> {
        fs::create_dir_all(&self.dir).map_err(|source| LedgerError::Io {
            path: self.dir.clone(),
            source,
        })?;

        self.write_file(PEOPLE_FILE, snapshot.people.iter().map(PersonRow::from))?;
        self.write_file(PROJECTS_FILE, snapshot.projects.iter().map(ProjectRow::from))?;
        self.write_file(
            APPLICATIONS_FILE,
            snapshot.applications.iter().map(ApplicationRow::from),
        )?;
        self.write_file(ENQUIRIES_FILE, snapshot.enquiries.iter().map(EnquiryRow::from))?;

        info!(dir = %self.dir.display(), "ledger saved");
        Ok(())
    }

    fn read_file<T, E>(
        &self,
        file: &'static str,
        convert: impl Fn(T) -> Result<E, String>,
    ) -> Result<Vec<E>, LedgerError>
    where
        T: DeserializeOwned,
    {
        let path = self.dir.join(file);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let handle = File::open(&path).map_err(|source| LedgerError::Io { path, source })?;
        read_rows(file, handle, convert)
    }

    fn write_file<T: Serialize>(
        &self,
        file: &'static str,
        rows: impl Iterator<Item = T>,
    ) -> Result<(), LedgerError> {
        let path = self.dir.join(file);
        let staging = self.dir.join(format!("{file}.tmp"));
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| LedgerError::Io { path, source }
        };

        let handle = File::create(&staging).map_err(io_error(&staging))?;
        write_rows(file, handle, rows)?;
        fs::rename(&staging, &path).map_err(io_error(&path))
    }
}

/// Parse one CSV document, converting each row and reporting failures by line.
pub(crate) fn read_rows<R, T, E>(
    file: &'static str,
    reader: R,
    convert: impl Fn(T) -> Result<E, String>,
) -> Result<Vec<E>, LedgerError>
where
    R: Read,
    T: DeserializeOwned,
{
    let csv_error = |source: csv::Error| LedgerError::Csv { file, source };
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = csv_reader.headers().map_err(csv_error)?.clone();

    let mut entities = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map_or(0, |position| position.line());
        let row: T = record.deserialize(Some(&headers)).map_err(csv_error)?;
        let entity = convert(row).map_err(|reason| LedgerError::InvalidRow { file, line, reason })?;
        entities.push(entity);
    }

    Ok(entities)
}

pub(crate) fn write_rows<W, T>(
    file: &'static str,
    writer: W,
    rows: impl Iterator<Item = T>,
) -> Result<(), LedgerError>
where
    W: Write,
    T: Serialize,
{
    let csv_error = |source: csv::Error| LedgerError::Csv { file, source };
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row).map_err(csv_error)?;
    }
    csv_writer
        .flush()
        .map_err(|source| csv_error(csv::Error::from(source)))
}

/// Cross-entity checks a single row cannot make on its own.
pub fn validate(snapshot: &AllocationSnapshot) -> Result<(), LedgerError> {
    let people: HashMap<&str, &Person> = snapshot
        .people
        .iter()
        .map(|person| (person.id.as_str(), person))
        .collect();
    let projects: HashSet<&str> = snapshot
        .projects
        .iter()
        .map(|project| project.id.as_str())
        .collect();
    let inconsistent = |reason: String| Err::<(), _>(LedgerError::Inconsistent(reason));

    for project in &snapshot.projects {
        match people.get(project.manager_id.as_str()) {
            Some(manager) if manager.is_manager() => {}
            _ => {
                return inconsistent(format!(
                    "project {} is managed by {}, who is not a manager",
                    project.id, project.manager_id
                ))
            }
        }
    }

    for person in &snapshot.people {
        let mut references: Vec<&str> = Vec::new();
        references.extend(person.candidate_project.as_ref().map(|id| id.as_str()));
        references.extend(person.booking.as_ref().map(|booking| booking.project_id.as_str()));
        if let Role::Officer(assignment) = &person.role {
            references.extend(assignment.pending_project.as_ref().map(|id| id.as_str()));
            references.extend(assignment.handling_project.as_ref().map(|id| id.as_str()));
        }
        if let Some(missing) = references.into_iter().find(|id| !projects.contains(id)) {
            return inconsistent(format!(
                "{} references unknown project {missing}",
                person.id
            ));
        }
    }

    let mut active: HashSet<&str> = HashSet::new();
    for application in &snapshot.applications {
        let Some(applicant) = people.get(application.applicant_id.as_str()) else {
            return inconsistent(format!(
                "application {} belongs to unknown person {}",
                application.id, application.applicant_id
            ));
        };
        if !projects.contains(application.project_id.as_str()) {
            return inconsistent(format!(
                "application {} targets unknown project {}",
                application.id, application.project_id
            ));
        }
        if applicant.is_manager() {
            return inconsistent(format!(
                "application {} was filed by manager {}",
                application.id, applicant.id
            ));
        }
        if application.status.is_active() && !active.insert(application.applicant_id.as_str()) {
            return inconsistent(format!(
                "{} holds more than one active application",
                application.applicant_id
            ));
        }
        if application.holds_unit() {
            let booked = applicant.booking.as_ref().is_some_and(|booking| {
                booking.project_id == application.project_id
                    && booking.flat_type == application.flat_type
            });
            if !booked {
                return inconsistent(format!(
                    "application {} is booked but {} carries no matching booking",
                    application.id, applicant.id
                ));
            }
        }
    }

    for enquiry in &snapshot.enquiries {
        if !people.contains_key(enquiry.applicant_id.as_str())
            || !projects.contains(enquiry.project_id.as_str())
        {
            return inconsistent(format!(
                "enquiry {} references an unknown person or project",
                enquiry.id
            ));
        }
    }

    Ok(())
}
