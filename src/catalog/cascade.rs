//! Explicit cascading deletes.
//!
//! Rows are removed child first. Every removed id and every storage key of a
//! removed note file is collected in a [`CascadeReport`] so callers can log
//! the loss and clean up storage.

use crate::error::ServiceError;
use crate::orm::{
    academic_years, courses, faculties, notes, payments, semesters, student_access, year_levels,
};
use crate::storage::StorageBackend;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use serde::Serialize;

/// Everything removed by one cascading delete.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CascadeReport {
    pub faculties: Vec<i32>,
    pub courses: Vec<i32>,
    pub academic_years: Vec<i32>,
    pub year_levels: Vec<i32>,
    pub semesters: Vec<i32>,
    pub notes: Vec<i32>,
    /// Storage keys of note files and previews.
    pub files: Vec<String>,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.faculties.is_empty()
            && self.courses.is_empty()
            && self.academic_years.is_empty()
            && self.year_levels.is_empty()
            && self.semesters.is_empty()
            && self.notes.is_empty()
    }

    /// Log a non-empty report at warn level.
    pub fn log(&self, reason: &str) {
        if self.is_empty() {
            return;
        }
        log::warn!(
            "{}: removed {} faculties, {} courses, {} academic years, {} year levels, {} semesters, {} notes ({} files)",
            reason,
            self.faculties.len(),
            self.courses.len(),
            self.academic_years.len(),
            self.year_levels.len(),
            self.semesters.len(),
            self.notes.len(),
            self.files.len(),
        );
        log::debug!("{}: {:?}", reason, self);
    }
}

/// Remove the files listed in `report`. Failures are logged and skipped.
pub async fn remove_files(storage: &dyn StorageBackend, report: &CascadeReport) {
    for key in &report.files {
        if let Err(e) = storage.delete_object(key).await {
            log::error!("Failed to remove stored file {}: {}", key, e);
        }
    }
}

pub async fn delete_faculty<C>(db: &C, faculty_id: i32) -> Result<CascadeReport, ServiceError>
where
    C: ConnectionTrait,
{
    faculties::Entity::find_by_id(faculty_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Faculty not found."))?;

    let mut report = CascadeReport::default();
    purge_faculties(db, vec![faculty_id], &mut report).await?;
    Ok(report)
}

pub async fn delete_course<C>(db: &C, course_id: i32) -> Result<CascadeReport, ServiceError>
where
    C: ConnectionTrait,
{
    courses::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course not found."))?;

    let mut report = CascadeReport::default();
    purge_courses(db, vec![course_id], &mut report).await?;
    Ok(report)
}

pub async fn delete_academic_year<C>(
    db: &C,
    academic_year_id: i32,
) -> Result<CascadeReport, ServiceError>
where
    C: ConnectionTrait,
{
    academic_years::Entity::find_by_id(academic_year_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Academic year not found."))?;

    let mut report = CascadeReport::default();
    purge_academic_years(db, vec![academic_year_id], &mut report).await?;
    Ok(report)
}

pub async fn delete_note<C>(db: &C, note: notes::Model) -> Result<CascadeReport, ServiceError>
where
    C: ConnectionTrait,
{
    let mut report = CascadeReport::default();
    purge_notes(db, vec![note], &mut report).await?;
    Ok(report)
}

pub(crate) async fn purge_faculties<C>(
    db: &C,
    faculty_ids: Vec<i32>,
    report: &mut CascadeReport,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if faculty_ids.is_empty() {
        return Ok(());
    }

    let course_ids = courses::Entity::find()
        .filter(courses::Column::FacultyId.is_in(faculty_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    purge_courses(db, course_ids, report).await?;

    faculties::Entity::delete_many()
        .filter(faculties::Column::Id.is_in(faculty_ids.clone()))
        .exec(db)
        .await?;
    report.faculties.extend(faculty_ids);
    Ok(())
}

pub(crate) async fn purge_courses<C>(
    db: &C,
    course_ids: Vec<i32>,
    report: &mut CascadeReport,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if course_ids.is_empty() {
        return Ok(());
    }

    let year_ids = academic_years::Entity::find()
        .filter(academic_years::Column::CourseId.is_in(course_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|y| y.id)
        .collect();
    purge_academic_years(db, year_ids, report).await?;

    courses::Entity::delete_many()
        .filter(courses::Column::Id.is_in(course_ids.clone()))
        .exec(db)
        .await?;
    report.courses.extend(course_ids);
    Ok(())
}

pub(crate) async fn purge_academic_years<C>(
    db: &C,
    year_ids: Vec<i32>,
    report: &mut CascadeReport,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if year_ids.is_empty() {
        return Ok(());
    }

    let level_ids: Vec<i32> = year_levels::Entity::find()
        .filter(year_levels::Column::AcademicYearId.is_in(year_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.id)
        .collect();

    let semester_ids: Vec<i32> = if level_ids.is_empty() {
        Vec::new()
    } else {
        semesters::Entity::find()
            .filter(semesters::Column::YearLevelId.is_in(level_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect()
    };

    if !semester_ids.is_empty() {
        let doomed = notes::Entity::find()
            .filter(notes::Column::SemesterId.is_in(semester_ids.clone()))
            .all(db)
            .await?;
        purge_notes(db, doomed, report).await?;

        semesters::Entity::delete_many()
            .filter(semesters::Column::Id.is_in(semester_ids.clone()))
            .exec(db)
            .await?;
    }

    if !level_ids.is_empty() {
        year_levels::Entity::delete_many()
            .filter(year_levels::Column::Id.is_in(level_ids.clone()))
            .exec(db)
            .await?;
    }

    academic_years::Entity::delete_many()
        .filter(academic_years::Column::Id.is_in(year_ids.clone()))
        .exec(db)
        .await?;

    report.semesters.extend(semester_ids);
    report.year_levels.extend(level_ids);
    report.academic_years.extend(year_ids);
    Ok(())
}

/// Delete notes with their payment and access rows.
pub(crate) async fn purge_notes<C>(
    db: &C,
    doomed: Vec<notes::Model>,
    report: &mut CascadeReport,
) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if doomed.is_empty() {
        return Ok(());
    }

    let note_ids: Vec<i32> = doomed.iter().map(|n| n.id).collect();

    student_access::Entity::delete_many()
        .filter(student_access::Column::NoteId.is_in(note_ids.clone()))
        .exec(db)
        .await?;
    payments::Entity::delete_many()
        .filter(payments::Column::NoteId.is_in(note_ids.clone()))
        .exec(db)
        .await?;
    notes::Entity::delete_many()
        .filter(notes::Column::Id.is_in(note_ids.clone()))
        .exec(db)
        .await?;

    for note in doomed {
        report.files.push(note.file);
        if let Some(preview) = note.preview_file {
            report.files.push(preview);
        }
    }
    report.notes.extend(note_ids);
    Ok(())
}
