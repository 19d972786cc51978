//! Catalog repository: Faculty → Course → AcademicYear → YearLevel →
//! Semester → Note.
//!
//! Every operation is an explicit query; nested reads are assembled in
//! [`tree`], cascading deletes live in [`cascade`] and academic year writes
//! go through [`retention`].

pub mod cascade;
pub mod retention;
pub mod tree;

use crate::error::ServiceError;
use crate::orm::courses::CourseType;
use crate::orm::{academic_years, courses, faculties, notes, semesters, year_levels};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::collections::HashMap;
use validator::Validate;

/// Codes are stored and compared upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewFaculty {
    #[validate(length(min = 1, max = 200, message = "Ensure this field has 1 to 200 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "Ensure this field has 1 to 10 characters."))]
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewCourse {
    pub faculty_id: i32,
    #[validate(length(min = 1, max = 200, message = "Ensure this field has 1 to 200 characters."))]
    pub name: String,
    #[validate(length(min = 1, max = 10, message = "Ensure this field has 1 to 10 characters."))]
    pub code: String,
    pub course_type: CourseType,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub duration_years: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewYearLevel {
    pub academic_year_id: i32,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub level: i32,
    /// Defaults to "Year N".
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewSemester {
    pub year_level_id: i32,
    #[validate(range(min = 1, max = 2, message = "Semester must be 1 or 2."))]
    pub semester_number: i32,
    /// Defaults to "Semester N" when blank.
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn create_faculty<C>(db: &C, input: NewFaculty) -> Result<faculties::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let code = normalize_code(&input.code);

    let existing = faculties::Entity::find()
        .filter(faculties::Column::Code.eq(code.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::field("code", "Faculty with this code already exists."));
    }

    let faculty = faculties::ActiveModel {
        name: Set(input.name.trim().to_string()),
        code: Set(code),
        description: Set(input.description.filter(|d| !d.trim().is_empty())),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Created faculty {} ({})", faculty.name, faculty.code);
    Ok(faculty)
}

pub async fn create_course<C>(db: &C, input: NewCourse) -> Result<courses::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    if faculties::Entity::find_by_id(input.faculty_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(ServiceError::field("faculty_id", "Faculty does not exist."));
    }

    let code = normalize_code(&input.code);
    let existing = courses::Entity::find()
        .filter(courses::Column::FacultyId.eq(input.faculty_id))
        .filter(courses::Column::Code.eq(code.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::non_field(
            "A course with this code already exists in the faculty.",
        ));
    }

    let course = courses::ActiveModel {
        faculty_id: Set(input.faculty_id),
        name: Set(input.name.trim().to_string()),
        code: Set(code),
        course_type: Set(input.course_type),
        duration_years: Set(input.duration_years),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Created course {} - {}", course.code, course.name);
    Ok(course)
}

/// Create a year level. The level may not exceed the course duration.
pub async fn create_year_level<C>(
    db: &C,
    input: NewYearLevel,
) -> Result<year_levels::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let academic_year = academic_years::Entity::find_by_id(input.academic_year_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::field("academic_year_id", "Academic year does not exist."))?;
    let course = courses::Entity::find_by_id(academic_year.course_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course not found."))?;

    if input.level > course.duration_years {
        return Err(ServiceError::field(
            "level",
            format!(
                "Year {} exceeds course duration of {} years",
                input.level, course.duration_years
            ),
        ));
    }

    let existing = year_levels::Entity::find()
        .filter(year_levels::Column::AcademicYearId.eq(academic_year.id))
        .filter(year_levels::Column::Level.eq(input.level))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::non_field(
            "This year level already exists for the academic year.",
        ));
    }

    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Year {}", input.level));

    let year_level = year_levels::ActiveModel {
        academic_year_id: Set(academic_year.id),
        level: Set(input.level),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(year_level)
}

/// Name used when a semester is saved without one.
pub fn default_semester_name(semester_number: i32) -> String {
    format!("Semester {}", semester_number)
}

pub async fn create_semester<C>(db: &C, input: NewSemester) -> Result<semesters::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    if year_levels::Entity::find_by_id(input.year_level_id)
        .one(db)
        .await?
        .is_none()
    {
        return Err(ServiceError::field("year_level_id", "Year level does not exist."));
    }

    let existing = semesters::Entity::find()
        .filter(semesters::Column::YearLevelId.eq(input.year_level_id))
        .filter(semesters::Column::SemesterNumber.eq(input.semester_number))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::non_field(
            "This semester already exists for the year level.",
        ));
    }

    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| default_semester_name(input.semester_number));

    let semester = semesters::ActiveModel {
        year_level_id: Set(input.year_level_id),
        semester_number: Set(input.semester_number),
        name: Set(name),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(semester)
}

// Lookups. Each step of a path fails on its own with NotFound.

pub async fn list_faculties<C>(db: &C) -> Result<Vec<faculties::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(faculties::Entity::find()
        .order_by_asc(faculties::Column::Name)
        .order_by_asc(faculties::Column::Id)
        .all(db)
        .await?)
}

pub async fn list_courses<C>(db: &C, faculty_id: i32) -> Result<Vec<courses::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(courses::Entity::find()
        .filter(courses::Column::FacultyId.eq(faculty_id))
        .order_by_asc(courses::Column::Name)
        .order_by_asc(courses::Column::Id)
        .all(db)
        .await?)
}

/// Courses of several faculties with one query, keyed by faculty id.
pub async fn courses_by_faculty<C>(
    db: &C,
    faculty_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<courses::Model>>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut grouped: HashMap<i32, Vec<courses::Model>> = HashMap::new();
    if faculty_ids.is_empty() {
        return Ok(grouped);
    }
    let found = courses::Entity::find()
        .filter(courses::Column::FacultyId.is_in(faculty_ids))
        .order_by_asc(courses::Column::Name)
        .order_by_asc(courses::Column::Id)
        .all(db)
        .await?;
    for course in found {
        grouped.entry(course.faculty_id).or_default().push(course);
    }
    Ok(grouped)
}

pub async fn find_faculty_by_code<C>(db: &C, code: &str) -> Result<faculties::Model, ServiceError>
where
    C: ConnectionTrait,
{
    faculties::Entity::find()
        .filter(faculties::Column::Code.eq(normalize_code(code)))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Faculty not found."))
}

pub async fn find_course_by_code<C>(
    db: &C,
    faculty_id: i32,
    code: &str,
) -> Result<courses::Model, ServiceError>
where
    C: ConnectionTrait,
{
    courses::Entity::find()
        .filter(courses::Column::FacultyId.eq(faculty_id))
        .filter(courses::Column::Code.eq(normalize_code(code)))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course not found."))
}

pub async fn find_academic_year<C>(
    db: &C,
    course_id: i32,
    year: i32,
) -> Result<academic_years::Model, ServiceError>
where
    C: ConnectionTrait,
{
    academic_years::Entity::find()
        .filter(academic_years::Column::CourseId.eq(course_id))
        .filter(academic_years::Column::Year.eq(year))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Academic year not found."))
}

pub async fn find_year_level<C>(
    db: &C,
    academic_year_id: i32,
    level: i32,
) -> Result<year_levels::Model, ServiceError>
where
    C: ConnectionTrait,
{
    year_levels::Entity::find()
        .filter(year_levels::Column::AcademicYearId.eq(academic_year_id))
        .filter(year_levels::Column::Level.eq(level))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Year level not found."))
}

pub async fn get_note<C>(db: &C, note_id: i32) -> Result<notes::Model, ServiceError>
where
    C: ConnectionTrait,
{
    notes::Entity::find_by_id(note_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Note not found."))
}

/// A semester with every ancestor, as needed for storage paths and
/// flat note views.
#[derive(Clone, Debug)]
pub struct SemesterPath {
    pub faculty: faculties::Model,
    pub course: courses::Model,
    pub academic_year: academic_years::Model,
    pub year_level: year_levels::Model,
    pub semester: semesters::Model,
}

/// Walk from a semester up to its faculty.
pub async fn semester_path<C>(db: &C, semester_id: i32) -> Result<SemesterPath, ServiceError>
where
    C: ConnectionTrait,
{
    let semester = semesters::Entity::find_by_id(semester_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Semester not found."))?;
    let year_level = year_levels::Entity::find_by_id(semester.year_level_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Year level not found."))?;
    let academic_year = academic_years::Entity::find_by_id(year_level.academic_year_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Academic year not found."))?;
    let course = courses::Entity::find_by_id(academic_year.course_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course not found."))?;
    let faculty = faculties::Entity::find_by_id(course.faculty_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Faculty not found."))?;

    Ok(SemesterPath {
        faculty,
        course,
        academic_year,
        year_level,
        semester,
    })
}

/// [`semester_path`] for many semesters at once, one query per level.
pub async fn semester_paths<C>(
    db: &C,
    semester_ids: Vec<i32>,
) -> Result<HashMap<i32, SemesterPath>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut paths = HashMap::new();
    if semester_ids.is_empty() {
        return Ok(paths);
    }

    let semesters = semesters::Entity::find()
        .filter(semesters::Column::Id.is_in(semester_ids))
        .all(db)
        .await?;
    let year_levels = by_id(
        year_levels::Entity::find()
            .filter(year_levels::Column::Id.is_in(semesters.iter().map(|s| s.year_level_id)))
            .all(db)
            .await?,
        |l| l.id,
    );
    let academic_years = by_id(
        academic_years::Entity::find()
            .filter(
                academic_years::Column::Id.is_in(year_levels.values().map(|l| l.academic_year_id)),
            )
            .all(db)
            .await?,
        |y| y.id,
    );
    let courses = by_id(
        courses::Entity::find()
            .filter(courses::Column::Id.is_in(academic_years.values().map(|y| y.course_id)))
            .all(db)
            .await?,
        |c| c.id,
    );
    let faculties = by_id(
        faculties::Entity::find()
            .filter(faculties::Column::Id.is_in(courses.values().map(|c| c.faculty_id)))
            .all(db)
            .await?,
        |f| f.id,
    );

    for semester in semesters {
        let year_level = match year_levels.get(&semester.year_level_id) {
            Some(l) => l,
            None => continue,
        };
        let academic_year = match academic_years.get(&year_level.academic_year_id) {
            Some(y) => y,
            None => continue,
        };
        let course = match courses.get(&academic_year.course_id) {
            Some(c) => c,
            None => continue,
        };
        let faculty = match faculties.get(&course.faculty_id) {
            Some(f) => f,
            None => continue,
        };
        paths.insert(
            semester.id,
            SemesterPath {
                faculty: faculty.clone(),
                course: course.clone(),
                academic_year: academic_year.clone(),
                year_level: year_level.clone(),
                semester,
            },
        );
    }
    Ok(paths)
}

fn by_id<T>(rows: Vec<T>, id: impl Fn(&T) -> i32) -> HashMap<i32, T> {
    rows.into_iter().map(|row| (id(&row), row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" eng "), "ENG");
        assert_eq!(normalize_code("BcS"), "BCS");
    }

    #[test]
    fn test_default_semester_name() {
        assert_eq!(default_semester_name(2), "Semester 2");
    }

    #[test]
    fn test_new_semester_rejects_third_semester() {
        let input = NewSemester {
            year_level_id: 1,
            semester_number: 3,
            name: None,
        };
        assert!(input.validate().is_err());
    }
}
