//! Nested catalog reads.
//!
//! A subtree is loaded level by level: one query per level, keyed by the
//! parent ids of the level above, then stitched together in memory.

use crate::error::ServiceError;
use crate::orm::{academic_years, courses, notes, semesters, year_levels};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct SemesterTree {
    pub semester: semesters::Model,
    /// Newest first.
    pub notes: Vec<notes::Model>,
}

#[derive(Clone, Debug)]
pub struct YearLevelTree {
    pub year_level: year_levels::Model,
    pub semesters: Vec<SemesterTree>,
}

#[derive(Clone, Debug)]
pub struct AcademicYearTree {
    pub academic_year: academic_years::Model,
    pub year_levels: Vec<YearLevelTree>,
}

#[derive(Clone, Debug)]
pub struct CourseTree {
    pub course: courses::Model,
    /// Newest year first.
    pub academic_years: Vec<AcademicYearTree>,
}

impl CourseTree {
    /// Every note in the subtree.
    pub fn notes(&self) -> impl Iterator<Item = &notes::Model> {
        self.academic_years
            .iter()
            .flat_map(|y| y.year_levels.iter())
            .flat_map(|l| l.semesters.iter())
            .flat_map(|s| s.notes.iter())
    }
}

impl YearLevelTree {
    pub fn notes(&self) -> impl Iterator<Item = &notes::Model> {
        self.semesters.iter().flat_map(|s| s.notes.iter())
    }
}

/// Load a course with its years, levels, semesters and notes.
pub async fn load_course_tree<C>(db: &C, course: courses::Model) -> Result<CourseTree, ServiceError>
where
    C: ConnectionTrait,
{
    let years = academic_years::Entity::find()
        .filter(academic_years::Column::CourseId.eq(course.id))
        .order_by_desc(academic_years::Column::Year)
        .all(db)
        .await?;

    let year_ids: Vec<i32> = years.iter().map(|y| y.id).collect();
    let levels = load_year_levels(db, year_ids).await?;
    let mut levels_by_year: HashMap<i32, Vec<year_levels::Model>> = HashMap::new();
    for level in levels {
        levels_by_year
            .entry(level.academic_year_id)
            .or_default()
            .push(level);
    }

    let level_ids: Vec<i32> = levels_by_year.values().flatten().map(|l| l.id).collect();
    let mut semesters_by_level = load_semester_trees(db, level_ids).await?;

    let academic_years = years
        .into_iter()
        .map(|academic_year| {
            let year_levels = levels_by_year
                .remove(&academic_year.id)
                .unwrap_or_default()
                .into_iter()
                .map(|year_level| YearLevelTree {
                    semesters: semesters_by_level.remove(&year_level.id).unwrap_or_default(),
                    year_level,
                })
                .collect();
            AcademicYearTree {
                academic_year,
                year_levels,
            }
        })
        .collect();

    Ok(CourseTree {
        course,
        academic_years,
    })
}

/// Load one year level with its semesters and their notes.
pub async fn load_year_level_tree<C>(
    db: &C,
    year_level: year_levels::Model,
) -> Result<YearLevelTree, ServiceError>
where
    C: ConnectionTrait,
{
    let semesters = load_semester_trees(db, vec![year_level.id])
        .await?
        .remove(&year_level.id)
        .unwrap_or_default();

    Ok(YearLevelTree {
        year_level,
        semesters,
    })
}

/// Year levels of each course's `year`, keyed by course id. Courses
/// without that year are absent from the map.
pub async fn year_levels_for_year<C>(
    db: &C,
    course_ids: Vec<i32>,
    year: i32,
) -> Result<HashMap<i32, Vec<year_levels::Model>>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut by_course = HashMap::new();
    if course_ids.is_empty() {
        return Ok(by_course);
    }

    let years = academic_years::Entity::find()
        .filter(academic_years::Column::CourseId.is_in(course_ids))
        .filter(academic_years::Column::Year.eq(year))
        .all(db)
        .await?;
    let course_of_year: HashMap<i32, i32> = years.iter().map(|y| (y.id, y.course_id)).collect();

    for level in load_year_levels(db, course_of_year.keys().copied().collect()).await? {
        if let Some(course_id) = course_of_year.get(&level.academic_year_id) {
            by_course
                .entry(*course_id)
                .or_insert_with(Vec::new)
                .push(level);
        }
    }
    Ok(by_course)
}

async fn load_year_levels<C>(
    db: &C,
    year_ids: Vec<i32>,
) -> Result<Vec<year_levels::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    if year_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(year_levels::Entity::find()
        .filter(year_levels::Column::AcademicYearId.is_in(year_ids))
        .order_by_asc(year_levels::Column::Level)
        .all(db)
        .await?)
}

/// Semesters with their notes, keyed by year level id.
async fn load_semester_trees<C>(
    db: &C,
    level_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<SemesterTree>>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut by_level: HashMap<i32, Vec<SemesterTree>> = HashMap::new();
    if level_ids.is_empty() {
        return Ok(by_level);
    }

    let semesters = semesters::Entity::find()
        .filter(semesters::Column::YearLevelId.is_in(level_ids))
        .order_by_asc(semesters::Column::SemesterNumber)
        .all(db)
        .await?;

    let mut notes_by_semester: HashMap<i32, Vec<notes::Model>> = HashMap::new();
    let semester_ids: Vec<i32> = semesters.iter().map(|s| s.id).collect();
    if !semester_ids.is_empty() {
        let notes = notes::Entity::find()
            .filter(notes::Column::SemesterId.is_in(semester_ids))
            .order_by_desc(notes::Column::UploadedAt)
            .order_by_desc(notes::Column::Id)
            .all(db)
            .await?;
        for note in notes {
            notes_by_semester
                .entry(note.semester_id)
                .or_default()
                .push(note);
        }
    }

    for semester in semesters {
        by_level
            .entry(semester.year_level_id)
            .or_default()
            .push(SemesterTree {
                notes: notes_by_semester.remove(&semester.id).unwrap_or_default(),
                semester,
            });
    }
    Ok(by_level)
}
