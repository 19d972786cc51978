//! Note search: case-insensitive substring match on title or description,
//! narrowed by catalog filters.

use crate::catalog::{self, normalize_code, SemesterPath};
use crate::error::ServiceError;
use crate::orm::notes::NoteType;
use crate::orm::{academic_years, courses, faculties, notes, semesters, year_levels};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::Deserialize;

/// Query string of the search endpoint. Empty values mean "no filter".
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub faculty: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub note_type: String,
}

/// A matching note with its place in the catalog.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub note: notes::Model,
    pub path: SemesterPath,
}

/// Escape LIKE wildcards; `!` is the escape character.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn search_notes<C>(
    db: &C,
    query: &SearchQuery,
    limit: u64,
) -> Result<Vec<SearchHit>, ServiceError>
where
    C: ConnectionTrait,
{
    let mut select = notes::Entity::find()
        .join(JoinType::InnerJoin, notes::Relation::Semester.def())
        .join(JoinType::InnerJoin, semesters::Relation::YearLevel.def())
        .join(JoinType::InnerJoin, year_levels::Relation::AcademicYear.def())
        .join(JoinType::InnerJoin, academic_years::Relation::Course.def())
        .join(JoinType::InnerJoin, courses::Relation::Faculty.def());

    let term = query.q.trim();
    if !term.is_empty() {
        let pattern = like_pattern(term);
        select = select.filter(Expr::cust_with_values(
            "(LOWER(notes.title) LIKE ? ESCAPE '!' OR LOWER(COALESCE(notes.description, '')) LIKE ? ESCAPE '!')",
            vec![pattern.clone(), pattern],
        ));
    }

    if !query.faculty.trim().is_empty() {
        select = select.filter(faculties::Column::Code.eq(normalize_code(&query.faculty)));
    }
    if !query.course.trim().is_empty() {
        select = select.filter(courses::Column::Code.eq(normalize_code(&query.course)));
    }
    if !query.year.trim().is_empty() {
        let year: i32 = query
            .year
            .trim()
            .parse()
            .map_err(|_| ServiceError::field("year", "A valid integer is required."))?;
        select = select.filter(academic_years::Column::Year.eq(year));
    }
    if !query.note_type.trim().is_empty() {
        match NoteType::parse(query.note_type.trim()) {
            Some(note_type) => select = select.filter(notes::Column::NoteType.eq(note_type)),
            // No note can carry an unknown type.
            None => return Ok(Vec::new()),
        }
    }

    let found = select
        .order_by_desc(notes::Column::UploadedAt)
        .order_by_desc(notes::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    let paths = catalog::semester_paths(db, found.iter().map(|n| n.semester_id).collect()).await?;
    Ok(found
        .into_iter()
        .filter_map(|note| {
            let path = paths.get(&note.semester_id).cloned()?;
            Some(SearchHit { note, path })
        })
        .collect())
}
