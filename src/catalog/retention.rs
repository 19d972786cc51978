//! Academic year writes and the retention rule.
//!
//! Saving a year clears `is_current` on the course's other years when the
//! saved year is current, then keeps only the newest
//! `retained` years of the course. Everything runs in one transaction.

use super::cascade::{purge_academic_years, CascadeReport};
use crate::error::ServiceError;
use crate::orm::{academic_years, courses};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AcademicYearInput {
    pub course_id: i32,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub year: i32,
    #[serde(default)]
    pub is_current: bool,
}

/// The saved year and whatever the retention rule removed afterwards.
#[derive(Debug)]
pub struct RetentionOutcome {
    pub academic_year: academic_years::Model,
    pub pruned: CascadeReport,
}

impl RetentionOutcome {
    /// The saved year fell outside the retained window and is gone.
    pub fn was_pruned(&self) -> bool {
        self.pruned.academic_years.contains(&self.academic_year.id)
    }
}

/// Insert (`id = None`) or update an academic year, then prune.
pub async fn save_academic_year(
    db: &DatabaseConnection,
    input: AcademicYearInput,
    id: Option<i32>,
    retained: u64,
) -> Result<RetentionOutcome, ServiceError> {
    input.validate()?;

    let txn = db.begin().await?;

    if courses::Entity::find_by_id(input.course_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(ServiceError::field("course_id", "Course does not exist."));
    }

    let mut duplicate = academic_years::Entity::find()
        .filter(academic_years::Column::CourseId.eq(input.course_id))
        .filter(academic_years::Column::Year.eq(input.year));
    if let Some(id) = id {
        duplicate = duplicate.filter(academic_years::Column::Id.ne(id));
    }
    if duplicate.one(&txn).await?.is_some() {
        return Err(ServiceError::non_field(
            "The fields course, year must make a unique set.",
        ));
    }

    if input.is_current {
        let mut others = academic_years::Entity::update_many()
            .col_expr(academic_years::Column::IsCurrent, Expr::value(false))
            .filter(academic_years::Column::CourseId.eq(input.course_id));
        if let Some(id) = id {
            others = others.filter(academic_years::Column::Id.ne(id));
        }
        others.exec(&txn).await?;
    }

    let academic_year = match id {
        None => {
            academic_years::ActiveModel {
                course_id: Set(input.course_id),
                year: Set(input.year),
                is_current: Set(input.is_current),
                created_at: Set(Utc::now().naive_utc()),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
        Some(id) => {
            let existing = academic_years::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Academic year not found."))?;
            let mut active: academic_years::ActiveModel = existing.into();
            active.course_id = Set(input.course_id);
            active.year = Set(input.year);
            active.is_current = Set(input.is_current);
            active.update(&txn).await?
        }
    };

    let pruned = prune_course(&txn, input.course_id, retained).await?;

    txn.commit().await?;

    pruned.log(&format!(
        "Retention for course {} after saving year {}",
        academic_year.course_id, academic_year.year
    ));

    Ok(RetentionOutcome {
        academic_year,
        pruned,
    })
}

/// Delete every academic year of the course beyond the newest `retained`.
/// At least one year is always kept.
pub async fn prune_course<C>(
    db: &C,
    course_id: i32,
    retained: u64,
) -> Result<CascadeReport, ServiceError>
where
    C: ConnectionTrait,
{
    let stale: Vec<i32> = academic_years::Entity::find()
        .filter(academic_years::Column::CourseId.eq(course_id))
        .order_by_desc(academic_years::Column::Year)
        .all(db)
        .await?
        .into_iter()
        .skip(retained.max(1) as usize)
        .map(|y| y.id)
        .collect();

    let mut report = CascadeReport::default();
    purge_academic_years(db, stale, &mut report).await?;
    Ok(report)
}
