//! Catalog statistics and the per-student dashboard.

use crate::catalog;
use crate::error::ServiceError;
use crate::orm::notes::NoteType;
use crate::orm::payments::PaymentStatus;
use crate::orm::{academic_years, courses, faculties, notes, payments, student_access};
use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, Iterable, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct RecentUpload {
    pub id: i32,
    pub title: String,
    pub course: String,
    pub uploaded_at: NaiveDateTime,
    pub has_preview: bool,
}

#[derive(Debug, Serialize)]
pub struct Statistics {
    pub total_faculties: u64,
    pub total_courses: u64,
    pub total_notes: u64,
    pub current_academic_years: u64,
    #[serde(rename = "total_previews")]
    pub notes_with_previews: u64,
    pub premium_notes: u64,
    /// Every note type is present, with zero when unused.
    pub notes_by_type: BTreeMap<&'static str, u64>,
    pub recent_uploads: Vec<RecentUpload>,
}

pub async fn statistics<C>(db: &C, recent: u64) -> Result<Statistics, ServiceError>
where
    C: ConnectionTrait,
{
    let (faculty_count, course_count, note_count, current_count, preview_count, premium_count) = futures::join!(
        faculties::Entity::find().count(db),
        courses::Entity::find().count(db),
        notes::Entity::find().count(db),
        academic_years::Entity::find()
            .filter(academic_years::Column::IsCurrent.eq(true))
            .count(db),
        notes::Entity::find()
            .filter(notes::Column::HasPreview.eq(true))
            .count(db),
        notes::Entity::find()
            .filter(notes::Column::IsPremium.eq(true))
            .count(db),
    );

    let mut notes_by_type = BTreeMap::new();
    for note_type in NoteType::iter() {
        let count = notes::Entity::find()
            .filter(notes::Column::NoteType.eq(note_type))
            .count(db)
            .await?;
        notes_by_type.insert(note_type.as_str(), count as u64);
    }

    let latest = notes::Entity::find()
        .order_by_desc(notes::Column::UploadedAt)
        .order_by_desc(notes::Column::Id)
        .limit(recent)
        .all(db)
        .await?;
    let paths =
        catalog::semester_paths(db, latest.iter().map(|n| n.semester_id).collect()).await?;
    let recent_uploads = latest
        .into_iter()
        .map(|note| RecentUpload {
            course: paths
                .get(&note.semester_id)
                .map(|p| p.course.code.clone())
                .unwrap_or_default(),
            id: note.id,
            title: note.title,
            uploaded_at: note.uploaded_at,
            has_preview: note.has_preview,
        })
        .collect();

    Ok(Statistics {
        total_faculties: faculty_count? as u64,
        total_courses: course_count? as u64,
        total_notes: note_count? as u64,
        current_academic_years: current_count? as u64,
        notes_with_previews: preview_count? as u64,
        premium_notes: premium_count? as u64,
        notes_by_type,
        recent_uploads,
    })
}

/// Access records and completed payments of one student, newest first.
#[derive(Debug)]
pub struct StudentHistory {
    pub access_records: Vec<student_access::Model>,
    pub payments: Vec<payments::Model>,
}

pub async fn student_history<C>(db: &C, student_id: i32) -> Result<StudentHistory, ServiceError>
where
    C: ConnectionTrait,
{
    let access_records = student_access::Entity::find()
        .filter(student_access::Column::StudentId.eq(student_id))
        .order_by_desc(student_access::Column::GrantedAt)
        .all(db)
        .await?;
    let payments = payments::Entity::find()
        .filter(payments::Column::StudentId.eq(student_id))
        .filter(payments::Column::Status.eq(PaymentStatus::Completed))
        .order_by_desc(payments::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(StudentHistory {
        access_records,
        payments,
    })
}
