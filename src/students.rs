//! Student identity: registration by email, lookup, update and removal.

use crate::error::ServiceError;
use crate::orm::{payments, student_access, students};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct NewStudent {
    #[validate(length(min = 1, max = 100, message = "Ensure this field has 1 to 100 characters."))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "Ensure this field has 1 to 100 characters."))]
    pub course: String,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub year: i32,
    #[serde(default)]
    pub is_logged_in: bool,
}

/// Partial update. `login_token` and `total_spent` are not writable.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StudentUpdate {
    #[validate(length(min = 1, max = 100, message = "Ensure this field has 1 to 100 characters."))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Ensure this field has 1 to 100 characters."))]
    pub course: Option<String>,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub year: Option<i32>,
    pub is_logged_in: Option<bool>,
}

/// Result of [`check_or_register`].
#[derive(Debug)]
pub enum Registration {
    Exists(students::Model),
    Created(students::Model),
}

pub async fn list_students<C>(db: &C) -> Result<Vec<students::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(students::Entity::find()
        .order_by_asc(students::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_student<C>(db: &C, student_id: i32) -> Result<students::Model, ServiceError>
where
    C: ConnectionTrait,
{
    students::Entity::find_by_id(student_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Not found."))
}

pub async fn find_by_email<C>(db: &C, email: &str) -> Result<Option<students::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(students::Entity::find()
        .filter(students::Column::Email.eq(email.trim()))
        .one(db)
        .await?)
}

pub async fn create_student<C>(db: &C, input: NewStudent) -> Result<students::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let email = input.email.trim().to_string();
    if find_by_email(db, &email).await?.is_some() {
        return Err(ServiceError::field(
            "email",
            "student with this email already exists.",
        ));
    }

    let student = students::ActiveModel {
        full_name: Set(input.full_name.trim().to_string()),
        email: Set(email),
        course: Set(input.course.trim().to_string()),
        year: Set(input.year),
        is_logged_in: Set(input.is_logged_in),
        login_token: Set(Uuid::new_v4().to_string()),
        total_spent: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Registered student {} <{}>", student.id, student.email);
    Ok(student)
}

/// Return the student registered under `email`, or register the one built
/// by `new_student`. The registration payload is only checked when needed.
pub async fn check_or_register<C, F>(
    db: &C,
    email: &str,
    new_student: F,
) -> Result<Registration, ServiceError>
where
    C: ConnectionTrait,
    F: FnOnce() -> Result<NewStudent, ServiceError>,
{
    if let Some(student) = find_by_email(db, email).await? {
        return Ok(Registration::Exists(student));
    }
    Ok(Registration::Created(create_student(db, new_student()?).await?))
}

pub async fn update_student<C>(
    db: &C,
    student_id: i32,
    input: StudentUpdate,
) -> Result<students::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let student = get_student(db, student_id).await?;

    if let Some(email) = &input.email {
        if let Some(other) = find_by_email(db, email).await? {
            if other.id != student.id {
                return Err(ServiceError::field(
                    "email",
                    "student with this email already exists.",
                ));
            }
        }
    }

    let mut model: students::ActiveModel = student.into();
    if let Some(full_name) = input.full_name {
        model.full_name = Set(full_name.trim().to_string());
    }
    if let Some(email) = input.email {
        model.email = Set(email.trim().to_string());
    }
    if let Some(course) = input.course {
        model.course = Set(course.trim().to_string());
    }
    if let Some(year) = input.year {
        model.year = Set(year);
    }
    if let Some(is_logged_in) = input.is_logged_in {
        model.is_logged_in = Set(is_logged_in);
    }
    Ok(model.update(db).await?)
}

/// Delete a student with their payments and access records.
pub async fn delete_student(db: &DatabaseConnection, student_id: i32) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let student = get_student(&txn, student_id).await?;

    student_access::Entity::delete_many()
        .filter(student_access::Column::StudentId.eq(student.id))
        .exec(&txn)
        .await?;
    payments::Entity::delete_many()
        .filter(payments::Column::StudentId.eq(student.id))
        .exec(&txn)
        .await?;
    students::Entity::delete_by_id(student.id).exec(&txn).await?;

    txn.commit().await?;
    log::info!("Deleted student {} <{}>", student.id, student.email);
    Ok(())
}
