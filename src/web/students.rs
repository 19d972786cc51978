//! Student endpoints.

use crate::error::{FieldErrors, ServiceError};
use crate::students::{self, NewStudent, Registration, StudentUpdate};
use crate::web::views::StudentView;
use actix_web::{delete, get, patch, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_students)
        .service(create_student)
        .service(check_or_register)
        .service(view_student)
        .service(update_student)
        .service(delete_student);
}

/// Registration body. Every field is optional here so that missing ones
/// are reported per field.
#[derive(Debug, Deserialize)]
struct StudentForm {
    full_name: Option<String>,
    email: Option<String>,
    course: Option<String>,
    year: Option<i32>,
    #[serde(default)]
    is_logged_in: bool,
}

impl StudentForm {
    fn into_new_student(self) -> Result<NewStudent, ServiceError> {
        let mut errors = FieldErrors::new();
        for (field, missing) in [
            ("full_name", self.full_name.is_none()),
            ("email", self.email.is_none()),
            ("course", self.course.is_none()),
            ("year", self.year.is_none()),
        ] {
            if missing {
                errors.insert(field.to_string(), vec!["This field is required.".to_string()]);
            }
        }

        match (self.full_name, self.email, self.course, self.year) {
            (Some(full_name), Some(email), Some(course), Some(year)) => Ok(NewStudent {
                full_name,
                email,
                course,
                year,
                is_logged_in: self.is_logged_in,
            }),
            _ => Err(ServiceError::Validation(errors)),
        }
    }
}

#[get("/api/students/")]
async fn list_students(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, ServiceError> {
    let all: Vec<StudentView> = students::list_students(db.get_ref())
        .await?
        .into_iter()
        .map(StudentView::from)
        .collect();
    Ok(HttpResponse::Ok().json(all))
}

#[post("/api/students/")]
async fn create_student(
    db: web::Data<DatabaseConnection>,
    form: web::Json<StudentForm>,
) -> Result<HttpResponse, ServiceError> {
    let input = form.into_inner().into_new_student()?;
    let student = students::create_student(db.get_ref(), input).await?;
    Ok(HttpResponse::Created().json(StudentView::from(student)))
}

#[post("/api/check_or_register/")]
async fn check_or_register(
    db: web::Data<DatabaseConnection>,
    form: web::Json<StudentForm>,
) -> Result<HttpResponse, ServiceError> {
    let form = form.into_inner();
    let email = match form.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({ "detail": "Email is required." })))
        }
    };

    let registration =
        students::check_or_register(db.get_ref(), &email, || form.into_new_student()).await?;
    Ok(match registration {
        Registration::Exists(student) => HttpResponse::Ok().json(json!({
            "status": "exists",
            "student": StudentView::from(student),
        })),
        Registration::Created(student) => HttpResponse::Created().json(json!({
            "status": "created",
            "student": StudentView::from(student),
        })),
    })
}

#[get("/api/students/{id}/")]
async fn view_student(
    db: web::Data<DatabaseConnection>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let student = students::get_student(db.get_ref(), id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(StudentView::from(student)))
}

#[patch("/api/students/{id}/")]
async fn update_student(
    db: web::Data<DatabaseConnection>,
    id: web::Path<i32>,
    form: web::Json<StudentUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let student =
        students::update_student(db.get_ref(), id.into_inner(), form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(StudentView::from(student)))
}

#[delete("/api/students/{id}/")]
async fn delete_student(
    db: web::Data<DatabaseConnection>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    students::delete_student(db.get_ref(), id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
