//! JSON administration of the catalog, site content and access grants.
//!
//! These routes carry no authentication of their own and are expected to be
//! exposed only behind an authenticating proxy.

use crate::access::{self, AccessGrant};
use crate::app_config::AppConfig;
use crate::catalog::retention::{self, AcademicYearInput, RetentionOutcome};
use crate::catalog::{self, cascade, NewCourse, NewFaculty, NewSemester, NewYearLevel};
use crate::content::{self, AboutUsInput, HowItWorksInput, SiteSettingsInput};
use crate::error::ServiceError;
use crate::orm::{academic_years, semesters, year_levels};
use crate::storage::StorageBackend;
use crate::web::views::{
    AboutUsView, CourseSummary, FacultyView, HowItWorksView, PaymentView, SemesterSummary,
    SiteSettingsView, StudentAccessView, Urls, YearLevelSummary,
};
use actix_web::{delete, post, put, web, HttpRequest, HttpResponse};
use chrono::NaiveDateTime;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(create_faculty)
        .service(delete_faculty)
        .service(create_course)
        .service(delete_course)
        .service(create_academic_year)
        .service(update_academic_year)
        .service(delete_academic_year)
        .service(create_year_level)
        .service(create_semester)
        .service(put_site_settings)
        .service(put_about_us)
        .service(create_step)
        .service(delete_step)
        .service(create_access_grant);
}

#[post("/api/admin/faculties/")]
async fn create_faculty(
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewFaculty>,
) -> Result<HttpResponse, ServiceError> {
    let faculty = catalog::create_faculty(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(FacultyView::from(&faculty)))
}

#[post("/api/admin/courses/")]
async fn create_course(
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewCourse>,
) -> Result<HttpResponse, ServiceError> {
    let course = catalog::create_course(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "faculty": course.faculty_id,
        "created_at": course.created_at,
        "course": CourseSummary::from(&course),
    })))
}

#[derive(Serialize)]
struct AcademicYearView {
    id: i32,
    course: i32,
    year: i32,
    is_current: bool,
    created_at: NaiveDateTime,
}

impl From<&academic_years::Model> for AcademicYearView {
    fn from(y: &academic_years::Model) -> Self {
        AcademicYearView {
            id: y.id,
            course: y.course_id,
            year: y.year,
            is_current: y.is_current,
            created_at: y.created_at,
        }
    }
}

async fn retention_response(
    outcome: RetentionOutcome,
    storage: &dyn StorageBackend,
    created: bool,
) -> HttpResponse {
    cascade::remove_files(storage, &outcome.pruned).await;
    let body = json!({
        "academic_year": AcademicYearView::from(&outcome.academic_year),
        "was_pruned": outcome.was_pruned(),
        "pruned": outcome.pruned,
    });
    if created {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    }
}

#[post("/api/admin/academic-years/")]
async fn create_academic_year(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    form: web::Json<AcademicYearInput>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = retention::save_academic_year(
        db.get_ref(),
        form.into_inner(),
        None,
        config.catalog.retained_academic_years,
    )
    .await?;
    Ok(retention_response(outcome, storage.get_ref(), true).await)
}

#[put("/api/admin/academic-years/{id}/")]
async fn update_academic_year(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
    form: web::Json<AcademicYearInput>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = retention::save_academic_year(
        db.get_ref(),
        form.into_inner(),
        Some(id.into_inner()),
        config.catalog.retained_academic_years,
    )
    .await?;
    Ok(retention_response(outcome, storage.get_ref(), false).await)
}

#[post("/api/admin/year-levels/")]
async fn create_year_level(
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewYearLevel>,
) -> Result<HttpResponse, ServiceError> {
    let level: year_levels::Model =
        catalog::create_year_level(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "academic_year": level.academic_year_id,
        "year_level": YearLevelSummary::from(&level),
    })))
}

#[post("/api/admin/semesters/")]
async fn create_semester(
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewSemester>,
) -> Result<HttpResponse, ServiceError> {
    let semester: semesters::Model =
        catalog::create_semester(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "year_level": semester.year_level_id,
        "semester": SemesterSummary::from(&semester),
    })))
}

/// Which level an explicit cascade starts from.
#[derive(Clone, Copy)]
enum CascadeRoot {
    Faculty,
    Course,
    AcademicYear,
}

async fn run_cascade(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    root: CascadeRoot,
    id: i32,
) -> Result<HttpResponse, ServiceError> {
    let txn = db.begin().await?;
    let (report, reason) = match root {
        CascadeRoot::Faculty => (cascade::delete_faculty(&txn, id).await?, "Deleted faculty"),
        CascadeRoot::Course => (cascade::delete_course(&txn, id).await?, "Deleted course"),
        CascadeRoot::AcademicYear => (
            cascade::delete_academic_year(&txn, id).await?,
            "Deleted academic year",
        ),
    };
    txn.commit().await?;

    report.log(&format!("{} {}", reason, id));
    cascade::remove_files(storage, &report).await;
    Ok(HttpResponse::Ok().json(report))
}

#[delete("/api/admin/faculties/{id}/")]
async fn delete_faculty(
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    run_cascade(
        db.get_ref(),
        storage.get_ref(),
        CascadeRoot::Faculty,
        id.into_inner(),
    )
    .await
}

#[delete("/api/admin/courses/{id}/")]
async fn delete_course(
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    run_cascade(
        db.get_ref(),
        storage.get_ref(),
        CascadeRoot::Course,
        id.into_inner(),
    )
    .await
}

#[delete("/api/admin/academic-years/{id}/")]
async fn delete_academic_year(
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    run_cascade(
        db.get_ref(),
        storage.get_ref(),
        CascadeRoot::AcademicYear,
        id.into_inner(),
    )
    .await
}

#[put("/api/admin/site-settings/")]
async fn put_site_settings(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    form: web::Json<SiteSettingsInput>,
) -> Result<HttpResponse, ServiceError> {
    let (settings, created) = content::upsert_site_settings(db.get_ref(), form.into_inner()).await?;
    let view = SiteSettingsView::new(settings, &Urls::from_request(&req), storage.get_ref());
    Ok(if created {
        HttpResponse::Created().json(view)
    } else {
        HttpResponse::Ok().json(view)
    })
}

#[put("/api/admin/about-us/")]
async fn put_about_us(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    form: web::Json<AboutUsInput>,
) -> Result<HttpResponse, ServiceError> {
    let (about, created) = content::upsert_about_us(db.get_ref(), form.into_inner()).await?;
    let view = AboutUsView::new(about, &Urls::from_request(&req), storage.get_ref());
    Ok(if created {
        HttpResponse::Created().json(view)
    } else {
        HttpResponse::Ok().json(view)
    })
}

#[post("/api/admin/how-it-works/")]
async fn create_step(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    form: web::Json<HowItWorksInput>,
) -> Result<HttpResponse, ServiceError> {
    let step = content::create_step(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(HowItWorksView::new(
        step,
        &Urls::from_request(&req),
        storage.get_ref(),
    )))
}

#[delete("/api/admin/how-it-works/{id}/")]
async fn delete_step(
    db: web::Data<DatabaseConnection>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    content::delete_step(db.get_ref(), id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/api/admin/access-grants/")]
async fn create_access_grant(
    db: web::Data<DatabaseConnection>,
    form: web::Json<AccessGrant>,
) -> Result<HttpResponse, ServiceError> {
    let (payment, access) = access::grant_access(db.get_ref(), form.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "payment": PaymentView::from(payment),
        "access": StudentAccessView::from(access),
    })))
}
