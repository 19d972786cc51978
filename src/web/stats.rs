//! Catalog statistics and the student dashboard.

use crate::access::AccessMode;
use crate::app_config::AppConfig;
use crate::constants::DASHBOARD_TRIAL_MESSAGE;
use crate::error::ServiceError;
use crate::stats;
use crate::students;
use crate::web::views::{PaymentView, StudentAccessView, StudentView};
use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_statistics).service(view_student_dashboard);
}

#[get("/api/statistics/")]
async fn view_statistics(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ServiceError> {
    let statistics = stats::statistics(db.get_ref(), config.limits.recent_uploads).await?;
    Ok(HttpResponse::Ok().json(statistics))
}

#[get("/api/students/{id}/dashboard/")]
async fn view_student_dashboard(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let db = db.get_ref();
    let student = students::get_student(db, id.into_inner()).await?;
    let history = stats::student_history(db, student.id).await?;
    let is_trial = AccessMode::from_config(&config.access).is_free_trial();

    let access_records: Vec<StudentAccessView> = history
        .access_records
        .into_iter()
        .map(StudentAccessView::from)
        .collect();
    let payment_history: Vec<PaymentView> =
        history.payments.into_iter().map(PaymentView::from).collect();

    Ok(HttpResponse::Ok().json(json!({
        "student": StudentView::from(student),
        "recent_views": [],
        "access_summary": {
            "total_accessed_notes": access_records.len(),
            "favorite_subjects": [],
            "most_accessed_type": "lecture",
        },
        "trial_status": {
            "is_trial": is_trial,
            "message": is_trial.then(|| DASHBOARD_TRIAL_MESSAGE),
        },
        "access_records": access_records,
        "payment_history": payment_history,
    })))
}
