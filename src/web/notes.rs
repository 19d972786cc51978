//! Note preview, view, download, upload and delete.

use crate::access::{self, AccessMode, Decision, ListingAccess};
use crate::app_config::AppConfig;
use crate::catalog;
use crate::constants::{
    DOWNLOAD_DISABLED_ERROR, DOWNLOAD_DISABLED_MESSAGE, PAYMENT_METHODS, VIEW_TRIAL_MESSAGE,
};
use crate::error::ServiceError;
use crate::notes::{self, NoteUpload, UploadedFile};
use crate::orm::semesters;
use crate::search::SearchHit;
use crate::storage::{mime_type_for, StorageBackend};
use crate::web::catalog::StudentQuery;
use crate::web::views::{SearchResult, SemesterSummary, Urls};
use actix_multipart::{Field, Multipart};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web, HttpRequest, HttpResponse};
use futures::{StreamExt, TryStreamExt};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(upload_note)
        .service(preview_note)
        .service(view_note)
        .service(download_note)
        .service(delete_note);
}

#[get("/api/notes/{id}/preview/")]
async fn preview_note(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let db = db.get_ref();
    let note = catalog::get_note(db, id.into_inner()).await?;

    if !note.has_preview {
        return Ok(HttpResponse::NotFound()
            .json(json!({ "error": "Preview not available for this document" })));
    }
    match access::check_preview(AccessMode::from_config(&config.access), &note) {
        Decision::Granted(_) => {}
        _ => return Ok(HttpResponse::Forbidden().finish()),
    }

    let semester = semesters::Entity::find_by_id(note.semester_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Semester not found."))?;
    let note = notes::increment_view_count(db, note).await?;
    let urls = Urls::from_request(&req);

    Ok(HttpResponse::Ok().json(json!({
        "id": note.id,
        "title": note.title,
        "description": note.description,
        "preview_available": true,
        "preview_url": urls.optional_file(storage.get_ref(), &note.preview_file),
        "full_access_required": note.is_premium,
        "note_type": note.note_type,
        "semester": SemesterSummary::from(&semester),
    })))
}

fn payment_required(error: &str, prices: &access::Prices) -> HttpResponse {
    HttpResponse::PaymentRequired().json(json!({
        "error": error,
        "payment_required": true,
        "view_price": prices.view_price,
        "download_price": prices.download_price,
        "payment_methods": PAYMENT_METHODS,
    }))
}

#[get("/api/notes/{id}/view/")]
async fn view_note(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
    query: web::Query<StudentQuery>,
) -> Result<HttpResponse, ServiceError> {
    let db = db.get_ref();
    let mode = AccessMode::from_config(&config.access);
    let note = catalog::get_note(db, id.into_inner()).await?;

    match access::check_view(db, mode, &note, query.student_id).await? {
        Decision::Granted(Some(grant)) => {
            access::record_access(db, grant).await?;
        }
        Decision::Granted(None) => {}
        Decision::Locked | Decision::PaymentRequired => {
            let prices = access::prices(db, &config.access).await?;
            return Ok(payment_required(
                "Payment required to view full document",
                &prices,
            ));
        }
    }

    let can_download = matches!(
        access::check_download(db, mode, &note, query.student_id).await?,
        Decision::Granted(_)
    );
    let note = notes::increment_view_count(db, note).await?;
    let urls = Urls::from_request(&req);

    Ok(HttpResponse::Ok().json(json!({
        "id": note.id,
        "title": note.title,
        "description": note.description,
        "file_url": urls.file(storage.get_ref(), &note.file),
        "file_size_mb": note.file_size_mb(),
        "file_extension": note.file_extension(),
        "note_type": note.note_type,
        "can_download": can_download,
        "message": mode.is_free_trial().then(|| VIEW_TRIAL_MESSAGE),
    })))
}

#[get("/api/notes/{id}/download/")]
async fn download_note(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
    query: web::Query<StudentQuery>,
) -> Result<HttpResponse, ServiceError> {
    let db = db.get_ref();
    let mode = AccessMode::from_config(&config.access);
    let note = catalog::get_note(db, id.into_inner()).await?;

    match access::check_download(db, mode, &note, query.student_id).await? {
        Decision::Locked => {
            return Ok(HttpResponse::build(StatusCode::LOCKED).json(json!({
                "error": DOWNLOAD_DISABLED_ERROR,
                "message": DOWNLOAD_DISABLED_MESSAGE,
                "note_title": note.title,
                "coming_soon": true,
            })));
        }
        Decision::PaymentRequired => {
            let prices = access::prices(db, &config.access).await?;
            return Ok(payment_required(
                "Payment required to download document",
                &prices,
            ));
        }
        Decision::Granted(Some(grant)) => {
            access::record_access(db, grant).await?;
        }
        Decision::Granted(None) => {}
    }

    let object = storage.get_object(&note.file).await?;
    let note = notes::increment_download_count(db, note).await?;
    log::debug!("Serving download of note {} ({})", note.id, note.file);

    let file_name = format!(
        "{}{}",
        note.title,
        note.file_extension().unwrap_or_default()
    );
    let content_type = object
        .content_type
        .unwrap_or_else(|| mime_type_for(&note.file));

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name)],
        })
        .streaming(object.body))
}

async fn read_text(field: &mut Field) -> Result<String, ServiceError> {
    let mut buf: Vec<u8> = Vec::with_capacity(256);
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("upload_note: multipart read error: {}", e);
            ServiceError::non_field("Error interpreting multipart input.")
        })?;
        buf.extend_from_slice(&bytes);
    }
    String::from_utf8(buf).map_err(|_| ServiceError::non_field("Form fields must be UTF-8."))
}

/// Read an attached file. Buffering stops once more than `max_bytes` are
/// held, but the reported size is the full size sent.
async fn read_file(field: &mut Field, max_bytes: usize) -> Result<UploadedFile, ServiceError> {
    let file_name = field
        .content_disposition()
        .get_filename()
        .unwrap_or_default()
        .to_owned();

    let mut data: Vec<u8> = Vec::new();
    let mut size = 0usize;
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("upload_note: multipart read error: {}", e);
            ServiceError::non_field("Error interpreting multipart input.")
        })?;
        size += bytes.len();
        if data.len() <= max_bytes {
            data.extend_from_slice(&bytes);
        }
    }

    Ok(UploadedFile {
        file_name,
        data,
        size,
    })
}

#[post("/api/notes/upload/")]
async fn upload_note(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    storage: web::Data<dyn StorageBackend>,
    mut payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let max_bytes = config.limits.max_upload_bytes();
    let mut form = NoteUpload::default();

    while let Ok(Some(mut field)) = payload.try_next().await {
        if let Some(field_name) = field.content_disposition().get_name() {
            match field_name {
                "title" => form.title = Some(read_text(&mut field).await?),
                "description" => form.description = Some(read_text(&mut field).await?),
                "note_type" => form.note_type = Some(read_text(&mut field).await?),
                "semester" => form.semester = Some(read_text(&mut field).await?),
                "is_premium" => form.is_premium = Some(read_text(&mut field).await?),
                "file" => form.file = Some(read_file(&mut field, max_bytes).await?),
                "preview_file" => {
                    form.preview_file = Some(read_file(&mut field, max_bytes).await?)
                }
                _ => {}
            }
        }
    }

    let db = db.get_ref();
    let note = notes::upload_note(db, storage.get_ref(), &config.limits, form).await?;
    let path = catalog::semester_path(db, note.semester_id).await?;
    let access = ListingAccess::load(db, &config.access, None, vec![note.id]).await?;
    let urls = Urls::from_request(&req);

    let hit = SearchHit { note, path };
    Ok(HttpResponse::Created().json(SearchResult::new(&hit, &access, &urls)))
}

#[delete("/api/notes/{id}/delete/")]
async fn delete_note(
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
    id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    notes::delete_note(db.get_ref(), storage.get_ref(), id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
