//! Note uploads, counters and deletion.

use crate::app_config::LimitsConfig;
use crate::catalog::{self, cascade, SemesterPath};
use crate::constants::{NOTES_PREFIX, PREVIEWS_PREFIX};
use crate::error::{FieldErrors, ServiceError};
use crate::orm::notes::{self, NoteType};
use crate::storage::StorageBackend;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use uuid::Uuid;

/// Maximum title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// A file received in a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    /// Received bytes. Truncated when the upload exceeds the size limit.
    pub data: Vec<u8>,
    /// Full size of the upload as sent.
    pub size: usize,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        UploadedFile {
            file_name: file_name.into(),
            size: data.len(),
            data,
        }
    }
}

/// Raw upload form. Text fields hold the submitted strings unparsed so
/// every problem can be reported per field.
#[derive(Debug, Default)]
pub struct NoteUpload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub note_type: Option<String>,
    pub semester: Option<String>,
    pub is_premium: Option<String>,
    pub file: Option<UploadedFile>,
    pub preview_file: Option<UploadedFile>,
}

/// Upload form after validation.
#[derive(Debug)]
struct ValidNote {
    title: String,
    description: Option<String>,
    note_type: NoteType,
    is_premium: bool,
    path: SemesterPath,
    file: UploadedFile,
    preview_file: Option<UploadedFile>,
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

/// Lower-cased extension without the dot, or empty.
fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Size and extension checks for an attachment. Returns the messages.
pub fn check_file(file_name: &str, size: usize, limits: &LimitsConfig) -> Vec<String> {
    let mut messages = Vec::new();

    if size > limits.max_upload_bytes() {
        messages.push(format!(
            "File size cannot exceed {}MB. Current size: {:.2}MB",
            limits.max_upload_size_mb,
            size as f64 / (1024.0 * 1024.0)
        ));
    }

    let ext = extension_of(file_name);
    if !limits.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        let allowed: Vec<String> = limits
            .allowed_extensions
            .iter()
            .map(|a| format!(".{}", a))
            .collect();
        messages.push(format!(
            "File type .{} not allowed. Allowed types: {}",
            ext,
            allowed.join(", ")
        ));
    }

    messages
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

async fn validate_upload<C>(
    db: &C,
    form: NoteUpload,
    limits: &LimitsConfig,
) -> Result<ValidNote, ServiceError>
where
    C: ConnectionTrait,
{
    let mut errors = FieldErrors::new();

    let title = form.title.map(|t| t.trim().to_string());
    match &title {
        None => push_error(&mut errors, "title", "This field is required."),
        Some(t) if t.is_empty() => push_error(&mut errors, "title", "This field may not be blank."),
        Some(t) if t.chars().count() > MAX_TITLE_LENGTH => push_error(
            &mut errors,
            "title",
            format!(
                "Ensure this field has no more than {} characters.",
                MAX_TITLE_LENGTH
            ),
        ),
        Some(_) => {}
    }

    let note_type = match form.note_type.as_deref().map(str::trim) {
        None | Some("") => Some(NoteType::default()),
        Some(value) => {
            let parsed = NoteType::parse(value);
            if parsed.is_none() {
                push_error(
                    &mut errors,
                    "note_type",
                    format!("\"{}\" is not a valid choice.", value),
                );
            }
            parsed
        }
    };

    let is_premium = match form.is_premium.as_deref() {
        None => Some(false),
        Some(value) => {
            let parsed = parse_bool(value);
            if parsed.is_none() {
                push_error(&mut errors, "is_premium", "Must be a valid boolean.");
            }
            parsed
        }
    };

    match &form.file {
        None => push_error(&mut errors, "file", "No file was submitted."),
        Some(file) => {
            for message in check_file(&file.file_name, file.size, limits) {
                push_error(&mut errors, "file", message);
            }
        }
    }
    if let Some(preview) = &form.preview_file {
        if preview.size > limits.max_upload_bytes() {
            push_error(
                &mut errors,
                "preview_file",
                format!("File size cannot exceed {}MB.", limits.max_upload_size_mb),
            );
        }
    }

    let path = match form.semester.as_deref().map(str::trim) {
        None | Some("") => {
            push_error(&mut errors, "semester", "This field is required.");
            None
        }
        Some(raw) => match raw.parse::<i32>() {
            Err(_) => {
                push_error(
                    &mut errors,
                    "semester",
                    "Incorrect type. Expected pk value, received str.",
                );
                None
            }
            Ok(id) => match catalog::semester_path(db, id).await {
                Ok(path) => Some(path),
                Err(ServiceError::NotFound(_)) => {
                    push_error(
                        &mut errors,
                        "semester",
                        format!("Invalid pk \"{}\" - object does not exist.", id),
                    );
                    None
                }
                Err(e) => return Err(e),
            },
        },
    };

    match (title, note_type, is_premium, path, form.file) {
        (Some(title), Some(note_type), Some(is_premium), Some(path), Some(file))
            if errors.is_empty() =>
        {
            Ok(ValidNote {
                title,
                description: form.description.filter(|d| !d.trim().is_empty()),
                note_type,
                is_premium,
                path,
                file,
                preview_file: form.preview_file,
            })
        }
        _ => Err(ServiceError::Validation(errors)),
    }
}

/// Keep letters, digits, dots, dashes and underscores.
fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Storage directory of a semester below `prefix`.
pub fn semester_dir(prefix: &str, path: &SemesterPath) -> String {
    format!(
        "{}/{}/{}/{}/{}/semester_{}",
        prefix,
        sanitize_segment(&path.faculty.code),
        sanitize_segment(&path.course.code),
        path.academic_year.year,
        sanitize_segment(&path.year_level.name.replace(' ', "_")),
        path.semester.semester_number
    )
}

/// Base name of an uploaded file, stripped of any client-side directories.
fn base_name(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    sanitize_segment(name)
}

/// Find a free key under `dir`, adding a short random suffix on collision.
async fn free_key(
    storage: &dyn StorageBackend,
    dir: &str,
    file_name: &str,
) -> Result<String, ServiceError> {
    let name = base_name(file_name);
    let mut key = format!("{}/{}", dir, name);
    while storage.exists(&key).await? {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
        let candidate = match name.rsplit_once('.') {
            Some((stem, ext)) => format!("{}_{}.{}", stem, suffix, ext),
            None => format!("{}_{}", name, suffix),
        };
        key = format!("{}/{}", dir, candidate);
    }
    Ok(key)
}

/// Validate, store and persist an uploaded note.
pub async fn upload_note(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    limits: &LimitsConfig,
    form: NoteUpload,
) -> Result<notes::Model, ServiceError> {
    let valid = validate_upload(db, form, limits).await?;

    let file_size = valid.file.data.len() as i64;
    let is_pdf = extension_of(&valid.file.file_name) == "pdf";

    let file_key = free_key(
        storage,
        &semester_dir(NOTES_PREFIX, &valid.path),
        &valid.file.file_name,
    )
    .await?;
    storage.put_object(valid.file.data, &file_key).await?;
    let mut stored = vec![file_key.clone()];

    let mut preview_key = None;
    if let Some(preview) = valid.preview_file {
        let stored_preview = async {
            let key = free_key(
                storage,
                &semester_dir(PREVIEWS_PREFIX, &valid.path),
                &preview.file_name,
            )
            .await?;
            storage.put_object(preview.data, &key).await?;
            Ok::<String, ServiceError>(key)
        }
        .await;
        match stored_preview {
            Ok(key) => {
                stored.push(key.clone());
                preview_key = Some(key);
            }
            Err(e) => {
                discard(storage, &stored).await;
                return Err(e);
            }
        }
    }

    let now = Utc::now().naive_utc();
    let has_preview = is_pdf || preview_key.is_some();
    let inserted = notes::ActiveModel {
        semester_id: Set(valid.path.semester.id),
        title: Set(valid.title),
        description: Set(valid.description),
        file: Set(file_key),
        note_type: Set(valid.note_type),
        uploaded_at: Set(now),
        file_size: Set(Some(file_size)),
        preview_file: Set(preview_key),
        has_preview: Set(has_preview),
        preview_generated_at: Set(has_preview.then(|| now)),
        is_premium: Set(valid.is_premium),
        view_count: Set(0),
        download_count: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(note) => {
            log::info!(
                "Uploaded note {} \"{}\" ({} bytes) to {}",
                note.id,
                note.title,
                file_size,
                note.file
            );
            Ok(note)
        }
        Err(e) => {
            discard(storage, &stored).await;
            Err(e.into())
        }
    }
}

async fn discard(storage: &dyn StorageBackend, keys: &[String]) {
    for key in keys {
        if let Err(e) = storage.delete_object(key).await {
            log::error!("Failed to remove orphaned upload {}: {}", key, e);
        }
    }
}

/// Remove a note's files, then the note with its payment and access rows.
pub async fn delete_note(
    db: &DatabaseConnection,
    storage: &dyn StorageBackend,
    note_id: i32,
) -> Result<cascade::CascadeReport, ServiceError> {
    let note = catalog::get_note(db, note_id).await?;

    storage.delete_object(&note.file).await?;
    if let Some(preview) = &note.preview_file {
        storage.delete_object(preview).await?;
    }

    let txn = db.begin().await?;
    let report = cascade::delete_note(&txn, note).await?;
    txn.commit().await?;

    log::info!("Deleted note {}", note_id);
    Ok(report)
}

pub async fn increment_view_count<C>(db: &C, note: notes::Model) -> Result<notes::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let view_count = note.view_count + 1;
    let mut model: notes::ActiveModel = note.into();
    model.view_count = Set(view_count);
    Ok(model.update(db).await?)
}

pub async fn increment_download_count<C>(
    db: &C,
    note: notes::Model,
) -> Result<notes::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let download_count = note.download_count + 1;
    let mut model: notes::ActiveModel = note.into();
    model.download_count = Set(download_count);
    Ok(model.update(db).await?)
}
