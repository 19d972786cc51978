//! Error type shared by the catalog, content, student and note services.

use crate::storage::StorageError;
use derive_more::Display;
use sea_orm::DbErr;
use std::collections::BTreeMap;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used for errors that do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Display)]
pub enum ServiceError {
    /// A looked-up row does not exist.
    #[display(fmt = "{}", _0)]
    NotFound(String),
    /// Input rejected; reported per field.
    #[display(fmt = "Validation failed: {:?}", _0)]
    Validation(FieldErrors),
    #[display(fmt = "Database error: {}", _0)]
    Db(DbErr),
    #[display(fmt = "Storage error: {}", _0)]
    Storage(StorageError),
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }

    /// A validation error on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ServiceError::Validation(errors)
    }

    /// A validation error not tied to one field.
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }
}

impl From<DbErr> for ServiceError {
    fn from(e: DbErr) -> Self {
        ServiceError::Db(e)
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, kind) in errors.errors() {
            if let ValidationErrorsKind::Field(list) = kind {
                let messages = list
                    .iter()
                    .map(|error| match &error.message {
                        Some(message) => message.to_string(),
                        None => default_message(&error.code),
                    })
                    .collect();
                fields.insert(field.to_string(), messages);
            }
        }
        ServiceError::Validation(fields)
    }
}

fn default_message(code: &str) -> String {
    match code {
        "email" => "Enter a valid email address.".to_string(),
        "url" => "Enter a valid URL.".to_string(),
        "length" => "Ensure this field has a valid length.".to_string(),
        "range" => "Ensure this value is within the allowed range.".to_string(),
        "required" => "This field is required.".to_string(),
        other => format!("Invalid value ({}).", other),
    }
}
