//! JSON error responses.

use crate::error::ServiceError;
use actix_web::http::StatusCode;
use actix_web::{error, web, HttpRequest, HttpResponse, ResponseError};
use serde_json::json;

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Db(_) | ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::NotFound(detail) => {
                HttpResponse::NotFound().json(json!({ "detail": detail }))
            }
            ServiceError::Validation(fields) => HttpResponse::BadRequest().json(fields),
            ServiceError::Db(_) | ServiceError::Storage(_) => {
                log::error!("{}", self);
                HttpResponse::InternalServerError().json(json!({ "detail": self.to_string() }))
            }
        }
    }
}

fn bad_request(detail: String) -> error::Error {
    error::InternalError::from_response(
        detail.clone(),
        HttpResponse::BadRequest().json(json!({ "detail": detail })),
    )
    .into()
}

/// Malformed JSON bodies answer 400 with a detail message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = match &err {
            error::JsonPayloadError::Deserialize(e) => format!("JSON parse error - {}", e),
            other => other.to_string(),
        };
        bad_request(detail)
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| bad_request(err.to_string()))
}

/// Unparsable path segments (e.g. a non-numeric id) are treated as missing.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        error::InternalError::from_response(
            err.to_string(),
            HttpResponse::NotFound().json(json!({ "detail": "Not found." })),
        )
        .into()
    })
}

/// Fallback for unrouted requests.
pub async fn not_found(_req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "detail": "Not found." }))
}
