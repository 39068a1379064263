pub mod chat;
pub mod models;
pub mod token;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use studychat_common::ChatError;

use crate::types::ErrorResponse;

/// Map a chat error to its HTTP status and JSON body
pub(crate) fn error_response(error: &ChatError, model: Option<&str>) -> HttpResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    HttpResponse::build(status).json(ErrorResponse {
        error: error.user_message(),
        details: error.details(),
        model: model.map(str::to_string),
    })
}
