use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse};
use std::sync::Arc;
use studychat_llm::HuggingFaceClient;
use tracing::info;

use super::error_response;
use crate::state::AppState;
use crate::types::{ErrorResponse, TokenRequest};

/// Check a Hugging Face token against the inference API
#[post("/test-token")]
pub async fn test_token(
    req: web::Json<TokenRequest>,
    state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    let token = req
        .into_inner()
        .api_token
        .filter(|t| !t.trim().is_empty())
        .or_else(|| state.config.hf_api_token.clone());

    let Some(token) = token else {
        return HttpResponse::BadRequest().json(ErrorResponse::new("API token is required"));
    };

    let client = match HuggingFaceClient::new(
        &state.config.hf_api_base_url,
        token,
        state.request_timeout(),
    ) {
        Ok(client) => client,
        Err(e) => return error_response(&e, None),
    };

    match client.verify_token().await {
        Ok(status) if status.valid => HttpResponse::Ok().json(status),
        Ok(status) => {
            info!("Token check rejected: {:?}", status.status);
            let code = status
                .status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            HttpResponse::build(code).json(status)
        }
        Err(e) => error_response(&e, None),
    }
}
