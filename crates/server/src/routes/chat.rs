use actix_web::{post, web, HttpResponse};
use std::sync::Arc;
use tracing::{error, info};

use super::error_response;
use crate::state::AppState;
use crate::types::{ChatRequest, ChatResponse, ErrorResponse};

/// Run one message through the prompt pipeline and the active backend
#[post("/chat")]
pub async fn chat(
    req: web::Json<ChatRequest>,
    state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    let req = req.into_inner();

    let (Some(message), Some(model)) = (req.message, req.model) else {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::new("Missing required fields: message or model"));
    };

    let backend = match state.backend_for(req.api_token.as_deref()) {
        Ok(Some(backend)) => backend,
        Ok(None) => {
            return HttpResponse::BadRequest()
                .json(ErrorResponse::new("Missing required fields: message, model, or apiToken"));
        }
        Err(e) => return error_response(&e, Some(&model)),
    };

    let request = match state
        .pipeline
        .build_request(&message, &model, &req.conversation_history)
    {
        Ok(request) => request,
        Err(e) => return error_response(&e, Some(&model)),
    };

    info!(
        "Chat request - Model: {}, Backend: {}, History: {}",
        model,
        backend.name(),
        req.conversation_history.len()
    );

    match backend.generate(&request).await {
        Ok(raw) => {
            let cleaned = state.pipeline.clean_response(&raw, &request);
            HttpResponse::Ok().json(ChatResponse {
                response: cleaned.into_string(),
                model,
            })
        }
        Err(e) => {
            error!(
                "Chat request failed for {}: {} (details: {})",
                model,
                e,
                e.details().as_deref().unwrap_or("none")
            );
            error_response(&e, Some(&model))
        }
    }
}
