use actix_web::{get, web, HttpResponse};
use std::sync::Arc;

use crate::state::AppState;
use crate::types::ModelsResponse;

/// List the selectable models
#[get("/models")]
pub async fn list_models(state: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(ModelsResponse {
        models: state.pipeline.catalog().iter().collect(),
        default: &state.config.default_model,
    })
}

#[cfg(test)]
mod tests {
    use crate::configure;
    use crate::test_support::test_state;
    use actix_web::App;
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_list_models() {
        let app = test::init_service(
            App::new().app_data(test_state(None)).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/models").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Value = test::read_body_json(resp).await;
        let models = body["models"].as_array().unwrap();
        assert_eq!(models.len(), 7);
        assert_eq!(models[0]["id"], "microsoft/DialoGPT-medium");
        assert!(models.iter().all(|m| m.get("params").is_none()));
        assert_eq!(body["default"], "microsoft/DialoGPT-medium");
    }
}
