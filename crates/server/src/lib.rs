//! StudyChat HTTP server
//!
//! Stateless JSON API over the prompt pipeline: the client keeps the
//! conversation and sends recent history with every message.

pub mod routes;
pub mod state;
pub mod types;

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use studychat_common::{AppConfig, Result};
use tracing::info;
use tracing_actix_web::TracingLogger;

pub use state::AppState;

/// Register the `/api` routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(routes::chat::chat)
            .service(routes::token::test_token)
            .service(routes::models::list_models),
    );
}

/// Cross-origin policy applied to every response
pub fn cors() -> Cors {
    Cors::permissive()
}

/// Security headers applied to every response
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Permissions-Policy", "camera=(), microphone=(), geolocation=()"))
}

/// Run the HTTP server until shutdown
pub async fn start_server(config: AppConfig) -> Result<()> {
    let bind_address = config.server_bind_address();
    let state = web::Data::new(Arc::new(AppState::new(config)?));

    info!("Starting StudyChat server on http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors())
            .wrap(security_headers())
            .wrap(TracingLogger::default())
            .configure(configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
