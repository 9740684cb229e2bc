use actix_web::web;

pub mod health;
pub mod sessions;

/// Register every route. `main.rs` adds logging middleware around this;
/// tests mount it bare.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Sessions: /api/sessions/**
    cfg.service(web::scope("/api/sessions").configure(sessions::configure_routes));

    // Device callbacks: /api/callbacks
    cfg.service(web::scope("/api/callbacks").configure(sessions::configure_callback_routes));
}
