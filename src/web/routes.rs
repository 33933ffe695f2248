use actix_web::web;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/pm-agent", web::post().to(handlers::pm_agent))
    )
    .route("/", web::get().to(handlers::index))
    .route("/ping", web::get().to(handlers::ping));
}
