pub mod config;
pub mod error;
pub mod model;
pub mod web;

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::{from_fn, Logger},
    web::{Data, JsonConfig},
    App, HttpServer,
};
use anyhow::Context;
use log::{info, warn};

use config::RelayConfig;
use error::RelayError;
use model::CompletionClient;
use web::{cors::CorsPolicy, prompt::PromptTemplate, routes};

// Shared, read-only state for every request
pub struct AppState {
    pub client: CompletionClient,
    pub prompts: PromptTemplate,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> anyhow::Result<Self> {
        let client = CompletionClient::new(config.upstream.clone(), config.prompts.fallback_reply.clone())
            .context("failed to build upstream HTTP client")?;
        Ok(Self {
            client,
            prompts: PromptTemplate::from(&config.prompts),
        })
    }
}

/// Assembles the application: routes, JSON body rules, origin policy and access log.
pub fn build_app(
    state: Data<AppState>,
    cors: Data<CorsPolicy>,
    json_limit: usize,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let json_config = JsonConfig::default()
        .limit(json_limit)
        .error_handler(|err, _req| RelayError::invalid_input(err.to_string()).into());

    App::new()
        .app_data(state)
        .app_data(cors)
        .app_data(json_config)
        .configure(routes::configure)
        .wrap(from_fn(web::cors::cors_middleware))
        .wrap(Logger::default())
}

/// Binds the listener and serves until shutdown.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let state = Data::new(AppState::new(&config)?);
    let cors = Data::new(CorsPolicy::new(&config.cors));
    let json_limit = config.server.json_limit;

    if config.cors.allow_any_origin {
        warn!("CORS_ALLOW_ANY_ORIGIN is on: any website can read relay responses");
    } else {
        info!("Allowed origins: {}", config.cors.allowed_origins.join(", "));
    }
    if config.debug {
        info!("Debug logging enabled");
    }
    info!("PM Agent listening on {}:{}", config.server.host, config.server.port);

    HttpServer::new(move || build_app(state.clone(), cors.clone(), json_limit))
        .bind((config.server.host.as_str(), config.server.port))
        .with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?
        .run()
        .await?;
    Ok(())
}
