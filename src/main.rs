use dotenv::dotenv;
use log::{error, info};

use pm_agent_relay::config::{self, RelayConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config::log_filter_from_env()));

    info!("Starting PM agent relay");

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    pm_agent_relay::run(config).await
}
