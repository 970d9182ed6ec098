use std::process;

use internship_core_server::logging::init_logging;
use internship_core_server::ServerConfig;
use tracing::error;

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            if let Some(usage) = e.downcast_ref::<clap::Error>() {
                usage.exit();
            }
            // Logging is not initialised yet.
            eprintln!("Configuration error: {e:#}");
            process::exit(2);
        }
    };
    init_logging(config.log_format);

    if let Err(e) = internship_core_server::run(config).await {
        error!(error = %format!("{e:#}"), "Server stopped with an error");
        process::exit(1);
    }
}
