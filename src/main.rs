use tracing::info;

use folio::{Config, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("folio.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load folio.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    let log_control = match folio::logging::init(&config.logging) {
        Ok(control) => control,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    info!("Folio - flat-file markdown CMS server");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let server = match WebServer::new(config, log_control) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
