//! routeprom demo server
//!
//! Starts an Axum web server whose routes are instrumented with route-templated
//! Prometheus metrics.

use clap::Parser;
use routeprom::{
    Prometheus, app,
    cli::{Cli, Command, generate_config_template},
    config::Config,
    telemetry,
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(Command::Config { output }) = cli.command {
        match output {
            Some(path) => std::fs::write(&path, generate_config_template())?,
            None => print!("{}", generate_config_template()),
        }
        return Ok(());
    }

    // Load configuration
    let config = Config::from_file(&cli.config)?;

    // Initialize telemetry
    telemetry::init(&config.observability);

    // Registration failures are fatal
    let prometheus = Prometheus::new(config.metrics.clone())?;
    let app = app::router(&prometheus);

    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| std::net::IpAddr::from([0, 0, 0, 0])),
        config.server.port,
    ));

    tracing::info!("Listening on {}", addr);
    tracing::info!(
        "Metrics available at http://{}{}",
        addr,
        config.metrics.path()
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
