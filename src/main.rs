use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use was_lib::config::{CliOverrides, ServiceConfig};
use was_lib::scan::ScanOrchestrator;
use was_lib::server;

/// Web Analysis Service - headless accessibility scanning over HTTP.
#[derive(Parser, Debug)]
#[command(name = "was")]
#[command(version)]
#[command(about = "Web Analysis Service - headless accessibility scanning over HTTP")]
struct Args {
    /// Port to listen on (falls back to PORT, then 3003)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Insights service base URL (falls back to INSIGHTS_SERVICE_URL)
    #[arg(long)]
    insights_url: Option<String>,

    /// Node.js command used to drive the headless browser
    #[arg(long)]
    node_command: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::resolve(CliOverrides {
        host: args.host,
        port: args.port,
        insights_url: args.insights_url,
        node_command: args.node_command,
    });
    let addr = format!("{}:{}", config.host, config.port);

    let orchestrator = match ScanOrchestrator::new(config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            error!("failed to initialize scanner: {err}");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!("{} on http://{addr}", server::SERVICE_NAME);
    if let Err(err) = axum::serve(listener, server::router(orchestrator)).await {
        error!("server error: {err}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
