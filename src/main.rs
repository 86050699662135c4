//! Scout: a metasearch aggregator
//!
//! With no arguments this starts the JSON service. Given a capability and a
//! query it runs one aggregation and prints the response.

use anyhow::Result;
use scout::{
    config::{self, Settings},
    engines::EngineLoader,
    network::HttpClient,
    query::{Capability, Query},
    web::{create_router, AppState},
    Aggregator,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if matches!(args.first().map(String::as_str), Some("-h" | "--help")) {
        print_usage();
        return Ok(());
    }
    if matches!(args.first().map(String::as_str), Some("-V" | "--version")) {
        println!("scout {}", scout::VERSION);
        return Ok(());
    }

    // Logs go to stderr so one-shot output stays clean JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = config::load()?;
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    let client = HttpClient::with_settings(&settings.outgoing)?;
    let registry = EngineLoader::load(&settings, client)?;

    if args.is_empty() {
        serve(settings, registry).await
    } else {
        one_shot(&settings, registry, &args).await
    }
}

/// Run one aggregation and print it as pretty JSON
async fn one_shot(
    settings: &Settings,
    registry: scout::AdapterRegistry,
    args: &[String],
) -> Result<()> {
    let parsed = args[0].parse::<Capability>().and_then(|capability| {
        Query::new(
            args[1..].join(" "),
            1,
            settings.search.safe_search,
            settings.search.default_locale,
        )
        .map(|query| (capability, query))
    });
    let (capability, query) = match parsed {
        Ok(pair) => pair,
        Err(err) => {
            print_usage();
            return Err(err.into());
        }
    };

    let aggregator = Aggregator::new(Arc::new(registry));
    let response = aggregator.aggregate(capability, &query).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Start the HTTP service
async fn serve(settings: Settings, registry: scout::AdapterRegistry) -> Result<()> {
    info!("Starting Scout v{}", scout::VERSION);

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    let app = create_router(AppState::new(settings, registry));

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Scout v{}
A metasearch aggregator

USAGE:
    scout                          Start the JSON service
    scout <capability> <query...>  Run one aggregation and print it

CAPABILITIES:
    search, images, videos, news, autocomplete

ENVIRONMENT VARIABLES:
    SCOUT_SETTINGS_PATH    Path to settings.yml
    SCOUT_DEBUG            Enable debug mode (true/false)
    SCOUT_PORT             Server port
    SCOUT_BIND_ADDRESS     Bind address
    SCOUT_REQUEST_TIMEOUT  Per-provider search timeout in seconds
    RUST_LOG               Log filter (default: info)
"#,
        scout::VERSION
    );
}
