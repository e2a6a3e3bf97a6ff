use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bridge_risk::config::Config;
use bridge_risk::domain::Graph;
use bridge_risk::history::InMemoryHistory;
use bridge_risk::metrics::PipelineMetrics;
use bridge_risk::scoring::{AnalyzerSources, JourneyAnalyzer};
use bridge_risk::signals::LatestTickSignals;
use bridge_risk::training;
use bridge_risk::web::{AppState, create_router};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Configuration file if set, else the named preset, else defaults.
fn load_config() -> Result<Config, Box<dyn Error>> {
    if let Ok(path) = std::env::var("BRIDGE_RISK_CONFIG") {
        info!(%path, "Loading configuration file");
        return Ok(Config::load(path)?);
    }
    match std::env::var("BRIDGE_RISK_PROFILE") {
        Ok(name) => Config::preset(&name)
            .ok_or_else(|| format!("unknown configuration profile: {name}").into()),
        Err(_) => Ok(Config::default()),
    }
}

/// History and live signals from a probe-tick export, if one is configured.
fn load_sources() -> Result<AnalyzerSources, Box<dyn Error>> {
    let Ok(path) = std::env::var("BRIDGE_RISK_HISTORY") else {
        warn!("BRIDGE_RISK_HISTORY not set. Predictions will use defaults only.");
        return Ok(AnalyzerSources::default());
    };

    let file = std::fs::File::open(&path)?;
    let ticks = training::load_ndjson(std::io::BufReader::new(file))?;
    let history = InMemoryHistory::from_ticks(&ticks);
    let signals = LatestTickSignals::from_ticks(&ticks);
    info!(%path, ticks = ticks.len(), bridges = history.bridge_count(), "Loaded probe history");

    Ok(AnalyzerSources {
        history: Some(Arc::new(history)),
        signals: Some(Arc::new(signals)),
        traffic: None,
    })
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;

    let graph_path = std::env::var("BRIDGE_RISK_GRAPH")
        .map_err(|_| "BRIDGE_RISK_GRAPH must name a graph JSON file")?;
    let graph = Graph::load(&graph_path)?;
    info!(
        path = %graph_path,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        bridges = graph.bridge_ids().len(),
        "Loaded graph"
    );

    let sources = load_sources()?;
    let analyzer = JourneyAnalyzer::new(config, &graph, sources, Arc::new(PipelineMetrics::new()))?;

    let state = AppState::new(graph, analyzer);
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BRIDGE_RISK_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    info!(%addr, "Bridge risk engine listening");
    info!("  GET  /health           - Health check");
    info!("  GET  /metrics          - Pipeline metrics");
    info!("  POST /paths            - Enumerate candidate paths");
    info!("  POST /journey/analyze  - Score a journey");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}
