//! Application state for the web layer.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::Graph;
use crate::metrics::PipelineMetrics;
use crate::scoring::JourneyAnalyzer;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Road network
    pub graph: Arc<Graph>,

    /// Journey analyzer, owning the feature cache
    pub analyzer: Arc<JourneyAnalyzer>,

    /// Deadline for one analysis request
    pub request_timeout: Duration,
}

impl AppState {
    /// Create a new app state.
    pub fn new(graph: Graph, analyzer: JourneyAnalyzer) -> Self {
        let request_timeout = analyzer.config().performance.request_timeout();
        Self {
            graph: Arc::new(graph),
            analyzer: Arc::new(analyzer),
            request_timeout,
        }
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        self.analyzer.metrics()
    }
}
