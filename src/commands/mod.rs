pub mod bound;
pub mod components;
pub mod demo;
pub mod naive;
pub mod path;

use anyhow::Result;
use std::path::Path;

use adaptbound::{BoundEngine, Config, FlowGraph, load_pipeline};

/// Loads a pipeline file under the configured undeclared-vertex policy.
pub fn load_graph(file: &Path, config: &Config) -> Result<FlowGraph> {
    load_pipeline(file, config.graph.undeclared)
}

pub fn engine(config: &Config) -> BoundEngine {
    BoundEngine::new(config.limits)
}
