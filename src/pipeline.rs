//! Declarative pipeline definitions and their conversion to a [`FlowGraph`].
//!
//! A pipeline is a list of steps. Each step may depend on earlier (or later)
//! steps, carry a weight (its revisit capacity) and be tagged as a query:
//!
//! ```yaml
//! steps:
//!   - name: auth_voter
//!     query: true
//!   - name: retry_policy
//!     weight: 3
//!     depends_on: [auth_voter]
//! ```
//!
//! Files may also give the resolved graph directly with `vertices`, `edges`,
//! `capacities` and `queries`. JSON, YAML and TOML are accepted.

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::graph::{FlowGraph, GraphBuilder, GraphError, UndeclaredPolicy};

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub name: String,
    /// Steps that must run before this one; each contributes `dep -> name`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Revisit capacity, 1 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub query: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl StepDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            depends_on: Vec::new(),
            weight: None,
            query: false,
        }
    }

    pub fn query(mut self) -> Self {
        self.query = true;
        self
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn depends_on(mut self, dep: &str) -> Self {
        self.depends_on.push(dep.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepsDocument {
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedDocument {
    #[serde(default)]
    pub vertices: Vec<String>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
    #[serde(default)]
    pub capacities: HashMap<String, u32>,
    #[serde(default)]
    pub queries: Vec<String>,
}

/// Contents of a pipeline file. A top-level `steps` key selects the step
/// list; anything else is read as a resolved graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PipelineDocument {
    Steps(StepsDocument),
    Resolved(ResolvedDocument),
}

impl PipelineDocument {
    pub fn into_graph(self, policy: UndeclaredPolicy) -> Result<FlowGraph, GraphError> {
        match self {
            PipelineDocument::Steps(doc) => steps_to_graph(&doc.steps, policy),
            PipelineDocument::Resolved(doc) => FlowGraph::from_parts(
                doc.vertices.as_slice(),
                doc.edges.as_slice(),
                &doc.capacities,
                doc.queries.as_slice(),
                policy,
            ),
        }
    }
}

/// Builds the graph of a step list.
///
/// Every step name is declared first, in order, so dependencies on later steps
/// are never "undeclared". Repeated names merge into one vertex.
pub fn steps_to_graph(
    steps: &[StepDefinition],
    policy: UndeclaredPolicy,
) -> Result<FlowGraph, GraphError> {
    for name in duplicate_step_names(steps) {
        log::warn!("step '{}' is defined more than once; definitions are merged", name);
    }
    let mut builder = GraphBuilder::with_policy(policy);
    for step in steps {
        builder.add_vertex(&step.name);
    }
    for step in steps {
        for dep in &step.depends_on {
            builder.add_edge(dep, &step.name)?;
        }
        if let Some(weight) = step.weight {
            builder.set_capacity(&step.name, weight)?;
        }
        if step.query {
            builder.mark_query(&step.name)?;
        }
    }
    Ok(builder.build())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineFormat {
    Json,
    Yaml,
    Toml,
}

impl PipelineFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(PipelineFormat::Json),
            Some("yaml") | Some("yml") => Ok(PipelineFormat::Yaml),
            Some("toml") => Ok(PipelineFormat::Toml),
            _ => bail!(
                "Unsupported pipeline format: {} (expected .json, .yaml, .yml or .toml)",
                path.display()
            ),
        }
    }
}

fn parse_as<T: DeserializeOwned>(content: &str, format: PipelineFormat) -> Result<T> {
    let doc = match format {
        PipelineFormat::Json => serde_json::from_str(content)?,
        PipelineFormat::Yaml => serde_yaml::from_str(content)?,
        PipelineFormat::Toml => toml::from_str(content)?,
    };
    Ok(doc)
}

fn has_steps_key(content: &str, format: PipelineFormat) -> Result<bool> {
    let found = match format {
        PipelineFormat::Json => serde_json::from_str::<serde_json::Value>(content)?
            .get("steps")
            .is_some(),
        PipelineFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(content)?
            .get("steps")
            .is_some(),
        PipelineFormat::Toml => toml::from_str::<toml::Table>(content)?.contains_key("steps"),
    };
    Ok(found)
}

/// Parses a pipeline document. Errors name the offending field of the
/// selected document shape.
pub fn parse_pipeline(content: &str, format: PipelineFormat) -> Result<PipelineDocument> {
    if has_steps_key(content, format)? {
        Ok(PipelineDocument::Steps(parse_as(content, format)?))
    } else {
        Ok(PipelineDocument::Resolved(parse_as(content, format)?))
    }
}

/// Reads a pipeline file and resolves it into a graph.
pub fn load_pipeline(path: &Path, policy: UndeclaredPolicy) -> Result<FlowGraph> {
    let format = PipelineFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline: {}", path.display()))?;
    let doc = parse_pipeline(&content, format)
        .with_context(|| format!("Failed to parse pipeline: {}", path.display()))?;
    let graph = doc
        .into_graph(policy)
        .with_context(|| format!("Invalid pipeline: {}", path.display()))?;
    log::debug!(
        "loaded {} steps and {} edges from {}",
        graph.len(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

/// The voter-flow pipeline used by `adaptbd demo`.
pub fn demo_steps() -> Vec<StepDefinition> {
    vec![
        StepDefinition::new("auth_voter").query().weight(1),
        StepDefinition::new("eligibility_check")
            .query()
            .depends_on("auth_voter")
            .weight(1),
        StepDefinition::new("submit_vote")
            .query()
            .depends_on("eligibility_check")
            .weight(1),
        StepDefinition::new("audit_review")
            .query()
            .depends_on("submit_vote")
            .weight(1),
        StepDefinition::new("finalize_count")
            .query()
            .depends_on("submit_vote")
            .depends_on("audit_review")
            .weight(1),
        StepDefinition::new("retry_policy")
            .depends_on("auth_voter")
            .weight(3),
    ]
}

pub fn demo_graph() -> Result<FlowGraph, GraphError> {
    steps_to_graph(&demo_steps(), UndeclaredPolicy::Reject)
}

/// Names that appear more than once in `steps`.
pub fn duplicate_step_names(steps: &[StepDefinition]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for step in steps {
        if !seen.insert(step.name.as_str()) && !dups.contains(&step.name) {
            dups.push(step.name.clone());
        }
    }
    dups
}
