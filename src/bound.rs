//! The bound computation pipeline and its call-level entry points.
//!
//! ```text
//! FlowGraph ─► SccPartition ─► ComponentSearch (per component) ─► compose ─► bound
//!     └──────────────────────► ReferenceEnumerator ─────────────────────────► bound + critical path
//! ```

use crate::compose::{
    BoundaryDp, ComponentDp, Condensation, compose_boundaries, compose_components,
};
use crate::graph::{FlowGraph, GraphError, UndeclaredPolicy};
use crate::reference::{CriticalPath, ReferenceEnumerator};
use crate::scc::{ComponentId, SccPartition};
use crate::search::{BoundaryTable, ComponentSearch};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundError {
    #[error("component {component} too large to bound exactly: {size} vertices, limit {limit}")]
    ComponentTooLarge {
        component: ComponentId,
        size: usize,
        limit: usize,
    },
    #[error("search over component {component} exceeded the budget of {limit} memoized states")]
    SearchBudgetExceeded { component: ComponentId, limit: usize },
    #[error("graph too large for exhaustive enumeration: {size} vertices, limit {limit}")]
    GraphTooLarge { size: usize, limit: usize },
    #[error("exhaustive enumeration exceeded the budget of {limit} steps")]
    EnumerationBudgetExceeded { limit: u64 },
    #[error("adaptivity bound exceeds u32::MAX")]
    ScoreOverflow,
    #[error("condensation contains a cycle through component {component}")]
    CyclicCondensation { component: ComponentId },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Size guards for the exponential searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest component the exact search accepts.
    pub max_component_vertices: usize,
    /// Memoized states one component search may hold.
    pub max_search_states: usize,
    /// Largest graph the reference enumerator accepts.
    pub max_reference_vertices: usize,
    /// Walk extensions the reference enumerator may perform.
    pub max_reference_steps: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_component_vertices: 16,
            max_search_states: 2_000_000,
            max_reference_vertices: 16,
            max_reference_steps: 50_000_000,
        }
    }
}

/// Everything the decomposed pipeline derives from one graph.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub partition: SccPartition,
    pub condensation: Condensation,
    /// Components in topological order of the condensation.
    pub order: Vec<ComponentId>,
    /// Internal bound per component.
    pub internal_bounds: Vec<u32>,
    pub component_dp: ComponentDp,
    pub boundary_dp: BoundaryDp,
}

impl Analysis {
    /// The adaptivity bound.
    pub fn bound(&self) -> u32 {
        self.boundary_dp.bound
    }

    /// The component-level upper estimate, never below [`Self::bound`].
    pub fn coarse_bound(&self) -> u32 {
        self.component_dp.bound
    }
}

/// Runs the bound algorithms under a fixed set of [`Limits`].
///
/// The engine holds no state besides its limits; one engine can serve any
/// number of graphs, from any number of threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundEngine {
    limits: Limits,
}

impl BoundEngine {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn decompose(
        &self,
        graph: &FlowGraph,
    ) -> Result<(SccPartition, Condensation, Vec<ComponentId>, Vec<ComponentSearch>), BoundError>
    {
        let partition = SccPartition::of(graph);
        let condensation = Condensation::build(graph, &partition);
        let order = condensation.topological_order()?;
        debug!(
            "{} vertices in {} components (largest {}), {} condensation edges",
            graph.len(),
            partition.len(),
            partition.largest(),
            condensation.edge_count()
        );
        let searches = partition
            .components()
            .iter()
            .enumerate()
            .map(|(id, component)| ComponentSearch::new(graph, id, component, &self.limits))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((partition, condensation, order, searches))
    }

    /// Full decomposition with both composition variants.
    pub fn analyze(&self, graph: &FlowGraph) -> Result<Analysis, BoundError> {
        let (partition, condensation, order, searches) = self.decompose(graph)?;
        let tables = searches
            .iter()
            .map(ComponentSearch::boundary_table)
            .collect::<Result<Vec<_>, _>>()?;
        let internal_bounds: Vec<u32> = tables.iter().map(BoundaryTable::max).collect();
        let component_dp = compose_components(&condensation, &order, &internal_bounds)?;
        let boundary_dp = compose_boundaries(graph, &partition, &order, &tables)?;
        info!(
            "adaptivity bound {} (component estimate {})",
            boundary_dp.bound, component_dp.bound
        );
        Ok(Analysis {
            partition,
            condensation,
            order,
            internal_bounds,
            component_dp,
            boundary_dp,
        })
    }

    /// The exact adaptivity bound via SCC decomposition.
    pub fn bound(&self, graph: &FlowGraph) -> Result<u32, BoundError> {
        let (partition, _, order, searches) = self.decompose(graph)?;
        let tables = searches
            .iter()
            .map(ComponentSearch::boundary_table)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(compose_boundaries(graph, &partition, &order, &tables)?.bound)
    }

    /// Component-level estimate: internal bounds added along component chains.
    pub fn bound_coarse(&self, graph: &FlowGraph) -> Result<u32, BoundError> {
        let (_, condensation, order, searches) = self.decompose(graph)?;
        let internal = searches
            .iter()
            .map(ComponentSearch::internal_bound)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(compose_components(&condensation, &order, &internal)?.bound)
    }

    /// Bound from the decomposition-free reference enumerator.
    pub fn bound_naive(&self, graph: &FlowGraph) -> Result<u32, BoundError> {
        ReferenceEnumerator::new(graph, &self.limits)?.bound()
    }

    pub fn critical_path(&self, graph: &FlowGraph) -> Result<CriticalPath, BoundError> {
        ReferenceEnumerator::new(graph, &self.limits)?.critical_path()
    }
}

fn lenient_graph<S: AsRef<str>>(
    vertices: &[S],
    edges: &[(S, S)],
    capacities: &HashMap<S, u32>,
    query_set: &[S],
) -> Result<FlowGraph, BoundError> {
    Ok(FlowGraph::from_parts(
        vertices,
        edges,
        capacities,
        query_set,
        UndeclaredPolicy::Declare,
    )?)
}

/// Adaptivity bound of the graph given by its parts, with default limits.
///
/// Vertices referenced by edges, capacities or queries but missing from
/// `vertices` are declared implicitly with capacity 1.
///
/// ```
/// use std::collections::HashMap;
///
/// let edges = [("a", "b"), ("b", "c")];
/// let bound = adaptbound::compute_bound(&["a", "b", "c"], &edges, &HashMap::new(), &["a", "c"]).unwrap();
/// assert_eq!(bound, 2);
/// ```
pub fn compute_bound<S: AsRef<str>>(
    vertices: &[S],
    edges: &[(S, S)],
    capacities: &HashMap<S, u32>,
    query_set: &[S],
) -> Result<u32, BoundError> {
    BoundEngine::default().bound(&lenient_graph(vertices, edges, capacities, query_set)?)
}

/// Component-level estimate, see [`BoundEngine::bound_coarse`].
pub fn compute_bound_coarse<S: AsRef<str>>(
    vertices: &[S],
    edges: &[(S, S)],
    capacities: &HashMap<S, u32>,
    query_set: &[S],
) -> Result<u32, BoundError> {
    BoundEngine::default().bound_coarse(&lenient_graph(vertices, edges, capacities, query_set)?)
}

/// Reference bound from exhaustive enumeration of the whole graph.
pub fn compute_bound_naive<S: AsRef<str>>(
    vertices: &[S],
    edges: &[(S, S)],
    capacities: &HashMap<S, u32>,
    query_set: &[S],
) -> Result<u32, BoundError> {
    BoundEngine::default().bound_naive(&lenient_graph(vertices, edges, capacities, query_set)?)
}

/// Reference bound together with one walk achieving it, as vertex names.
pub fn compute_critical_path<S: AsRef<str>>(
    vertices: &[S],
    edges: &[(S, S)],
    capacities: &HashMap<S, u32>,
    query_set: &[S],
) -> Result<(u32, Vec<String>), BoundError> {
    let graph = lenient_graph(vertices, edges, capacities, query_set)?;
    let path = BoundEngine::default().critical_path(&graph)?;
    Ok((path.score, graph.walk_names(&path.walk)))
}
