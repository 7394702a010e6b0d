//! Composition of per-component results over the condensation.
//!
//! Walks can never return to a component they left, so every walk is a chain
//! of segments, one per component, in topological order of the condensation.
//! Two dynamic programs run over that order:
//!
//! * [`compose_components`] adds whole internal bounds along component
//!   chains. It is cheap and never below the true bound, but a component's
//!   best internal walk need not start where the walk enters nor end where it
//!   can leave, so it may overshoot.
//! * [`compose_boundaries`] tracks arrival values per entry vertex and uses
//!   each component's [`BoundaryTable`], which makes it exact.

use crate::bound::BoundError;
use crate::graph::{FlowGraph, VertexIdx};
use crate::scc::{ComponentId, SccPartition};
use crate::search::BoundaryTable;
use petgraph::Direction;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

/// The acyclic graph of components induced by edges that cross components.
#[derive(Debug, Clone)]
pub struct Condensation {
    dag: DiGraph<ComponentId, ()>,
}

impl Condensation {
    /// Maps every edge to its (source component, target component) pair and
    /// keeps the distinct crossing pairs. Node `i` of the result is component `i`.
    pub fn build(graph: &FlowGraph, partition: &SccPartition) -> Self {
        let mut dag = DiGraph::with_capacity(partition.len(), 0);
        for id in 0..partition.len() {
            dag.add_node(id);
        }
        for (u, v) in graph.edges() {
            let (cu, cv) = (partition.component_of(u), partition.component_of(v));
            if cu != cv {
                dag.update_edge(NodeIndex::new(cu), NodeIndex::new(cv), ());
            }
        }
        Self { dag }
    }

    pub fn len(&self) -> usize {
        self.dag.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.dag.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.dag.edge_count()
    }

    /// Distinct component edges, sorted.
    pub fn edges(&self) -> Vec<(ComponentId, ComponentId)> {
        let mut edges: Vec<_> = self
            .dag
            .raw_edges()
            .iter()
            .map(|e| (e.source().index(), e.target().index()))
            .collect();
        edges.sort_unstable();
        edges
    }

    pub fn predecessors(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.dag
            .neighbors_directed(NodeIndex::new(id), Direction::Incoming)
            .map(|n| n.index())
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.dag)
    }

    pub fn topological_order(&self) -> Result<Vec<ComponentId>, BoundError> {
        toposort(&self.dag, None)
            .map(|order| order.into_iter().map(|n| n.index()).collect())
            .map_err(|cycle| BoundError::CyclicCondensation {
                component: cycle.node_id().index(),
            })
    }
}

/// Result of [`compose_components`], indexed by component.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentDp {
    /// Best value over immediate predecessors, 0 without predecessors.
    pub arrival: Vec<u32>,
    /// `arrival + internal bound`.
    pub value: Vec<u32>,
    pub bound: u32,
}

/// Component-level DP: `value(c) = max(value(p) for p -> c, default 0) + internal(c)`.
pub fn compose_components(
    condensation: &Condensation,
    order: &[ComponentId],
    internal: &[u32],
) -> Result<ComponentDp, BoundError> {
    let mut arrival = vec![0u32; condensation.len()];
    let mut value = vec![0u32; condensation.len()];
    for &c in order {
        arrival[c] = condensation
            .predecessors(c)
            .map(|p| value[p])
            .max()
            .unwrap_or(0);
        value[c] = arrival[c]
            .checked_add(internal[c])
            .ok_or(BoundError::ScoreOverflow)?;
    }
    let bound = value.iter().copied().max().unwrap_or(0);
    Ok(ComponentDp {
        arrival,
        value,
        bound,
    })
}

/// Result of [`compose_boundaries`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundaryDp {
    /// Per vertex: best score of a walk prefix that enters it from another
    /// component, 0 when it is only reachable as a fresh start.
    pub entry: Vec<u32>,
    /// Per vertex: best score of a walk ending there, `None` if no walk can.
    pub exit: Vec<Option<u32>>,
    /// Per component: best score of a walk ending inside it.
    pub component_best: Vec<u32>,
    pub bound: u32,
}

/// Vertex-level DP over the condensation order.
///
/// `exit(t) = max(entry(s) + table[s][t])` over start vertices `s` of the
/// component of `t`, and `entry(v) = max(0, exit(u))` over crossing edges `u -> v`.
pub fn compose_boundaries(
    graph: &FlowGraph,
    partition: &SccPartition,
    order: &[ComponentId],
    tables: &[BoundaryTable],
) -> Result<BoundaryDp, BoundError> {
    let mut entry = vec![0u32; graph.len()];
    let mut exit: Vec<Option<u32>> = vec![None; graph.len()];
    let mut component_best = vec![0u32; partition.len()];

    for &c in order {
        let table = &tables[c];
        let members: &[VertexIdx] = table.members();
        for (t_local, &t) in members.iter().enumerate() {
            let mut best: Option<u32> = None;
            for (s_local, &s) in members.iter().enumerate() {
                let Some(inside) = table.best(s_local, t_local) else {
                    continue;
                };
                let score = entry[s]
                    .checked_add(inside)
                    .ok_or(BoundError::ScoreOverflow)?;
                best = Some(best.map_or(score, |b| b.max(score)));
            }
            exit[t] = best;
            let Some(best) = best else { continue };
            component_best[c] = component_best[c].max(best);
            for &w in graph.successors(t) {
                if partition.component_of(w) != c {
                    entry[w] = entry[w].max(best);
                }
            }
        }
    }

    let bound = exit.iter().flatten().copied().max().unwrap_or(0);
    Ok(BoundaryDp {
        entry,
        exit,
        component_best,
        bound,
    })
}
