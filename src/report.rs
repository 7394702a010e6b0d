//! Printable summaries of a bound computation.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::bound::Analysis;
use crate::graph::FlowGraph;
use crate::reference::CriticalPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub vertices: Vec<String>,
    pub edges: Vec<(String, String)>,
    pub capacities: BTreeMap<String, u32>,
    pub queries: Vec<String>,
}

impl GraphSummary {
    pub fn of(graph: &FlowGraph) -> Self {
        Self {
            vertices: graph.names().to_vec(),
            edges: graph
                .edges()
                .map(|(u, v)| (graph.name(u).to_string(), graph.name(v).to_string()))
                .collect(),
            capacities: (0..graph.len())
                .map(|v| (graph.name(v).to_string(), graph.capacity(v)))
                .collect(),
            queries: graph
                .query_vertices()
                .map(|v| graph.name(v).to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentSummary {
    pub id: usize,
    pub members: Vec<String>,
    pub internal_bound: u32,
    /// Component DP: best value over predecessor components.
    pub arrival: u32,
    /// Component DP: `arrival + internal_bound`.
    pub dp_value: u32,
    /// Best score of a walk ending in this component.
    pub best_ending_here: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSummary {
    pub bound: u32,
    pub critical_path: Vec<String>,
    pub agrees: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundReport {
    pub graph: GraphSummary,
    /// Components in topological order of the condensation.
    pub components: Vec<ComponentSummary>,
    pub condensation_edges: Vec<(usize, usize)>,
    pub bound: u32,
    pub coarse_bound: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceSummary>,
}

impl BoundReport {
    pub fn new(graph: &FlowGraph, analysis: &Analysis) -> Self {
        let components = analysis
            .order
            .iter()
            .map(|&id| ComponentSummary {
                id,
                members: analysis
                    .partition
                    .component(id)
                    .members
                    .iter()
                    .map(|&v| graph.name(v).to_string())
                    .collect(),
                internal_bound: analysis.internal_bounds[id],
                arrival: analysis.component_dp.arrival[id],
                dp_value: analysis.component_dp.value[id],
                best_ending_here: analysis.boundary_dp.component_best[id],
            })
            .collect();
        Self {
            graph: GraphSummary::of(graph),
            components,
            condensation_edges: analysis.condensation.edges(),
            bound: analysis.bound(),
            coarse_bound: analysis.coarse_bound(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, graph: &FlowGraph, path: &CriticalPath) -> Self {
        self.reference = Some(ReferenceSummary {
            bound: path.score,
            critical_path: graph.walk_names(&path.walk),
            agrees: path.score == self.bound,
        });
        self
    }

    /// False only when a reference result is attached and disagrees.
    pub fn is_consistent(&self) -> bool {
        self.reference.as_ref().is_none_or(|r| r.agrees)
    }

    pub fn render_human(&self) -> String {
        let g = &self.graph;
        let edges: Vec<String> = g.edges.iter().map(|(u, v)| format!("{} -> {}", u, v)).collect();
        let caps: Vec<String> = g
            .capacities
            .iter()
            .map(|(v, c)| format!("{}={}", v, c))
            .collect();

        let mut out = format!(
            "Vertices: {}\nEdges: {}\nCapacities: {}\nQuery vertices: {}\n",
            g.vertices.join(", "),
            edges.join(", "),
            caps.join(", "),
            g.queries.join(", ")
        );

        out.push_str("\n=== Components ===\n");
        for c in &self.components {
            out.push_str(&format!(
                "  [{}] {}  internal={} arrival={} dp={}\n",
                c.id,
                c.members.join(", "),
                c.internal_bound,
                c.arrival,
                c.dp_value
            ));
        }

        out.push_str("\n=== Bounds ===\n");
        out.push_str(&format!("Adaptivity bound:     {}\n", self.bound));
        out.push_str(&format!("Component estimate:   {}\n", self.coarse_bound));
        if let Some(r) = &self.reference {
            let verdict = if r.agrees { "agrees" } else { "DISAGREES" };
            out.push_str(&format!("Reference enumerator: {} ({})\n", r.bound, verdict));
            out.push_str(&format!(
                "Critical path:        {}\n",
                r.critical_path.join(" -> ")
            ));
        }
        out.push_str("Interpretation: max # of query steps along a capacity-respecting walk.\n");
        out
    }
}
