//! Strongly connected component decomposition.
//!
//! Tarjan's algorithm in O(V + E), written with an explicit call stack so a
//! long dependency chain cannot overflow the native stack.
//! Reference: Tarjan, "Depth-First Search and Linear Graph Algorithms," SIAM 1972.

use crate::graph::{FlowGraph, VertexIdx};

/// Position of a component inside an [`SccPartition`].
pub type ComponentId = usize;

// ─────────────────────────────────────────────────────────────────────────────
// Tarjan's SCC Algorithm (Iterative)
// ─────────────────────────────────────────────────────────────────────────────

/// A strongly connected component: a maximal set of vertices where every
/// vertex is reachable from every other vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Member vertices in ascending index order.
    pub members: Vec<VertexIdx>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Finds all strongly connected components of the graph given by `adj`.
///
/// # Arguments
/// * `num_nodes`: total number of vertices (indices are 0..num_nodes)
/// * `adj`: adjacency list: adj[u] = successors of u
///
/// # Returns
/// All components in reverse topological order of the condensation. Every
/// vertex appears in exactly one component; self-loops and parallel edges do
/// not change the result.
///
/// # Example
/// ```
/// use adaptbound::scc::tarjan_scc;
///
/// // 0 → 1 → 2 → 0, plus 2 → 3
/// let adj = vec![vec![1], vec![2], vec![0, 3], vec![]];
/// let sccs = tarjan_scc(4, &adj);
/// assert_eq!(sccs.len(), 2);
/// assert_eq!(sccs[0].members, vec![3]);
/// assert_eq!(sccs[1].members, vec![0, 1, 2]);
/// ```
pub fn tarjan_scc(num_nodes: usize, adj: &[Vec<VertexIdx>]) -> Vec<Component> {
    const UNVISITED: usize = usize::MAX;
    let mut index = vec![UNVISITED; num_nodes];
    let mut lowlink = vec![0usize; num_nodes];
    let mut on_stack = vec![false; num_nodes];

    let mut open: Vec<VertexIdx> = Vec::new();
    let mut next_index = 0usize;
    let mut result: Vec<Component> = Vec::new();

    struct Frame {
        node: VertexIdx,
        next_neighbor: usize,
    }

    for start in 0..num_nodes {
        if index[start] != UNVISITED {
            continue;
        }

        index[start] = next_index;
        lowlink[start] = next_index;
        next_index += 1;
        open.push(start);
        on_stack[start] = true;
        let mut call_stack = vec![Frame {
            node: start,
            next_neighbor: 0,
        }];

        while let Some(frame) = call_stack.last_mut() {
            let v = frame.node;

            if let Some(&w) = adj[v].get(frame.next_neighbor) {
                frame.next_neighbor += 1;

                if index[w] == UNVISITED {
                    // Tree edge
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    open.push(w);
                    on_stack[w] = true;
                    call_stack.push(Frame {
                        node: w,
                        next_neighbor: 0,
                    });
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            if lowlink[v] == index[v] {
                let mut members = Vec::new();
                while let Some(w) = open.pop() {
                    on_stack[w] = false;
                    members.push(w);
                    if w == v {
                        break;
                    }
                }
                members.sort_unstable();
                result.push(Component { members });
            }

            call_stack.pop();
            if let Some(parent) = call_stack.last() {
                let p = parent.node;
                lowlink[p] = lowlink[p].min(lowlink[v]);
            }
        }
    }

    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Partition with membership lookup
// ─────────────────────────────────────────────────────────────────────────────

/// The SCC partition of a [`FlowGraph`] together with a vertex → component map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SccPartition {
    components: Vec<Component>,
    component_of: Vec<ComponentId>,
}

impl SccPartition {
    pub fn of(graph: &FlowGraph) -> Self {
        Self::from_adjacency(graph.len(), graph.adjacency())
    }

    pub fn from_adjacency(num_nodes: usize, adj: &[Vec<VertexIdx>]) -> Self {
        let components = tarjan_scc(num_nodes, adj);
        let mut component_of = vec![0; num_nodes];
        for (id, component) in components.iter().enumerate() {
            for &v in &component.members {
                component_of[v] = id;
            }
        }
        Self {
            components,
            component_of,
        }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id]
    }

    pub fn component_of(&self, v: VertexIdx) -> ComponentId {
        self.component_of[v]
    }

    pub fn same_component(&self, u: VertexIdx, v: VertexIdx) -> bool {
        self.component_of[u] == self.component_of[v]
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Size of the largest component (0 for the empty graph).
    pub fn largest(&self) -> usize {
        self.components.iter().map(Component::len).max().unwrap_or(0)
    }
}
