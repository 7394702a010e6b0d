//! The flow graph model: steps as vertices, dependencies as directed edges,
//! per-step revisit capacities and the set of query steps.
//!
//! A [`FlowGraph`] is immutable once built. Vertex names are interned to dense
//! [`VertexIdx`] values in insertion order so the algorithms in [`crate::scc`],
//! [`crate::search`] and [`crate::reference`] can work on plain adjacency lists.

use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Dense index of a vertex inside one [`FlowGraph`].
pub type VertexIdx = usize;

/// Capacity of a vertex that has no explicit entry.
pub const DEFAULT_CAPACITY: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("undeclared vertex '{vertex}' referenced by {referenced_by}")]
    UndeclaredVertex {
        vertex: String,
        referenced_by: String,
    },
}

/// What to do with a name that is referenced (by an edge, a capacity entry or
/// a query tag) but was never declared as a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndeclaredPolicy {
    /// Declare it implicitly with the default capacity.
    #[default]
    Declare,
    /// Fail with [`GraphError::UndeclaredVertex`].
    Reject,
}

/// Incremental construction of a [`FlowGraph`].
///
/// Vertices keep the order of their first declaration. Duplicate edges are
/// dropped, keeping the position of the first occurrence in the successor list.
///
/// ```
/// use adaptbound::graph::GraphBuilder;
///
/// let mut builder = GraphBuilder::new();
/// builder.add_vertex("load");
/// builder.add_edge("load", "fit").unwrap();
/// builder.mark_query("fit").unwrap();
/// let graph = builder.build();
/// assert_eq!(graph.len(), 2);
/// assert!(graph.is_query(graph.index_of("fit").unwrap()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    policy: UndeclaredPolicy,
    names: Vec<String>,
    index: HashMap<String, VertexIdx>,
    adj: Vec<Vec<VertexIdx>>,
    seen_edges: HashSet<(VertexIdx, VertexIdx)>,
    capacities: Vec<u32>,
    queries: Vec<bool>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: UndeclaredPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Declares a vertex. Returns the existing index if it was already declared.
    pub fn add_vertex(&mut self, name: &str) -> VertexIdx {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        self.adj.push(Vec::new());
        self.capacities.push(DEFAULT_CAPACITY);
        self.queries.push(false);
        idx
    }

    fn resolve(
        &mut self,
        name: &str,
        referenced_by: impl FnOnce() -> String,
    ) -> Result<VertexIdx, GraphError> {
        if let Some(&idx) = self.index.get(name) {
            return Ok(idx);
        }
        let referenced_by = referenced_by();
        match self.policy {
            UndeclaredPolicy::Declare => {
                warn!("implicitly declaring vertex '{}' referenced by {}", name, referenced_by);
                Ok(self.add_vertex(name))
            }
            UndeclaredPolicy::Reject => Err(GraphError::UndeclaredVertex {
                vertex: name.to_string(),
                referenced_by,
            }),
        }
    }

    /// Adds the directed edge `from -> to`.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let describe = || format!("edge {} -> {}", from, to);
        let u = self.resolve(from, describe)?;
        let v = self.resolve(to, describe)?;
        if self.seen_edges.insert((u, v)) {
            self.adj[u].push(v);
        } else {
            trace!("dropping duplicate edge {} -> {}", from, to);
        }
        Ok(())
    }

    /// Sets the capacity of a vertex, replacing any earlier value.
    pub fn set_capacity(&mut self, name: &str, capacity: u32) -> Result<(), GraphError> {
        let v = self.resolve(name, || "a capacity entry".to_string())?;
        self.capacities[v] = capacity;
        Ok(())
    }

    pub fn mark_query(&mut self, name: &str) -> Result<(), GraphError> {
        let v = self.resolve(name, || "a query tag".to_string())?;
        self.queries[v] = true;
        Ok(())
    }

    pub fn build(self) -> FlowGraph {
        FlowGraph {
            names: self.names,
            index: self.index,
            adj: self.adj,
            capacities: self.capacities,
            queries: self.queries,
        }
    }
}

/// An immutable flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowGraph {
    names: Vec<String>,
    index: HashMap<String, VertexIdx>,
    adj: Vec<Vec<VertexIdx>>,
    capacities: Vec<u32>,
    queries: Vec<bool>,
}

impl FlowGraph {
    /// Builds a graph from resolved parts.
    ///
    /// References are resolved in this order: declared vertices, edges,
    /// capacity entries (sorted by name), query tags. Under
    /// [`UndeclaredPolicy::Declare`] implicit vertices are therefore appended
    /// in order of first reference.
    pub fn from_parts<S: AsRef<str>>(
        vertices: &[S],
        edges: &[(S, S)],
        capacities: &HashMap<S, u32>,
        queries: &[S],
        policy: UndeclaredPolicy,
    ) -> Result<Self, GraphError> {
        let mut builder = GraphBuilder::with_policy(policy);
        for v in vertices {
            builder.add_vertex(v.as_ref());
        }
        for (from, to) in edges {
            builder.add_edge(from.as_ref(), to.as_ref())?;
        }
        let mut entries: Vec<(&str, u32)> =
            capacities.iter().map(|(k, &c)| (k.as_ref(), c)).collect();
        entries.sort_unstable();
        for (name, capacity) in entries {
            builder.set_capacity(name, capacity)?;
        }
        for q in queries {
            builder.mark_query(q.as_ref())?;
        }
        Ok(builder.build())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, v: VertexIdx) -> &str {
        &self.names[v]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<VertexIdx> {
        self.index.get(name).copied()
    }

    pub fn successors(&self, v: VertexIdx) -> &[VertexIdx] {
        &self.adj[v]
    }

    pub fn adjacency(&self) -> &[Vec<VertexIdx>] {
        &self.adj
    }

    pub fn capacity(&self, v: VertexIdx) -> u32 {
        self.capacities[v]
    }

    pub fn is_query(&self, v: VertexIdx) -> bool {
        self.queries[v]
    }

    /// Score contributed by one occurrence of `v` on a walk.
    pub fn gain(&self, v: VertexIdx) -> u32 {
        u32::from(self.queries[v])
    }

    pub fn has_edge(&self, from: VertexIdx, to: VertexIdx) -> bool {
        self.adj[from].contains(&to)
    }

    pub fn edge_count(&self) -> usize {
        self.adj.iter().map(Vec::len).sum()
    }

    /// All edges, grouped by source in vertex order.
    pub fn edges(&self) -> impl Iterator<Item = (VertexIdx, VertexIdx)> + '_ {
        self.adj
            .iter()
            .enumerate()
            .flat_map(|(u, succs)| succs.iter().map(move |&v| (u, v)))
    }

    pub fn query_vertices(&self) -> impl Iterator<Item = VertexIdx> + '_ {
        (0..self.len()).filter(|&v| self.queries[v])
    }

    /// Whether `walk` follows edges and respects every capacity.
    /// The empty walk is valid.
    pub fn is_valid_walk(&self, walk: &[VertexIdx]) -> bool {
        if walk.iter().any(|&v| v >= self.len()) {
            return false;
        }
        if !walk.windows(2).all(|pair| self.has_edge(pair[0], pair[1])) {
            return false;
        }
        let mut visits = vec![0u32; self.len()];
        for &v in walk {
            visits[v] += 1;
            if visits[v] > self.capacities[v] {
                return false;
            }
        }
        true
    }

    pub fn walk_score(&self, walk: &[VertexIdx]) -> u32 {
        walk.iter().map(|&v| self.gain(v)).sum()
    }

    pub fn walk_names(&self, walk: &[VertexIdx]) -> Vec<String> {
        walk.iter().map(|&v| self.names[v].clone()).collect()
    }
}
