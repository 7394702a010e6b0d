//! Exact bound search inside one strongly connected component.
//!
//! A search state is the current vertex (or "not started yet") together with
//! the remaining capacity of every vertex in the component. The value of a
//! state is the best score any continuation can still add; stopping is always
//! allowed and adds nothing. States are memoized, so each distinct
//! (vertex, remaining capacities) pair is expanded once.
//!
//! The state space is exponential in the component size. Components larger
//! than [`Limits::max_component_vertices`] are refused up front and the memo
//! table is capped by [`Limits::max_search_states`].

use crate::bound::{BoundError, Limits};
use crate::graph::{FlowGraph, VertexIdx};
use crate::scc::{Component, ComponentId};
use log::debug;
use std::collections::HashMap;

/// One component re-indexed to local positions `0..len`.
#[derive(Debug, Clone)]
pub struct ComponentView {
    id: ComponentId,
    members: Vec<VertexIdx>,
    adj: Vec<Vec<usize>>,
    capacities: Box<[u32]>,
    gains: Vec<u32>,
}

impl ComponentView {
    /// Restricts `graph` to the members of `component`; edges leaving the
    /// component are dropped.
    pub fn new(graph: &FlowGraph, id: ComponentId, component: &Component) -> Self {
        let local: HashMap<VertexIdx, usize> = component
            .members
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();
        let adj = component
            .members
            .iter()
            .map(|&u| {
                graph
                    .successors(u)
                    .iter()
                    .filter_map(|w| local.get(w).copied())
                    .collect()
            })
            .collect();
        Self {
            id,
            members: component.members.clone(),
            adj,
            capacities: component.members.iter().map(|&v| graph.capacity(v)).collect(),
            gains: component.members.iter().map(|&v| graph.gain(v)).collect(),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn members(&self) -> &[VertexIdx] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn has_self_loop(&self, i: usize) -> bool {
        self.adj[i].contains(&i)
    }

    /// Local vertices reachable from `start` through vertices with capacity
    /// left, marked `Some(0)`. Empty when `start` itself has no capacity.
    fn open_reach(&self, start: usize) -> Box<[Option<u32>]> {
        let mut reached = vec![None; self.len()].into_boxed_slice();
        if self.capacities[start] == 0 {
            return reached;
        }
        reached[start] = Some(0);
        let mut stack = vec![start];
        while let Some(u) = stack.pop() {
            for &w in &self.adj[u] {
                if self.capacities[w] > 0 && reached[w].is_none() {
                    reached[w] = Some(0);
                    stack.push(w);
                }
            }
        }
        reached
    }

    /// Legal moves out of `state`: any vertex with capacity left before the
    /// walk starts, otherwise successors with capacity left.
    fn choices(&self, state: &SearchState) -> Vec<usize> {
        let open = |&w: &usize| state.remaining[w] > 0;
        match state.at {
            None => (0..self.len()).filter(open).collect(),
            Some(u) => self.adj[u].iter().copied().filter(open).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SearchState {
    at: Option<usize>,
    remaining: Box<[u32]>,
}

impl SearchState {
    fn start(capacities: &[u32]) -> Self {
        Self {
            at: None,
            remaining: capacities.into(),
        }
    }

    fn advance(&self, next: usize) -> Self {
        let mut remaining = self.remaining.clone();
        remaining[next] -= 1;
        Self {
            at: Some(next),
            remaining,
        }
    }
}

/// How the values of successor states fold into the value of a state.
trait Objective {
    type Value: Clone;

    /// Value of stopping at `at` (or of never starting when `None`).
    fn stop(&self, at: Option<usize>) -> Self::Value;

    /// Folds a successor reached by a move worth `gain` into `best`.
    fn absorb(&self, best: &mut Self::Value, child: &Self::Value, gain: u32);
}

/// Best total score.
struct MaxScore;

impl Objective for MaxScore {
    type Value = u32;

    fn stop(&self, _at: Option<usize>) -> u32 {
        0
    }

    fn absorb(&self, best: &mut u32, child: &u32, gain: u32) {
        *best = (*best).max(child + gain);
    }
}

/// Best score per final vertex; `None` where no continuation ends there.
struct ScoreByEnd {
    width: usize,
}

impl Objective for ScoreByEnd {
    type Value = Box<[Option<u32>]>;

    fn stop(&self, at: Option<usize>) -> Self::Value {
        let mut value = vec![None; self.width].into_boxed_slice();
        if let Some(t) = at {
            value[t] = Some(0);
        }
        value
    }

    fn absorb(&self, best: &mut Self::Value, child: &Self::Value, gain: u32) {
        for (slot, reached) in best.iter_mut().zip(child.iter()) {
            if let Some(score) = reached {
                let score = score + gain;
                *slot = Some(slot.map_or(score, |s| s.max(score)));
            }
        }
    }
}

struct Frame<V> {
    state: SearchState,
    gain: u32,
    choices: Vec<usize>,
    next: usize,
    best: V,
}

/// Memoized depth-first evaluation of search states, with an explicit stack.
struct Explorer<'v, O: Objective> {
    view: &'v ComponentView,
    objective: O,
    memo: HashMap<SearchState, O::Value>,
    max_states: usize,
}

impl<'v, O: Objective> Explorer<'v, O> {
    fn new(view: &'v ComponentView, objective: O, max_states: usize) -> Self {
        Self {
            view,
            objective,
            memo: HashMap::new(),
            max_states,
        }
    }

    fn open(&self, state: SearchState, gain: u32) -> Frame<O::Value> {
        let choices = self.view.choices(&state);
        let best = self.objective.stop(state.at);
        Frame {
            state,
            gain,
            choices,
            next: 0,
            best,
        }
    }

    fn value(&mut self, root: SearchState) -> Result<O::Value, BoundError> {
        if let Some(known) = self.memo.get(&root) {
            return Ok(known.clone());
        }
        let key = root.clone();
        let mut stack = vec![self.open(root, 0)];

        while let Some(frame) = stack.last_mut() {
            if let Some(&next) = frame.choices.get(frame.next) {
                frame.next += 1;
                let child = frame.state.advance(next);
                let gain = self.view.gains[next];
                if let Some(known) = self.memo.get(&child) {
                    self.objective.absorb(&mut frame.best, known, gain);
                    continue;
                }
                if self.memo.len() >= self.max_states {
                    return Err(BoundError::SearchBudgetExceeded {
                        component: self.view.id,
                        limit: self.max_states,
                    });
                }
                let child_frame = self.open(child, gain);
                stack.push(child_frame);
                continue;
            }

            let Some(done) = stack.pop() else { break };
            if let Some(parent) = stack.last_mut() {
                self.objective.absorb(&mut parent.best, &done.best, done.gain);
            }
            self.memo.insert(done.state, done.best);
        }

        Ok(self
            .memo
            .get(&key)
            .cloned()
            .unwrap_or_else(|| self.objective.stop(key.at)))
    }
}

/// Best walk scores between every ordered pair of vertices of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryTable {
    members: Vec<VertexIdx>,
    rows: Vec<Box<[Option<u32>]>>,
}

impl BoundaryTable {
    /// Graph vertices, in the order used by [`Self::best`].
    pub fn members(&self) -> &[VertexIdx] {
        &self.members
    }

    /// Best score of a walk confined to the component that starts at local
    /// vertex `start` and ends at local vertex `end`, counting both endpoints.
    pub fn best(&self, start: usize, end: usize) -> Option<u32> {
        self.rows[start][end]
    }

    /// Best score over all pairs; equals the component's internal bound.
    pub fn max(&self) -> u32 {
        self.rows
            .iter()
            .flat_map(|row| row.iter().flatten())
            .copied()
            .max()
            .unwrap_or(0)
    }
}

/// Exact bound computation for one component.
#[derive(Debug, Clone)]
pub struct ComponentSearch {
    view: ComponentView,
    limits: Limits,
}

impl ComponentSearch {
    /// Fails with [`BoundError::ComponentTooLarge`] when the component exceeds
    /// the configured size guard.
    pub fn new(
        graph: &FlowGraph,
        id: ComponentId,
        component: &Component,
        limits: &Limits,
    ) -> Result<Self, BoundError> {
        if component.len() > limits.max_component_vertices {
            return Err(BoundError::ComponentTooLarge {
                component: id,
                size: component.len(),
                limit: limits.max_component_vertices,
            });
        }
        Ok(Self {
            view: ComponentView::new(graph, id, component),
            limits: *limits,
        })
    }

    pub fn view(&self) -> &ComponentView {
        &self.view
    }

    /// Score of the best walk through a singleton, which only revisits itself
    /// through a self-loop.
    fn singleton_score(&self) -> Option<u32> {
        if self.view.len() != 1 {
            return None;
        }
        let capacity = self.view.capacities[0];
        let visits = if self.view.has_self_loop(0) {
            capacity
        } else {
            capacity.min(1)
        };
        Some(if self.view.gains[0] > 0 { visits } else { 0 })
    }

    /// Maximum score of any capacity-respecting walk confined to the component.
    pub fn internal_bound(&self) -> Result<u32, BoundError> {
        if let Some(score) = self.singleton_score() {
            return Ok(score);
        }
        if self.view.gains.iter().all(|&g| g == 0) {
            return Ok(0);
        }
        let mut explorer = Explorer::new(&self.view, MaxScore, self.limits.max_search_states);
        let bound = explorer.value(SearchState::start(&self.view.capacities))?;
        debug!(
            "component {}: internal bound {} ({} vertices, {} states)",
            self.view.id,
            bound,
            self.view.len(),
            explorer.memo.len()
        );
        Ok(bound)
    }

    /// Best walk score for every (start, end) pair of the component.
    pub fn boundary_table(&self) -> Result<BoundaryTable, BoundError> {
        let width = self.view.len();
        if self.view.capacities.iter().all(|&c| c == 0) {
            return Ok(BoundaryTable {
                members: self.view.members.clone(),
                rows: vec![vec![None; width].into_boxed_slice(); width],
            });
        }
        if self.view.gains.iter().all(|&g| g == 0) {
            // Nothing scores, so only reachability between endpoints matters.
            return Ok(BoundaryTable {
                members: self.view.members.clone(),
                rows: (0..width).map(|s| self.view.open_reach(s)).collect(),
            });
        }
        if let Some(score) = self.singleton_score() {
            return Ok(BoundaryTable {
                members: self.view.members.clone(),
                rows: vec![vec![Some(score)].into_boxed_slice()],
            });
        }

        let start = SearchState::start(&self.view.capacities);
        let mut explorer = Explorer::new(
            &self.view,
            ScoreByEnd { width },
            self.limits.max_search_states,
        );
        let mut rows = Vec::with_capacity(width);
        for s in 0..width {
            if self.view.capacities[s] == 0 {
                rows.push(vec![None; width].into_boxed_slice());
                continue;
            }
            let gain = self.view.gains[s];
            let reached = explorer.value(start.advance(s))?;
            rows.push(reached.iter().map(|r| r.map(|x| x + gain)).collect());
        }
        debug!(
            "component {}: boundary table over {} vertices ({} states)",
            self.view.id,
            width,
            explorer.memo.len()
        );
        Ok(BoundaryTable {
            members: self.view.members.clone(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::scc::SccPartition;

    fn graph(
        vertices: &[&str],
        edges: &[(&str, &str)],
        caps: &[(&str, u32)],
        queries: &[&str],
    ) -> FlowGraph {
        let mut b = GraphBuilder::new();
        for v in vertices {
            b.add_vertex(v);
        }
        for (u, v) in edges {
            b.add_edge(u, v).unwrap();
        }
        for (v, c) in caps {
            b.set_capacity(v, *c).unwrap();
        }
        for q in queries {
            b.mark_query(q).unwrap();
        }
        b.build()
    }

    fn whole(graph: &FlowGraph) -> ComponentSearch {
        let component = Component {
            members: (0..graph.len()).collect(),
        };
        ComponentSearch::new(graph, 0, &component, &Limits::default()).unwrap()
    }

    #[test]
    fn test_two_cycle_uses_larger_capacity_twice() {
        let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")], &[("b", 2)], &["a", "b"]);
        let search = whole(&g);
        assert_eq!(search.internal_bound().unwrap(), 3);
        let table = search.boundary_table().unwrap();
        // a → b only: a cannot be revisited
        assert_eq!(table.best(0, 1), Some(2));
        assert_eq!(table.best(0, 0), Some(1));
        // b → a → b
        assert_eq!(table.best(1, 1), Some(3));
        assert_eq!(table.best(1, 0), Some(2));
        assert_eq!(table.max(), 3);
    }

    #[test]
    fn test_only_query_vertices_score() {
        let g = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
            &[("a", 2), ("b", 2), ("c", 2)],
            &["b"],
        );
        assert_eq!(whole(&g).internal_bound().unwrap(), 2);
    }

    #[test]
    fn test_no_queries_is_zero() {
        let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")], &[("a", 5)], &[]);
        assert_eq!(whole(&g).internal_bound().unwrap(), 0);
    }

    #[test]
    fn test_singleton_with_self_loop_uses_full_capacity() {
        let g = graph(&["a"], &[("a", "a")], &[("a", 4)], &["a"]);
        let search = whole(&g);
        assert_eq!(search.internal_bound().unwrap(), 4);
        assert_eq!(search.boundary_table().unwrap().best(0, 0), Some(4));
    }

    #[test]
    fn test_singleton_without_self_loop_visits_once() {
        let g = graph(&["a"], &[], &[("a", 4)], &["a"]);
        assert_eq!(whole(&g).internal_bound().unwrap(), 1);
    }

    #[test]
    fn test_zero_capacity_vertex_blocks_cycle() {
        let g = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
            &[("a", 3), ("b", 0), ("c", 3)],
            &["a", "c"],
        );
        let search = whole(&g);
        // c → a is the longest walk that avoids b
        assert_eq!(search.internal_bound().unwrap(), 2);
        let table = search.boundary_table().unwrap();
        assert_eq!(table.best(1, 1), None);
        assert_eq!(table.best(0, 2), None);
        assert_eq!(table.best(2, 0), Some(2));
    }

    #[test]
    fn test_edges_leaving_component_are_ignored() {
        let g = graph(
            &["a", "b", "x"],
            &[("a", "b"), ("b", "a"), ("b", "x")],
            &[],
            &["a", "b", "x"],
        );
        let partition = SccPartition::of(&g);
        let id = partition.component_of(0);
        let search =
            ComponentSearch::new(&g, id, partition.component(id), &Limits::default()).unwrap();
        assert_eq!(search.view().members(), &[0, 1]);
        assert_eq!(search.internal_bound().unwrap(), 2);
    }

    #[test]
    fn test_table_max_matches_internal_bound() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d"), ("d", "b")],
            &[("a", 2), ("c", 3), ("d", 2)],
            &["a", "d"],
        );
        let search = whole(&g);
        assert_eq!(
            search.boundary_table().unwrap().max(),
            search.internal_bound().unwrap()
        );
    }

    #[test]
    fn test_query_free_table_is_reachability() {
        // a → b → c → a with b closed: a reaches only itself, c reaches a.
        let g = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a")],
            &[("b", 0)],
            &[],
        );
        let table = whole(&g).boundary_table().unwrap();
        assert_eq!(table.best(0, 0), Some(0));
        assert_eq!(table.best(0, 2), None);
        assert_eq!(table.best(1, 0), None);
        assert_eq!(table.best(2, 0), Some(0));
        assert_eq!(table.best(2, 2), Some(0));
        assert_eq!(table.max(), 0);
    }

    #[test]
    fn test_query_free_table_ignores_state_budget() {
        let names: Vec<String> = (0..12).map(|i| format!("v{}", i)).collect();
        let mut b = GraphBuilder::new();
        for u in &names {
            for v in &names {
                if u != v {
                    b.add_edge(u, v).unwrap();
                }
            }
            b.set_capacity(u, 2).unwrap();
        }
        let g = b.build();
        let component = Component {
            members: (0..g.len()).collect(),
        };
        let limits = Limits {
            max_search_states: 10,
            ..Limits::default()
        };
        let search = ComponentSearch::new(&g, 0, &component, &limits).unwrap();
        let table = search.boundary_table().unwrap();
        assert_eq!(table.best(3, 11), Some(0));
        assert_eq!(search.internal_bound().unwrap(), 0);
    }

    #[test]
    fn test_component_size_guard() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")], &[], &[]);
        let component = Component {
            members: vec![0, 1, 2],
        };
        let limits = Limits {
            max_component_vertices: 2,
            ..Limits::default()
        };
        let err = ComponentSearch::new(&g, 7, &component, &limits).unwrap_err();
        assert_eq!(
            err,
            BoundError::ComponentTooLarge {
                component: 7,
                size: 3,
                limit: 2
            }
        );
        assert!(err.to_string().contains("too large to bound exactly"));
    }

    #[test]
    fn test_search_state_budget() {
        let g = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("b", "a")],
            &[("a", 3), ("b", 3), ("c", 3)],
            &["a"],
        );
        let component = Component {
            members: vec![0, 1, 2],
        };
        let limits = Limits {
            max_search_states: 4,
            ..Limits::default()
        };
        let search = ComponentSearch::new(&g, 0, &component, &limits).unwrap();
        assert!(matches!(
            search.internal_bound(),
            Err(BoundError::SearchBudgetExceeded { limit: 4, .. })
        ));
    }
}
