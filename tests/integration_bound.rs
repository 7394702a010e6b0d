//! Cross-checks of the decomposed bound against exhaustive enumeration.

use std::collections::HashMap;

use adaptbound::compose::Condensation;
use adaptbound::{
    BoundEngine, BoundError, FlowGraph, GraphBuilder, SccPartition, compute_bound,
    compute_bound_naive, compute_critical_path,
};
use proptest::prelude::*;

fn caps<'a>(entries: &[(&'a str, u32)]) -> HashMap<&'a str, u32> {
    entries.iter().copied().collect()
}

#[derive(Debug, Clone)]
struct SmallGraph {
    n: usize,
    edges: Vec<(usize, usize)>,
    capacities: Vec<u32>,
    queries: Vec<bool>,
}

impl SmallGraph {
    fn build(&self) -> FlowGraph {
        let mut b = GraphBuilder::new();
        for v in 0..self.n {
            b.add_vertex(&format!("v{}", v));
        }
        for &(u, v) in &self.edges {
            b.add_edge(&format!("v{}", u), &format!("v{}", v)).unwrap();
        }
        for v in 0..self.n {
            let name = format!("v{}", v);
            b.set_capacity(&name, self.capacities[v]).unwrap();
            if self.queries[v] {
                b.mark_query(&name).unwrap();
            }
        }
        b.build()
    }
}

fn arb_small_graph() -> impl Strategy<Value = SmallGraph> {
    (1..=5usize).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec((0..n, 0..n), 0..=8),
            proptest::collection::vec(0..=2u32, n..=n),
            proptest::collection::vec(any::<bool>(), n..=n),
        )
            .prop_map(|(n, edges, capacities, queries)| SmallGraph {
                n,
                edges,
                capacities,
                queries,
            })
    })
}

fn reachable(graph: &FlowGraph, from: usize) -> Vec<bool> {
    let mut seen = vec![false; graph.len()];
    let mut stack = vec![from];
    seen[from] = true;
    while let Some(u) = stack.pop() {
        for &v in graph.successors(u) {
            if !seen[v] {
                seen[v] = true;
                stack.push(v);
            }
        }
    }
    seen
}

#[test]
fn test_empty_graph() {
    let none: [&str; 0] = [];
    let edges: [(&str, &str); 0] = [];
    assert_eq!(compute_bound(&none, &edges, &caps(&[]), &none).unwrap(), 0);
    assert_eq!(compute_bound_naive(&none, &edges, &caps(&[]), &none).unwrap(), 0);
    let (score, path) = compute_critical_path(&none, &edges, &caps(&[]), &none).unwrap();
    assert_eq!(score, 0);
    assert!(path.is_empty());
}

#[test]
fn test_single_vertex_cases() {
    let v = ["A"];
    let no_edges: [(&str, &str); 0] = [];
    let self_loop = [("A", "A")];
    let c = caps(&[("A", 3)]);

    assert_eq!(compute_bound(&v, &no_edges, &c, &v).unwrap(), 1);
    assert_eq!(compute_bound(&v, &self_loop, &c, &v).unwrap(), 3);
    assert_eq!(compute_bound_naive(&v, &self_loop, &c, &v).unwrap(), 3);
    assert_eq!(compute_bound(&v, &self_loop, &c, &[] as &[&str]).unwrap(), 0);
}

#[test]
fn test_diamond_counts_longest_branch() {
    let v = ["S", "L", "R1", "R2", "T"];
    let e = [("S", "L"), ("S", "R1"), ("R1", "R2"), ("L", "T"), ("R2", "T")];
    assert_eq!(compute_bound(&v, &e, &caps(&[]), &v).unwrap(), 4);
    let (score, path) = compute_critical_path(&v, &e, &caps(&[]), &v).unwrap();
    assert_eq!(score, 4);
    assert_eq!(path, vec!["S", "R1", "R2", "T"]);
}

#[test]
fn test_non_query_cycle_between_queries() {
    let v = ["Q1", "X", "Y", "Q2"];
    let e = [("Q1", "X"), ("X", "Y"), ("Y", "X"), ("Y", "Q2")];
    let c = caps(&[("X", 5), ("Y", 5)]);
    let q = ["Q1", "Q2"];
    assert_eq!(compute_bound(&v, &e, &c, &q).unwrap(), 2);
    assert_eq!(compute_bound_naive(&v, &e, &c, &q).unwrap(), 2);
}

#[test]
fn test_entry_vertex_restricts_cycle_traversal() {
    // Entering the cycle at `a` wastes a unit of `a` that `b` could not reuse.
    let v = ["p", "a", "b"];
    let e = [("p", "a"), ("a", "b"), ("b", "a")];
    let c = caps(&[("b", 2)]);
    assert_eq!(compute_bound(&v, &e, &c, &v).unwrap(), 3);
    assert_eq!(compute_bound_naive(&v, &e, &c, &v).unwrap(), 3);
    assert_eq!(adaptbound::compute_bound_coarse(&v, &e, &c, &v).unwrap(), 4);
}

#[test]
fn test_bound_beyond_u32_is_reported() {
    let v = ["a", "b"];
    let e = [("a", "a"), ("a", "b"), ("b", "b")];
    let c = caps(&[("a", u32::MAX), ("b", 5)]);
    assert_eq!(compute_bound(&v, &e, &c, &v), Err(BoundError::ScoreOverflow));
    assert_eq!(compute_bound(&v, &e, &c, &["a"]), Ok(u32::MAX));
}

#[test]
fn test_large_query_free_cycle_is_zero() {
    let mut b = GraphBuilder::new();
    b.add_edge("q", "v0").unwrap();
    b.mark_query("q").unwrap();
    for i in 0..12 {
        for j in 0..12 {
            if i != j {
                b.add_edge(&format!("v{}", i), &format!("v{}", j)).unwrap();
            }
        }
        b.set_capacity(&format!("v{}", i), 2).unwrap();
    }
    b.add_edge("v5", "r").unwrap();
    b.mark_query("r").unwrap();
    let graph = b.build();
    let engine = BoundEngine::default();
    assert_eq!(engine.bound(&graph), Ok(2));
    assert_eq!(engine.bound_coarse(&graph), Ok(2));
}

#[test]
fn test_engine_shared_across_threads() {
    let graph = adaptbound::pipeline::demo_graph().unwrap();
    let engine = BoundEngine::default();
    let results: Vec<u32> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| engine.bound(&graph).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results, vec![5; 4]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decomposed_bound_matches_enumeration(g in arb_small_graph()) {
        let graph = g.build();
        let engine = BoundEngine::default();
        let exact = engine.bound(&graph).unwrap();
        prop_assert_eq!(exact, engine.bound_naive(&graph).unwrap());
        prop_assert!(engine.bound_coarse(&graph).unwrap() >= exact);
    }

    #[test]
    fn critical_path_is_a_valid_optimal_walk(g in arb_small_graph()) {
        let graph = g.build();
        let engine = BoundEngine::default();
        let path = engine.critical_path(&graph).unwrap();
        prop_assert!(graph.is_valid_walk(&path.walk));
        prop_assert_eq!(graph.walk_score(&path.walk), path.score);
        prop_assert_eq!(path.score, engine.bound(&graph).unwrap());
    }

    #[test]
    fn raising_capacity_never_lowers_bound(
        g in arb_small_graph(),
        pick in any::<prop::sample::Index>(),
    ) {
        let engine = BoundEngine::default();
        let before = engine.bound(&g.build()).unwrap();
        let mut raised = g.clone();
        let v = pick.index(g.n);
        raised.capacities[v] += 1;
        prop_assert!(engine.bound(&raised.build()).unwrap() >= before);
    }

    #[test]
    fn adding_a_query_never_lowers_bound(
        g in arb_small_graph(),
        pick in any::<prop::sample::Index>(),
    ) {
        let engine = BoundEngine::default();
        let before = engine.bound(&g.build()).unwrap();
        let mut tagged = g.clone();
        tagged.queries[pick.index(g.n)] = true;
        let after = engine.bound(&tagged.build()).unwrap();
        prop_assert!(after >= before);
        prop_assert!(after <= before + 2);
    }

    #[test]
    fn partition_groups_mutually_reachable_vertices(g in arb_small_graph()) {
        let graph = g.build();
        let partition = SccPartition::of(&graph);
        let reach: Vec<Vec<bool>> = (0..graph.len()).map(|v| reachable(&graph, v)).collect();
        for u in 0..graph.len() {
            for v in 0..graph.len() {
                prop_assert_eq!(partition.same_component(u, v), reach[u][v] && reach[v][u]);
            }
        }
        let total: usize = partition.components().iter().map(|c| c.len()).sum();
        prop_assert_eq!(total, graph.len());
        prop_assert!(Condensation::build(&graph, &partition).is_acyclic());
    }
}
