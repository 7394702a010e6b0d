//! Decomposition-free reference enumerator.
//!
//! Explores every capacity-respecting walk of the whole graph depth-first,
//! starting from each vertex in index order. It is exponential and only meant
//! for small graphs, where it cross-checks [`crate::bound::BoundEngine::bound`]
//! and recovers one concrete maximizing walk.

use crate::bound::{BoundError, Limits};
use crate::graph::{FlowGraph, VertexIdx};
use log::debug;
use serde::Serialize;

/// A walk of maximum score.
///
/// When several walks reach the maximum, the first one discovered is kept.
/// Discovery order follows vertex order and successor order, which is an
/// implementation detail; only `score` is meaningful to compare.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CriticalPath {
    pub score: u32,
    pub walk: Vec<VertexIdx>,
}

/// Exhaustive search over the full graph.
pub struct ReferenceEnumerator<'g> {
    graph: &'g FlowGraph,
    limits: Limits,
}

struct Frame {
    node: VertexIdx,
    next_neighbor: usize,
}

impl<'g> ReferenceEnumerator<'g> {
    /// Fails with [`BoundError::GraphTooLarge`] above the configured size guard.
    pub fn new(graph: &'g FlowGraph, limits: &Limits) -> Result<Self, BoundError> {
        if graph.len() > limits.max_reference_vertices {
            return Err(BoundError::GraphTooLarge {
                size: graph.len(),
                limit: limits.max_reference_vertices,
            });
        }
        Ok(Self {
            graph,
            limits: *limits,
        })
    }

    pub fn bound(&self) -> Result<u32, BoundError> {
        Ok(self.enumerate(false)?.score)
    }

    pub fn critical_path(&self) -> Result<CriticalPath, BoundError> {
        self.enumerate(true)
    }

    fn enumerate(&self, track_walk: bool) -> Result<CriticalPath, BoundError> {
        let graph = self.graph;
        let mut visits = vec![0u32; graph.len()];
        let mut best: Option<CriticalPath> = None;
        let mut steps: u64 = 0;

        for start in 0..graph.len() {
            if graph.capacity(start) == 0 {
                continue;
            }
            visits[start] = 1;
            let mut score = graph.gain(start);
            let mut call_stack = vec![Frame {
                node: start,
                next_neighbor: 0,
            }];
            record(&mut best, score, &call_stack, track_walk);

            while let Some(frame) = call_stack.last_mut() {
                let v = frame.node;
                if let Some(&w) = graph.successors(v).get(frame.next_neighbor) {
                    frame.next_neighbor += 1;
                    if visits[w] >= graph.capacity(w) {
                        continue;
                    }
                    steps += 1;
                    if steps > self.limits.max_reference_steps {
                        return Err(BoundError::EnumerationBudgetExceeded {
                            limit: self.limits.max_reference_steps,
                        });
                    }
                    visits[w] += 1;
                    score += graph.gain(w);
                    call_stack.push(Frame {
                        node: w,
                        next_neighbor: 0,
                    });
                    record(&mut best, score, &call_stack, track_walk);
                    continue;
                }

                visits[v] -= 1;
                score -= graph.gain(v);
                call_stack.pop();
            }
        }

        debug!("reference enumeration finished after {} steps", steps);
        Ok(best.unwrap_or_default())
    }
}

/// Keeps the first walk that strictly improves on the best score so far.
fn record(best: &mut Option<CriticalPath>, score: u32, call_stack: &[Frame], track_walk: bool) {
    if best.as_ref().is_some_and(|b| b.score >= score) {
        return;
    }
    let walk = if track_walk {
        call_stack.iter().map(|f| f.node).collect()
    } else {
        Vec::new()
    };
    *best = Some(CriticalPath { score, walk });
}
