use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::hash::Hash;

use crate::error::GraphError;

use super::graph::{Graph, CLOSED};

/// What a clip callback sees for one candidate edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipContext<N, E> {
    /// Start node of the search.
    pub start: N,
    pub from: N,
    pub to: N,
    pub edge: E,
    /// Edge cost in millicost.
    pub cost: i32,
    /// Cost of the `from` node in millicost, `-1` when closed.
    pub from_cost: i32,
}

/// Verdict of a clip callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clip {
    /// The edge is not usable.
    Skip,
    /// The edge is usable at this millicost. Negative values skip it.
    Cost(i32),
}

/// Result of a shortest-path query.
#[derive(Debug, Clone, PartialEq)]
pub enum ShortestPath<E> {
    Found {
        /// Edge ids from start to end.
        arcs: Vec<E>,
        cost: f64,
    },
    Unreachable,
}

impl<E> ShortestPath<E> {
    /// Total cost, `+inf` when unreachable.
    #[must_use]
    pub fn cost(&self) -> f64 {
        match self {
            ShortestPath::Found { cost, .. } => *cost,
            ShortestPath::Unreachable => f64::INFINITY,
        }
    }

    /// Edge ids along the path, empty when unreachable.
    #[must_use]
    pub fn arcs(&self) -> &[E] {
        match self {
            ShortestPath::Found { arcs, .. } => arcs,
            ShortestPath::Unreachable => &[],
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, ShortestPath::Found { .. })
    }
}

/// The standard clip: leaving a node adds its cost, except for the start
/// node, and closed nodes cannot be left.
#[must_use]
pub fn default_clip<N: PartialEq, E>(ctx: &ClipContext<N, E>) -> Clip {
    if ctx.from == ctx.start {
        return Clip::Cost(ctx.cost);
    }
    if ctx.from_cost == CLOSED {
        return Clip::Skip;
    }
    Clip::Cost(ctx.cost.saturating_add(ctx.from_cost))
}

impl<N, E> Graph<N, E>
where
    N: Copy + Eq + Hash,
    E: Copy,
{
    /// Cheapest path using [`default_clip`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `from` is not in the graph.
    pub fn shortest_path(&self, from: N, to: N) -> Result<ShortestPath<E>, GraphError> {
        self.shortest_path_with(from, to, default_clip::<N, E>)
    }

    /// Cheapest path where every edge considered goes through `clip`.
    ///
    /// A path from a node to itself is found with cost 0 and no edges, even
    /// for a node without edges. A target outside the graph is unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if `from` is not in the graph.
    pub fn shortest_path_with<F>(
        &self,
        from: N,
        to: N,
        mut clip: F,
    ) -> Result<ShortestPath<E>, GraphError>
    where
        F: FnMut(&ClipContext<N, E>) -> Clip,
    {
        if from == to {
            return Ok(ShortestPath::Found {
                arcs: Vec::new(),
                cost: 0.0,
            });
        }
        let start = *self.index.get(&from).ok_or(GraphError::UnknownNode)?;
        let Some(&target) = self.index.get(&to) else {
            return Ok(ShortestPath::Unreachable);
        };

        let mut dist = vec![i64::MAX; self.nodes.len()];
        let mut via: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut heap = BinaryHeap::new();
        dist[start] = 0;
        heap.push(Reverse((0_i64, start)));

        while let Some(Reverse((d, u))) = heap.pop() {
            if d > dist[u] {
                continue;
            }
            if u == target {
                break;
            }
            let node = &self.nodes[u];
            for &e in &node.out {
                let edge = &self.edges[e];
                let ctx = ClipContext {
                    start: from,
                    from: edge.from,
                    to: edge.to,
                    edge: edge.id,
                    cost: edge.cost,
                    from_cost: node.cost,
                };
                let step = match clip(&ctx) {
                    Clip::Cost(c) if c >= 0 => i64::from(c),
                    _ => continue,
                };
                let nd = d + step;
                if nd < dist[edge.head] {
                    dist[edge.head] = nd;
                    via[edge.head] = Some(e);
                    heap.push(Reverse((nd, edge.head)));
                }
            }
        }

        if dist[target] == i64::MAX {
            return Ok(ShortestPath::Unreachable);
        }
        let mut arcs = Vec::new();
        let mut at = target;
        while let Some(e) = via[at] {
            arcs.push(self.edges[e].id);
            at = self.edges[e].tail;
        }
        arcs.reverse();
        #[allow(clippy::cast_precision_loss)]
        let cost = dist[target] as f64 / 1000.0;
        tracing::trace!(edges = arcs.len(), cost, "shortest path");
        Ok(ShortestPath::Found { arcs, cost })
    }
}
