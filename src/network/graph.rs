use std::collections::HashMap;
use std::hash::Hash;

use crate::error::GraphError;

/// Millicost marking a closed node.
pub(crate) const CLOSED: i32 = -1;

/// Converts a real cost to millicost.
///
/// Values beyond the `i32` range saturate.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn millicost(cost: f64) -> i32 {
    (cost * 1000.0).round() as i32
}

/// A directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<N, E> {
    pub from: N,
    pub to: N,
    /// Caller-supplied identifier, reported in paths.
    pub id: E,
    /// Traversal cost in millicost.
    pub cost: i32,
    pub(crate) tail: usize,
    pub(crate) head: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct GraphNode<N> {
    pub(crate) key: N,
    /// Millicost added when leaving the node; [`CLOSED`] blocks it.
    pub(crate) cost: i32,
    pub(crate) out: Vec<usize>,
}

/// Directed graph keyed by caller node type `N`, edges tagged with `E`.
#[derive(Debug, Clone)]
pub struct Graph<N, E> {
    pub(crate) index: HashMap<N, usize>,
    pub(crate) nodes: Vec<GraphNode<N>>,
    pub(crate) edges: Vec<Edge<N, E>>,
}

impl<N, E> Default for Graph<N, E> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<N, E> Graph<N, E>
where
    N: Copy + Eq + Hash,
    E: Copy,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: N) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(GraphNode {
            key,
            cost: 0,
            out: Vec::new(),
        });
        self.index.insert(key, i);
        i
    }

    /// Adds an edge `from -> to`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidCost`] for a negative or non-finite cost.
    pub fn add_edge(&mut self, from: N, to: N, cost: f64, id: E) -> Result<(), GraphError> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(GraphError::InvalidCost(cost));
        }
        let tail = self.slot(from);
        let head = self.slot(to);
        let e = self.edges.len();
        self.edges.push(Edge {
            from,
            to,
            id,
            cost: millicost(cost),
            tail,
            head,
        });
        self.nodes[tail].out.push(e);
        Ok(())
    }

    /// Sets the cost of passing through a node. A negative cost closes it:
    /// paths may start at a closed node but never continue from one.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidCost`] for a non-finite cost.
    pub fn set_node_cost(&mut self, node: N, cost: f64) -> Result<(), GraphError> {
        if !cost.is_finite() {
            return Err(GraphError::InvalidCost(cost));
        }
        let i = self.slot(node);
        self.nodes[i].cost = if cost < 0.0 { CLOSED } else { millicost(cost) };
        Ok(())
    }

    /// Node cost in millicost, `None` for an unknown or closed node.
    #[must_use]
    pub fn node_cost(&self, node: N) -> Option<i32> {
        let n = &self.nodes[*self.index.get(&node)?];
        (n.cost != CLOSED).then_some(n.cost)
    }

    #[must_use]
    pub fn is_closed(&self, node: N) -> bool {
        self.index
            .get(&node)
            .is_some_and(|&i| self.nodes[i].cost == CLOSED)
    }

    #[must_use]
    pub fn contains(&self, node: N) -> bool {
        self.index.contains_key(&node)
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.nodes.iter().map(|n| n.key)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge<N, E>> {
        self.edges.iter()
    }

    /// Edges leaving `node`.
    pub fn outgoing(&self, node: N) -> impl Iterator<Item = &Edge<N, E>> {
        self.index
            .get(&node)
            .into_iter()
            .flat_map(move |&i| self.nodes[i].out.iter().map(move |&e| &self.edges[e]))
    }
}
