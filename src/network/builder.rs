use crate::error::{Result, TopologyError};
use crate::map::Map;
use crate::math::line::length_2d;
use crate::topology::{BuildLevel, DirectedLine, LineData, LineId, LineType, NodeData, NodeId};

use super::Graph;

type LineCost<'a> = Box<dyn Fn(LineId, &LineData) -> f64 + 'a>;
type NodeCost<'a> = Box<dyn Fn(NodeId, &NodeData) -> f64 + 'a>;

/// Builds a network graph from the lines of a map.
///
/// Every line of the selected types contributes an edge in each direction:
/// forward from its first to its last node, backward the other way. The
/// forward cost defaults to the planar length, the backward cost to the
/// forward cost. A direction with a negative cost is left out.
pub struct NetworkBuilder<'a> {
    types: Vec<LineType>,
    forward: Option<LineCost<'a>>,
    backward: Option<LineCost<'a>>,
    node_cost: Option<NodeCost<'a>>,
}

impl<'a> NetworkBuilder<'a> {
    #[must_use]
    pub fn new(types: &[LineType]) -> Self {
        Self {
            types: types.to_vec(),
            forward: None,
            backward: None,
            node_cost: None,
        }
    }

    /// Cost of traversing a line from its first to its last vertex.
    #[must_use]
    pub fn with_forward_cost(mut self, f: impl Fn(LineId, &LineData) -> f64 + 'a) -> Self {
        self.forward = Some(Box::new(f));
        self
    }

    /// Cost of traversing a line from its last to its first vertex.
    #[must_use]
    pub fn with_backward_cost(mut self, f: impl Fn(LineId, &LineData) -> f64 + 'a) -> Self {
        self.backward = Some(Box::new(f));
        self
    }

    /// Cost of passing through a node; negative closes it.
    #[must_use]
    pub fn with_node_cost(mut self, f: impl Fn(NodeId, &NodeData) -> f64 + 'a) -> Self {
        self.node_cost = Some(Box::new(f));
        self
    }

    /// Builds the graph. Edge ids are the traversed lines with their
    /// direction.
    ///
    /// # Errors
    ///
    /// Returns `NotBuilt` below the base level, or `InvalidCost` when a cost
    /// function yields a non-finite value.
    pub fn execute(&self, map: &Map) -> Result<Graph<NodeId, DirectedLine>> {
        if map.level() < BuildLevel::Base {
            return Err(TopologyError::NotBuilt {
                required: BuildLevel::Base,
                current: map.level(),
            }
            .into());
        }
        let store = map.store();
        let mut graph = Graph::new();
        for (id, line) in store.lines() {
            if !self.types.contains(&line.kind) {
                continue;
            }
            let Some((n1, n2)) = line.nodes() else {
                continue;
            };
            let forward = match &self.forward {
                Some(f) => f(id, line),
                None => length_2d(&line.points),
            };
            let backward = match &self.backward {
                Some(f) => f(id, line),
                None => forward,
            };
            if forward >= 0.0 || forward.is_nan() {
                graph.add_edge(n1, n2, forward, DirectedLine::new(id, true))?;
            }
            if backward >= 0.0 || backward.is_nan() {
                graph.add_edge(n2, n1, backward, DirectedLine::new(id, false))?;
            }
        }
        if let Some(f) = &self.node_cost {
            for (id, node) in store.nodes() {
                if graph.contains(id) {
                    graph.set_node_cost(id, f(id, node))?;
                }
            }
        }
        tracing::debug!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "network graph built"
        );
        Ok(graph)
    }
}
