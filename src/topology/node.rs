use crate::math::Point3;

use super::line::{DirectedLine, LineId};

slotmap::new_key_type! {
    /// Unique identifier for a node in the primitive store.
    pub struct NodeId;
}

/// One line end attached to a node.
///
/// `line.forward` is `true` when the line starts at the node and `false`
/// when it ends there. Following the incidence therefore walks away from
/// the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeLine {
    pub line: DirectedLine,
    /// Direction of the line's end segment leaving the node.
    pub angle: f32,
}

/// Data associated with a topological node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Node position.
    pub point: Point3,
    /// Incident line ends in increasing angle order.
    pub lines: Vec<NodeLine>,
}

impl NodeData {
    /// Creates a node without incident lines.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            lines: Vec::new(),
        }
    }

    /// Inserts an incidence keeping the angle order. Equal angles keep
    /// insertion order.
    pub(crate) fn attach(&mut self, line: DirectedLine, angle: f32) {
        let pos = self.lines.partition_point(|l| l.angle <= angle);
        self.lines.insert(pos, NodeLine { line, angle });
    }

    /// Removes every incidence of `line`.
    pub(crate) fn detach(&mut self, line: LineId) {
        self.lines.retain(|l| l.line.line != line);
    }

    /// Returns the position of an incidence.
    #[must_use]
    pub fn position(&self, line: DirectedLine) -> Option<usize> {
        self.lines.iter().position(|l| l.line == line)
    }

    /// Returns the angle of an incidence.
    #[must_use]
    pub fn angle_of(&self, line: DirectedLine) -> Option<f32> {
        self.lines.iter().find(|l| l.line == line).map(|l| l.angle)
    }
}
