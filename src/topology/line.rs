use std::fmt;

use crate::math::{BoundBox, Point3};

use super::area::AreaId;
use super::category::Categories;
use super::isle::IsleId;
use super::node::NodeId;

slotmap::new_key_type! {
    /// Unique identifier for a line in the primitive store.
    ///
    /// Every primitive of the stream is a "line", whatever its type.
    pub struct LineId;
}

/// Primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LineType {
    Point,
    Line,
    Boundary,
    Centroid,
    Face,
    Kernel,
}

impl LineType {
    /// Lines and boundaries: the types that get nodes at their ends.
    #[must_use]
    pub fn has_nodes(self) -> bool {
        matches!(self, LineType::Line | LineType::Boundary)
    }

    /// Types made of a single position.
    #[must_use]
    pub fn is_point_like(self) -> bool {
        matches!(self, LineType::Point | LineType::Centroid | LineType::Kernel)
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineType::Point => "point",
            LineType::Line => "line",
            LineType::Boundary => "boundary",
            LineType::Centroid => "centroid",
            LineType::Face => "face",
            LineType::Kernel => "kernel",
        };
        f.write_str(name)
    }
}

/// A line with a traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DirectedLine {
    /// The line identifier.
    pub line: LineId,
    /// If `true`, the line is traversed from its first to its last vertex.
    pub forward: bool,
}

impl DirectedLine {
    /// Creates a new directed line.
    #[must_use]
    pub fn new(line: LineId, forward: bool) -> Self {
        Self { line, forward }
    }

    /// Same line, opposite direction.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            line: self.line,
            forward: !self.forward,
        }
    }
}

/// What lies on one side of a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SideRef {
    #[default]
    None,
    Area(AreaId),
    Isle(IsleId),
}

impl SideRef {
    #[must_use]
    pub fn is_none(self) -> bool {
        self == SideRef::None
    }

    #[must_use]
    pub fn area(self) -> Option<AreaId> {
        match self {
            SideRef::Area(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn isle(self) -> Option<IsleId> {
        match self {
            SideRef::Isle(i) => Some(i),
            _ => None,
        }
    }
}

/// Area binding of a centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CentroidArea {
    /// Not inside any area (or not resolved yet).
    #[default]
    Outside,
    /// The centroid is the one bound to the area.
    Bound(AreaId),
    /// The area already has a bound centroid; this one is a duplicate.
    Duplicate(AreaId),
}

/// Topology record of a line, by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTopo {
    Point,
    Line {
        n1: NodeId,
        n2: NodeId,
    },
    Boundary {
        n1: NodeId,
        n2: NodeId,
        left: SideRef,
        right: SideRef,
    },
    Centroid {
        area: CentroidArea,
    },
    Face,
    Kernel,
}

/// Data associated with a line.
#[derive(Debug, Clone)]
pub struct LineData {
    /// Primitive type.
    pub kind: LineType,
    /// Ordered vertices.
    pub points: Vec<Point3>,
    /// Categories attached to the primitive.
    pub cats: Categories,
    /// Union of the vertex extents.
    pub bbox: BoundBox,
    /// Position of the primitive in its source stream.
    pub offset: u64,
    /// Type-specific topology.
    pub topo: LineTopo,
}

impl LineData {
    /// Start and end node, for lines and boundaries.
    #[must_use]
    pub fn nodes(&self) -> Option<(NodeId, NodeId)> {
        match self.topo {
            LineTopo::Line { n1, n2 } | LineTopo::Boundary { n1, n2, .. } => Some((n1, n2)),
            _ => None,
        }
    }

    /// Left and right side, for boundaries.
    #[must_use]
    pub fn sides(&self) -> Option<(SideRef, SideRef)> {
        match self.topo {
            LineTopo::Boundary { left, right, .. } => Some((left, right)),
            _ => None,
        }
    }

    /// Area binding, for centroids.
    #[must_use]
    pub fn centroid_area(&self) -> Option<CentroidArea> {
        match self.topo {
            LineTopo::Centroid { area } => Some(area),
            _ => None,
        }
    }

    /// Node at the far end of a traversal in direction `d`.
    #[must_use]
    pub fn end_node(&self, forward: bool) -> Option<NodeId> {
        self.nodes().map(|(n1, n2)| if forward { n2 } else { n1 })
    }

    /// Vertices in traversal order.
    pub fn directed_points(&self, forward: bool) -> Box<dyn Iterator<Item = Point3> + '_> {
        if forward {
            Box::new(self.points.iter().copied())
        } else {
            Box::new(self.points.iter().rev().copied())
        }
    }

    pub(crate) fn set_side(&mut self, forward: bool, side: SideRef) {
        if let LineTopo::Boundary { left, right, .. } = &mut self.topo {
            if forward {
                *right = side;
            } else {
                *left = side;
            }
        }
    }

    pub(crate) fn side(&self, forward: bool) -> SideRef {
        match self.topo {
            LineTopo::Boundary { left, right, .. } => {
                if forward {
                    right
                } else {
                    left
                }
            }
            _ => SideRef::None,
        }
    }
}
