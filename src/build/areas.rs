use std::collections::HashSet;

use crate::error::{Error, TopologyError};
use crate::math::angle::DEGENERATE_ANGLE;
use crate::math::polygon_2d::signed_area_2d;
use crate::spatial::SpatialIndex;
use crate::topology::{DirectedLine, LineId, LineType, NodeId, PrimitiveStore};

use super::{BuildPass, BuildStats, Progress};

/// Outcome of tracing one side of a boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Trace {
    /// The walk came back to its first boundary.
    Closed(Vec<DirectedLine>),
    /// No ring on this side.
    Open(OpenReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenReason {
    /// The first boundary has no direction.
    Degenerate,
    /// A node offers no boundary to continue with.
    NoContinuation,
    /// The only way on is back along the arriving boundary.
    DeadEnd,
    /// The walk reached a boundary already in the ring, not the first one.
    Unclosed,
    /// Two boundaries leave a node at the same angle.
    AmbiguousAngle,
}

/// State of a ring walk. The ring grows one boundary per step; nothing is
/// recursive, so arbitrarily long rings need no stack.
struct RingWalk {
    first: DirectedLine,
    /// Incidence of the last traversed boundary at the node we stand on.
    arrived: DirectedLine,
    ring: Vec<DirectedLine>,
    members: HashSet<LineId>,
}

impl RingWalk {
    fn new(first: DirectedLine) -> Self {
        Self {
            first,
            arrived: first.reversed(),
            ring: vec![first],
            members: HashSet::from([first.line]),
        }
    }

    fn advance(&mut self, next: DirectedLine) {
        self.ring.push(next);
        self.members.insert(next.line);
        self.arrived = next.reversed();
    }
}

/// Node an incidence sits at: a forward incidence leaves the line's first
/// node, a backward one its last.
fn incidence_node(store: &PrimitiveStore, d: DirectedLine) -> Result<NodeId, TopologyError> {
    let (n1, n2) = store.line(d.line)?.nodes().ok_or_else(|| {
        TopologyError::Structural(format!("line {:?} has no nodes", d.line))
    })?;
    Ok(if d.forward { n1 } else { n2 })
}

/// Next boundary incidence around the node of `from`, counter-clockwise
/// (`up`, increasing angle) or clockwise. Degenerate incidences are skipped.
/// May return `from` itself when it is the only boundary at the node.
fn neighbour_boundary(
    store: &PrimitiveStore,
    from: DirectedLine,
    up: bool,
) -> Result<Option<(DirectedLine, f32)>, TopologyError> {
    let node = store.node(incidence_node(store, from)?)?;
    let Some(start) = node.position(from) else {
        return Ok(None);
    };
    let n = node.lines.len();
    let mut i = start;
    loop {
        i = if up { (i + 1) % n } else { (i + n - 1) % n };
        let inc = node.lines[i];
        if inc.angle != DEGENERATE_ANGLE
            && store.line(inc.line.line)?.kind == LineType::Boundary
        {
            return Ok(Some((inc.line, inc.angle)));
        }
        if i == start {
            return Ok(None);
        }
    }
}

/// `false` if a neighbouring boundary at the node leaves at exactly the
/// same angle as `d`.
fn angle_is_distinct(store: &PrimitiveStore, d: DirectedLine) -> Result<bool, TopologyError> {
    let node = store.node(incidence_node(store, d)?)?;
    let Some(angle) = node.angle_of(d) else {
        return Ok(false);
    };
    for up in [true, false] {
        if let Some((other, a)) = neighbour_boundary(store, d, up)? {
            if other != d && a == angle {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Walks the ring on the side of `first` it is traversed with: forward
/// traces the right side, backward the left side.
///
/// At every node the walk takes the first boundary counter-clockwise from
/// the one it arrived on, which keeps the face on its right.
pub(crate) fn trace_ring(
    store: &PrimitiveStore,
    first: DirectedLine,
) -> Result<Trace, TopologyError> {
    let line = store.line(first.line)?;
    if line.kind != LineType::Boundary {
        return Err(TopologyError::Structural(format!(
            "ring tracing started on a {}",
            line.kind
        )));
    }
    let start = DirectedLine::new(first.line, true);
    let n1 = incidence_node(store, start)?;
    if store.node(n1)?.angle_of(start) == Some(DEGENERATE_ANGLE) {
        return Ok(Trace::Open(OpenReason::Degenerate));
    }

    let mut walk = RingWalk::new(first);
    loop {
        let Some((next, _)) = neighbour_boundary(store, walk.arrived, true)? else {
            return Ok(Trace::Open(OpenReason::NoContinuation));
        };
        if !angle_is_distinct(store, next)? {
            return Ok(Trace::Open(OpenReason::AmbiguousAngle));
        }
        if next == walk.first {
            return Ok(Trace::Closed(walk.ring));
        }
        if next == walk.arrived {
            return Ok(Trace::Open(OpenReason::DeadEnd));
        }
        if walk.members.contains(&next.line) {
            return Ok(Trace::Open(OpenReason::Unclosed));
        }
        walk.advance(next);
    }
}

/// Traces both sides of every boundary. Clockwise rings become areas,
/// counter-clockwise rings isles; zero-area rings are dropped.
pub(crate) fn run(
    store: &mut PrimitiveStore,
    index: &mut SpatialIndex,
    stats: &mut BuildStats,
    sink: Option<&mut dyn FnMut(BuildPass, u8)>,
) -> Result<(), Error> {
    let boundaries: Vec<LineId> = store
        .lines()
        .filter(|(_, l)| l.kind == LineType::Boundary)
        .map(|(id, _)| id)
        .collect();
    let mut progress = Progress::new(sink, BuildPass::Areas, boundaries.len() as u64);

    for (done, &id) in boundaries.iter().enumerate() {
        // right side first
        for forward in [true, false] {
            if !store.line(id)?.side(forward).is_none() {
                continue;
            }
            let ring = match trace_ring(store, DirectedLine::new(id, forward))? {
                Trace::Closed(ring) => ring,
                Trace::Open(reason) => {
                    tracing::trace!(line = ?id, forward, ?reason, "no ring");
                    stats.open_rings += 1;
                    continue;
                }
            };
            let signed = signed_area_2d(&store.ring_points(&ring)?);
            if signed < 0.0 {
                let area = store.add_area(ring)?;
                index.insert_area(area, store.area(area)?.bbox)?;
            } else if signed > 0.0 {
                let isle = store.add_isle(ring)?;
                index.insert_isle(isle, store.isle(isle)?.bbox)?;
            } else {
                tracing::trace!(line = ?id, forward, "zero-area ring ignored");
            }
        }
        progress.step(done as u64 + 1);
    }
    progress.finish();

    stats.areas = store.num_areas();
    stats.isles = store.num_isles();
    tracing::debug!(areas = stats.areas, isles = stats.isles, "areas built");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::Categories;

    fn boundary(store: &mut PrimitiveStore, pts: &[(f64, f64)]) -> LineId {
        store
            .register(
                LineType::Boundary,
                pts.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect(),
                Categories::new(),
            )
            .unwrap()
    }

    #[test]
    fn ccw_square_right_side_is_outer_ring() {
        let mut store = PrimitiveStore::new();
        let b = boundary(&mut store, &[(0.0, 0.0), (4.0, 0.0)]);
        boundary(&mut store, &[(4.0, 0.0), (4.0, 4.0)]);
        boundary(&mut store, &[(4.0, 4.0), (0.0, 4.0)]);
        boundary(&mut store, &[(0.0, 4.0), (0.0, 0.0)]);

        // right of a ccw ring is outside
        let Trace::Closed(outer) = trace_ring(&store, DirectedLine::new(b, true)).unwrap() else {
            panic!("expected a closed ring");
        };
        assert_eq!(outer.len(), 4);
        assert!(outer.iter().all(|d| d.forward));
        assert!(signed_area_2d(&store.ring_points(&outer).unwrap()) > 0.0);

        let Trace::Closed(inner) = trace_ring(&store, DirectedLine::new(b, false)).unwrap() else {
            panic!("expected a closed ring");
        };
        assert!(inner.iter().all(|d| !d.forward));
        assert!(signed_area_2d(&store.ring_points(&inner).unwrap()) < 0.0);
    }

    #[test]
    fn single_closed_boundary_forms_ring() {
        let mut store = PrimitiveStore::new();
        let b = boundary(
            &mut store,
            &[(0.0, 0.0), (0.0, 3.0), (3.0, 3.0), (3.0, 0.0), (0.0, 0.0)],
        );
        assert_eq!(
            trace_ring(&store, DirectedLine::new(b, true)).unwrap(),
            Trace::Closed(vec![DirectedLine::new(b, true)])
        );
    }

    #[test]
    fn dangle_is_a_dead_end() {
        let mut store = PrimitiveStore::new();
        let b = boundary(&mut store, &[(0.0, 0.0), (4.0, 0.0)]);
        assert_eq!(
            trace_ring(&store, DirectedLine::new(b, true)).unwrap(),
            Trace::Open(OpenReason::DeadEnd)
        );
    }

    #[test]
    fn open_chain_is_not_closed() {
        let mut store = PrimitiveStore::new();
        let a = boundary(&mut store, &[(0.0, 0.0), (4.0, 0.0)]);
        boundary(&mut store, &[(4.0, 0.0), (4.0, 4.0)]);
        assert!(matches!(
            trace_ring(&store, DirectedLine::new(a, true)).unwrap(),
            Trace::Open(_)
        ));
    }

    #[test]
    fn degenerate_boundary_has_no_ring() {
        let mut store = PrimitiveStore::new();
        let b = boundary(&mut store, &[(1.0, 1.0), (1.0, 1.0)]);
        assert_eq!(
            trace_ring(&store, DirectedLine::new(b, true)).unwrap(),
            Trace::Open(OpenReason::Degenerate)
        );
    }

    #[test]
    fn overlapping_boundaries_are_ambiguous() {
        let mut store = PrimitiveStore::new();
        let a = boundary(&mut store, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]);
        boundary(&mut store, &[(4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        // same first segment as `a`
        boundary(&mut store, &[(0.0, 0.0), (4.0, 0.0), (2.0, -3.0), (0.0, 0.0)]);
        let left = trace_ring(&store, DirectedLine::new(a, false)).unwrap();
        assert_eq!(left, Trace::Open(OpenReason::AmbiguousAngle));
    }
}
