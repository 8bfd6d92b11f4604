use std::collections::VecDeque;

use crate::error::{Result, TopologyError};
use crate::map::Map;
use crate::math::angle::DEGENERATE_ANGLE;
use crate::math::line::distance_2d;
use crate::math::Point3;
use crate::stream::Primitive;
use crate::topology::{DirectedLine, LineId, LineType, NodeId, PrimitiveStore};

/// Removes zero angles between lines meeting at a node.
///
/// Two incidences with exactly the same angle overlap on their first
/// segment. The shorter of the two end segments, node to `P`, is split off
/// into a new line carrying the categories of both: the shorter line then
/// starts at `P`, and the longer line's terminal vertex moves to `P`. Nodes
/// are rescanned until no identical pair is left, and nodes created at `P`
/// are scanned too.
pub struct CleanSmallAngles<'a> {
    types: Vec<LineType>,
    sink: Option<&'a mut Vec<Primitive>>,
}

/// One side of an overlapping pair, vertices ordered away from the node.
struct EndSegment {
    line: DirectedLine,
    kind: LineType,
    leaving: Vec<Point3>,
    /// Index of the first vertex off the node.
    off: usize,
}

impl EndSegment {
    fn load(store: &PrimitiveStore, line: DirectedLine) -> Result<Self> {
        let data = store.line(line.line)?;
        let mut leaving = data.points.clone();
        if !line.forward {
            leaving.reverse();
        }
        let start = leaving[0];
        let off = leaving
            .iter()
            .position(|p| p.x != start.x || p.y != start.y)
            .ok_or_else(|| {
                TopologyError::Structural(format!("line {:?} has no direction", line.line))
            })?;
        Ok(Self {
            line,
            kind: data.kind,
            leaving,
            off,
        })
    }

    fn length(&self) -> f64 {
        distance_2d(&self.leaving[0], &self.leaving[self.off])
    }

    /// Vertices back in stored order.
    fn stored(&self, mut leaving: Vec<Point3>) -> Vec<Point3> {
        if !self.line.forward {
            leaving.reverse();
        }
        leaving
    }
}

impl<'a> CleanSmallAngles<'a> {
    /// Creates the operation for the given primitive types.
    #[must_use]
    pub fn new(types: &[LineType]) -> Self {
        Self {
            types: types.to_vec(),
            sink: None,
        }
    }

    /// Collects the original primitive of every modified line.
    #[must_use]
    pub fn with_error_sink(mut self, sink: &'a mut Vec<Primitive>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Executes the operation and returns the number of pairs fixed.
    ///
    /// # Errors
    ///
    /// Returns `NotBuilt` below the base level, or an index error when the
    /// map's index cannot delete entries.
    pub fn execute(&mut self, map: &mut Map) -> Result<usize> {
        // Node ids do not survive rewrites, positions do.
        let mut queue: VecDeque<Point3> = map.store().nodes().map(|(_, n)| n.point).collect();
        let mut fixed = 0;
        while let Some(at) = queue.pop_front() {
            let Some(node) = map.store().find_node_at(&at) else {
                continue;
            };
            let Some((a, b)) = self.overlapping_pair(map.store(), node)? else {
                continue;
            };
            let p = self.split_off(map, a, b)?;
            fixed += 1;
            queue.push_front(at);
            queue.push_back(p);
        }
        tracing::debug!(fixed, "small angles cleaned");
        Ok(fixed)
    }

    /// First pair of consecutive incidences at `node` with identical angles
    /// that can be fixed.
    fn overlapping_pair(
        &self,
        store: &PrimitiveStore,
        node: NodeId,
    ) -> Result<Option<(DirectedLine, DirectedLine)>> {
        let node_data = store.node(node)?;
        for w in node_data.lines.windows(2) {
            let (a, b) = (w[0], w[1]);
            if a.angle == DEGENERATE_ANGLE || a.angle != b.angle {
                continue;
            }
            let ka = store.line(a.line.line)?.kind;
            let kb = store.line(b.line.line)?.kind;
            if !self.types.contains(&ka) || !self.types.contains(&kb) {
                continue;
            }
            if a.line.line == b.line.line {
                tracing::warn!(line = ?a.line.line, "line leaves a node twice at the same angle");
                continue;
            }
            if ka != kb {
                tracing::warn!(
                    first = ?a.line.line,
                    second = ?b.line.line,
                    "zero angle between a {ka} and a {kb} left as is"
                );
                continue;
            }
            return Ok(Some((a.line, b.line)));
        }
        Ok(None)
    }

    /// Fixes one pair and returns the split point.
    fn split_off(&mut self, map: &mut Map, a: DirectedLine, b: DirectedLine) -> Result<Point3> {
        let ea = EndSegment::load(map.store(), a)?;
        let eb = EndSegment::load(map.store(), b)?;
        let (short, long) = if ea.length() <= eb.length() {
            (ea, eb)
        } else {
            (eb, ea)
        };
        let p = short.leaving[short.off];
        let cats = map
            .store()
            .line(short.line.line)?
            .cats
            .union(&map.store().line(long.line.line)?.cats);

        if let Some(sink) = self.sink.as_deref_mut() {
            sink.push(map.read_line(short.line.line)?);
            sink.push(map.read_line(long.line.line)?);
        }

        let short_points = short.leaving[short.off..].to_vec();
        let mut long_points = vec![p];
        let rest = &long.leaving[long.off..];
        let skip = usize::from(rest[0].x == p.x && rest[0].y == p.y);
        long_points.extend_from_slice(&rest[skip..]);

        let segment = vec![short.leaving[0], p];
        reshape(map, &long, long_points)?;
        reshape(map, &short, short_points)?;
        map.write_line(short.kind, segment, cats)?;
        tracing::trace!(
            short = ?short.line.line,
            long = ?long.line.line,
            x = p.x,
            y = p.y,
            "zero angle split"
        );
        Ok(p)
    }
}

/// Rewrites a line with new vertices (in leaving order), deleting it when
/// fewer than two remain.
fn reshape(map: &mut Map, end: &EndSegment, leaving: Vec<Point3>) -> Result<()> {
    let id: LineId = end.line.line;
    if leaving.len() < 2 {
        map.delete_line(id)?;
        return Ok(());
    }
    let cats = map.store().line(id)?.cats.clone();
    map.rewrite_line(id, end.stored(leaving), cats)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::topology::Categories;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn zero_angles(map: &Map) -> usize {
        map.store()
            .nodes()
            .map(|(_, n)| {
                n.lines
                    .windows(2)
                    .filter(|w| w[0].angle != DEGENERATE_ANGLE && w[0].angle == w[1].angle)
                    .count()
            })
            .sum()
    }

    #[test]
    fn overlapping_start_is_split_off() {
        let mut map = Map::new(MapConfig::default()).unwrap();
        let short = map
            .write_line(
                LineType::Line,
                vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 3.0)],
                Categories::new().with(1, 1),
            )
            .unwrap();
        let long = map
            .write_line(
                LineType::Line,
                vec![p(0.0, 0.0), p(5.0, 0.0), p(5.0, -3.0)],
                Categories::new().with(1, 2),
            )
            .unwrap();
        assert_eq!(zero_angles(&map), 1);

        let mut changed = Vec::new();
        let n = CleanSmallAngles::new(&[LineType::Line])
            .with_error_sink(&mut changed)
            .execute(&mut map)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(changed.len(), 2);
        assert_eq!(zero_angles(&map), 0);
        assert_eq!(map.num_lines().unwrap(), 3);

        assert_eq!(map.read_line(short).unwrap().points, vec![p(2.0, 0.0), p(2.0, 3.0)]);
        assert_eq!(
            map.read_line(long).unwrap().points,
            vec![p(2.0, 0.0), p(5.0, 0.0), p(5.0, -3.0)]
        );
        let shared = map
            .store()
            .lines()
            .find(|(id, _)| *id != short && *id != long)
            .map(|(_, l)| l.clone())
            .unwrap();
        assert_eq!(shared.points, vec![p(0.0, 0.0), p(2.0, 0.0)]);
        assert!(shared.cats.contains(1, 1) && shared.cats.contains(1, 2));
    }

    #[test]
    fn backward_incidences_are_fixed_in_place() {
        let mut map = Map::new(MapConfig::default()).unwrap();
        // both lines end at the origin, arriving along the x axis
        let a = map
            .write_line(
                LineType::Boundary,
                vec![p(1.0, 4.0), p(1.0, 0.0), p(0.0, 0.0)],
                Categories::new(),
            )
            .unwrap();
        map.write_line(
            LineType::Boundary,
            vec![p(3.0, -2.0), p(3.0, 0.0), p(0.0, 0.0)],
            Categories::new(),
        )
        .unwrap();

        let n = CleanSmallAngles::new(&[LineType::Boundary])
            .execute(&mut map)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(zero_angles(&map), 0);
        assert_eq!(map.read_line(a).unwrap().points, vec![p(1.0, 4.0), p(1.0, 0.0)]);
    }

    #[test]
    fn mixed_types_are_skipped() {
        let mut map = Map::new(MapConfig::default()).unwrap();
        map.write_line(
            LineType::Line,
            vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 3.0)],
            Categories::new(),
        )
        .unwrap();
        map.write_line(
            LineType::Boundary,
            vec![p(0.0, 0.0), p(5.0, 0.0)],
            Categories::new(),
        )
        .unwrap();
        let n = CleanSmallAngles::new(&[LineType::Line, LineType::Boundary])
            .execute(&mut map)
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(zero_angles(&map), 1);
    }

    #[test]
    fn equal_segments_collapse_to_one_line() {
        let mut map = Map::new(MapConfig::default()).unwrap();
        map.write_line(
            LineType::Line,
            vec![p(0.0, 0.0), p(2.0, 0.0)],
            Categories::new().with(1, 1),
        )
        .unwrap();
        map.write_line(
            LineType::Line,
            vec![p(0.0, 0.0), p(2.0, 0.0)],
            Categories::new().with(1, 2),
        )
        .unwrap();
        let n = CleanSmallAngles::new(&[LineType::Line])
            .execute(&mut map)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(map.num_lines().unwrap(), 1);
        let (_, only) = map.store().lines().next().unwrap();
        assert_eq!(only.cats.len(), 2);
    }
}
