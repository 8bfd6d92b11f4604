use crate::error::Result;
use crate::map::Map;
use crate::math::line::same_vertices;
use crate::math::BoundBox;
use crate::stream::Primitive;
use crate::topology::{LineId, LineType};

/// Removes lines whose vertices repeat an earlier line of the same type.
///
/// Vertex sequences are compared exactly, forward and reversed. The earlier
/// line survives and receives the union of both category sets; the later one
/// is deleted. Lines and boundaries are matched through the lines at their
/// first node, other types through the line index around their first vertex.
///
/// Running the operation a second time removes nothing.
pub struct RemoveDuplicates<'a> {
    types: Vec<LineType>,
    ignore_z: bool,
    sink: Option<&'a mut Vec<Primitive>>,
}

impl<'a> RemoveDuplicates<'a> {
    /// Creates the operation for the given primitive types.
    #[must_use]
    pub fn new(types: &[LineType]) -> Self {
        Self {
            types: types.to_vec(),
            ignore_z: false,
            sink: None,
        }
    }

    /// Compares vertices on x and y only.
    #[must_use]
    pub fn ignore_z(mut self, ignore: bool) -> Self {
        self.ignore_z = ignore;
        self
    }

    /// Collects every deleted primitive.
    #[must_use]
    pub fn with_error_sink(mut self, sink: &'a mut Vec<Primitive>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Executes the operation and returns the number of deleted lines.
    ///
    /// # Errors
    ///
    /// Returns `NotBuilt` below the base level, or an index error when the
    /// map's index cannot delete entries.
    pub fn execute(&mut self, map: &mut Map) -> Result<usize> {
        let mut order: Vec<(u64, LineId)> = map
            .store()
            .lines()
            .filter(|(_, l)| self.types.contains(&l.kind))
            .map(|(id, l)| (l.offset, id))
            .collect();
        order.sort_unstable();

        let mut removed = 0;
        for (_, id) in order {
            let Ok(line) = map.store().line(id) else {
                continue;
            };
            let (kind, offset) = (line.kind, line.offset);
            let points = line.points.clone();
            let mut cats = line.cats.clone();

            let mut matched = false;
            for other in candidates(map, id)? {
                let Ok(o) = map.store().line(other) else {
                    continue;
                };
                if other == id
                    || o.kind != kind
                    || o.offset <= offset
                    || !same_vertices(&points, &o.points, self.ignore_z)
                {
                    continue;
                }
                cats.merge(&o.cats);
                let primitive = map.delete_line(other)?;
                tracing::trace!(kept = ?id, removed = ?other, "duplicate line");
                if let Some(sink) = self.sink.as_deref_mut() {
                    sink.push(primitive);
                }
                removed += 1;
                matched = true;
            }
            if matched && map.store().line(id)?.cats != cats {
                map.rewrite_line(id, points, cats)?;
            }
        }

        tracing::debug!(removed, "duplicates removed");
        Ok(removed)
    }
}

/// Lines that may repeat `id`.
fn candidates(map: &mut Map, id: LineId) -> Result<Vec<LineId>> {
    let line = map.store().line(id)?;
    if let Some((n1, _)) = line.nodes() {
        let node = map.store().node(n1)?;
        let mut ids: Vec<LineId> = node.lines.iter().map(|l| l.line.line).collect();
        ids.dedup();
        return Ok(ids);
    }
    let Some(first) = line.points.first() else {
        return Ok(Vec::new());
    };
    let rect = BoundBox::point(first);
    map.select_lines(&rect)
}
