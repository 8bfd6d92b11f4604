pub mod area;
pub mod category;
pub mod isle;
pub mod level;
pub mod line;
pub mod node;

pub use area::{AreaData, AreaId};
pub use category::{Categories, Category, CategoryEntry, CategoryIndex, Feature, LayerIndex};
pub use isle::{IsleData, IsleId};
pub use level::BuildLevel;
pub use line::{CentroidArea, DirectedLine, LineData, LineId, LineTopo, LineType, SideRef};
pub use node::{NodeData, NodeId, NodeLine};

use std::collections::HashMap;

use crate::error::TopologyError;
use crate::math::angle::{begin_angle, end_angle};
use crate::math::polygon_2d::{append_to_ring, point_location, signed_area_2d, PointLocation};
use crate::math::{BoundBox, Point3};
use crate::stream::Primitive;
use slotmap::SlotMap;

/// Nodes created and removed since the last call to
/// [`PrimitiveStore::take_node_updates`].
///
/// The spatial index is not kept in sync by the store; whoever owns both
/// drains this list to maintain the node tree.
#[derive(Debug, Default)]
pub struct NodeUpdates {
    pub added: Vec<NodeId>,
    pub removed: Vec<(NodeId, Point3)>,
}

/// Central arena that owns all topology state of one open map.
///
/// Records reference each other via typed IDs (generational indices).
/// Deleting a record vacates its slot; a stale ID never resolves to a
/// record created later.
#[derive(Debug, Default)]
pub struct PrimitiveStore {
    nodes: SlotMap<NodeId, NodeData>,
    lines: SlotMap<LineId, LineData>,
    areas: SlotMap<AreaId, AreaData>,
    isles: SlotMap<IsleId, IsleData>,
    node_lookup: HashMap<[u64; 3], NodeId>,
    bbox: BoundBox,
    next_offset: u64,
    cidx: CategoryIndex,
    updates: NodeUpdates,
}

fn coord_key(p: &Point3) -> [u64; 3] {
    // `+ 0.0` folds -0.0 into 0.0
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}

fn not_found(kind: &'static str) -> TopologyError {
    TopologyError::NotFound { kind }
}

impl PrimitiveStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node operations ---

    /// Returns the node at exactly `p`, creating it if needed.
    pub fn node_for(&mut self, p: Point3) -> NodeId {
        let key = coord_key(&p);
        if let Some(&id) = self.node_lookup.get(&key) {
            return id;
        }
        let id = self.nodes.insert(NodeData::new(p));
        self.node_lookup.insert(key, id);
        self.updates.added.push(id);
        id
    }

    /// Returns the node at exactly `p`, if any.
    #[must_use]
    pub fn find_node_at(&self, p: &Point3) -> Option<NodeId> {
        self.node_lookup.get(&coord_key(p)).copied()
    }

    /// Returns a reference to the node data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the node is dead or unknown.
    pub fn node(&self, id: NodeId) -> Result<&NodeData, TopologyError> {
        self.nodes.get(id).ok_or_else(|| not_found("node"))
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeData)> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Drains the node creation/removal journal.
    pub fn take_node_updates(&mut self) -> NodeUpdates {
        std::mem::take(&mut self.updates)
    }

    fn remove_node_if_empty(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.lines.is_empty() {
            return;
        }
        let point = node.point;
        self.nodes.remove(id);
        self.node_lookup.remove(&coord_key(&point));
        self.updates.removed.push((id, point));
    }

    // --- Line operations ---

    /// Registers a primitive and returns its line ID.
    ///
    /// Lines and boundaries get nodes at their ends, reused by exact
    /// coordinate match. The running bounding box is extended.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Structural`] if the vertex list does not fit
    /// the primitive type.
    pub fn register(
        &mut self,
        kind: LineType,
        points: Vec<Point3>,
        cats: Categories,
    ) -> Result<LineId, TopologyError> {
        check_vertices(kind, &points)?;
        let bbox = BoundBox::from_points(&points);
        let offset = self.next_offset;
        self.next_offset += 1;
        let id = self.lines.insert(LineData {
            kind,
            points,
            cats,
            bbox,
            offset,
            topo: LineTopo::Point,
        });
        let topo = self.connect(id)?;
        if let Some(line) = self.lines.get_mut(id) {
            line.topo = topo;
        }
        self.bbox.extend(&bbox);
        Ok(id)
    }

    /// Reads a primitive back.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the line is dead or unknown.
    pub fn read(&self, id: LineId) -> Result<Primitive, TopologyError> {
        let line = self.line(id)?;
        Ok(Primitive {
            kind: line.kind,
            points: line.points.clone(),
            cats: line.cats.clone(),
        })
    }

    /// Returns a reference to the line data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the line is dead or unknown.
    pub fn line(&self, id: LineId) -> Result<&LineData, TopologyError> {
        self.lines.get(id).ok_or_else(|| not_found("line"))
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> Result<&mut LineData, TopologyError> {
        self.lines.get_mut(id).ok_or_else(|| not_found("line"))
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineId, &LineData)> {
        self.lines.iter()
    }

    #[must_use]
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Marks a line dead and returns what it held.
    ///
    /// Nodes left without lines are deleted too. Areas and isles referencing
    /// the line are left untouched and must be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the line is dead or unknown.
    pub fn delete_line(&mut self, id: LineId) -> Result<Primitive, TopologyError> {
        let primitive = self.read(id)?;
        self.disconnect(id);
        self.lines.remove(id);
        Ok(primitive)
    }

    /// Replaces the vertices and categories of a line, keeping its ID.
    ///
    /// Nodes are re-attached; side and centroid bindings are carried over.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the line is dead or unknown, or
    /// [`TopologyError::Structural`] if the vertices do not fit its type.
    pub fn rewrite_line(
        &mut self,
        id: LineId,
        points: Vec<Point3>,
        cats: Categories,
    ) -> Result<(), TopologyError> {
        let kind = self.line(id)?.kind;
        check_vertices(kind, &points)?;
        let old_topo = self.line(id)?.topo;
        self.disconnect(id);
        let bbox = BoundBox::from_points(&points);
        {
            let line = self.line_mut(id)?;
            line.points = points;
            line.cats = cats;
            line.bbox = bbox;
        }
        let mut topo = self.connect(id)?;
        match (&mut topo, old_topo) {
            (
                LineTopo::Boundary { left, right, .. },
                LineTopo::Boundary {
                    left: old_left,
                    right: old_right,
                    ..
                },
            ) => {
                *left = old_left;
                *right = old_right;
            }
            (LineTopo::Centroid { area }, LineTopo::Centroid { area: old_area }) => {
                *area = old_area;
            }
            _ => {}
        }
        self.line_mut(id)?.topo = topo;
        self.bbox.extend(&bbox);
        Ok(())
    }

    fn connect(&mut self, id: LineId) -> Result<LineTopo, TopologyError> {
        let line = self.line(id)?;
        let kind = line.kind;
        let topo = match kind {
            LineType::Line | LineType::Boundary => {
                let first = line.points[0];
                let last = line.points[line.points.len() - 1];
                let (a1, a2) = (begin_angle(&line.points), end_angle(&line.points));
                let n1 = self.node_for(first);
                let n2 = self.node_for(last);
                if let Some(node) = self.nodes.get_mut(n1) {
                    node.attach(DirectedLine::new(id, true), a1);
                }
                if let Some(node) = self.nodes.get_mut(n2) {
                    node.attach(DirectedLine::new(id, false), a2);
                }
                if kind == LineType::Line {
                    LineTopo::Line { n1, n2 }
                } else {
                    LineTopo::Boundary {
                        n1,
                        n2,
                        left: SideRef::None,
                        right: SideRef::None,
                    }
                }
            }
            LineType::Point => LineTopo::Point,
            LineType::Centroid => LineTopo::Centroid {
                area: CentroidArea::Outside,
            },
            LineType::Face => LineTopo::Face,
            LineType::Kernel => LineTopo::Kernel,
        };
        Ok(topo)
    }

    fn disconnect(&mut self, id: LineId) {
        let Some((n1, n2)) = self.lines.get(id).and_then(LineData::nodes) else {
            return;
        };
        for n in [n1, n2] {
            if let Some(node) = self.nodes.get_mut(n) {
                node.detach(id);
            }
            self.remove_node_if_empty(n);
        }
    }

    /// Bounding box of everything registered so far.
    #[must_use]
    pub fn bbox(&self) -> BoundBox {
        self.bbox
    }

    // --- Area and isle operations ---

    /// Returns a reference to the area data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the area is dead or unknown.
    pub fn area(&self, id: AreaId) -> Result<&AreaData, TopologyError> {
        self.areas.get(id).ok_or_else(|| not_found("area"))
    }

    pub(crate) fn area_mut(&mut self, id: AreaId) -> Result<&mut AreaData, TopologyError> {
        self.areas.get_mut(id).ok_or_else(|| not_found("area"))
    }

    pub fn areas(&self) -> impl Iterator<Item = (AreaId, &AreaData)> {
        self.areas.iter()
    }

    #[must_use]
    pub fn num_areas(&self) -> usize {
        self.areas.len()
    }

    /// Returns a reference to the isle data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the isle is dead or unknown.
    pub fn isle(&self, id: IsleId) -> Result<&IsleData, TopologyError> {
        self.isles.get(id).ok_or_else(|| not_found("isle"))
    }

    pub(crate) fn isle_mut(&mut self, id: IsleId) -> Result<&mut IsleData, TopologyError> {
        self.isles.get_mut(id).ok_or_else(|| not_found("isle"))
    }

    pub fn isles(&self) -> impl Iterator<Item = (IsleId, &IsleData)> {
        self.isles.iter()
    }

    #[must_use]
    pub fn num_isles(&self) -> usize {
        self.isles.len()
    }

    /// Union of the boxes of the ring's lines.
    fn ring_bbox(&self, ring: &[DirectedLine]) -> Result<BoundBox, TopologyError> {
        let mut bbox = BoundBox::empty();
        for d in ring {
            bbox.extend(&self.line(d.line)?.bbox);
        }
        Ok(bbox)
    }

    fn claim_sides(&mut self, ring: &[DirectedLine], side: SideRef) -> Result<(), TopologyError> {
        for d in ring {
            let line = self.line(d.line)?;
            if line.kind != LineType::Boundary {
                return Err(TopologyError::Structural(format!(
                    "ring member {:?} is a {}, not a boundary",
                    d.line, line.kind
                )));
            }
            if !line.side(d.forward).is_none() {
                return Err(TopologyError::Structural(format!(
                    "boundary {:?} already has an area or isle on that side",
                    d.line
                )));
            }
        }
        for d in ring {
            self.line_mut(d.line)?.set_side(d.forward, side);
        }
        Ok(())
    }

    /// Creates an area from a clockwise ring and claims the ring's sides.
    pub(crate) fn add_area(&mut self, ring: Vec<DirectedLine>) -> Result<AreaId, TopologyError> {
        let bbox = self.ring_bbox(&ring)?;
        let id = self.areas.insert(AreaData {
            lines: Vec::new(),
            bbox,
            centroid: None,
            isles: Vec::new(),
        });
        if let Err(e) = self.claim_sides(&ring, SideRef::Area(id)) {
            self.areas.remove(id);
            return Err(e);
        }
        self.area_mut(id)?.lines = ring;
        Ok(id)
    }

    /// Creates an isle from a counter-clockwise ring and claims the ring's sides.
    pub(crate) fn add_isle(&mut self, ring: Vec<DirectedLine>) -> Result<IsleId, TopologyError> {
        let bbox = self.ring_bbox(&ring)?;
        let id = self.isles.insert(IsleData {
            lines: Vec::new(),
            bbox,
            area: None,
        });
        if let Err(e) = self.claim_sides(&ring, SideRef::Isle(id)) {
            self.isles.remove(id);
            return Err(e);
        }
        self.isle_mut(id)?.lines = ring;
        Ok(id)
    }

    /// Nests an isle in an area.
    pub(crate) fn attach_isle(&mut self, isle: IsleId, area: AreaId) -> Result<(), TopologyError> {
        if let Some(old) = self.isle(isle)?.area {
            return Err(TopologyError::Structural(format!(
                "isle {isle:?} is already nested in area {old:?}"
            )));
        }
        let a = self.area_mut(area)?;
        if !a.isles.contains(&isle) {
            a.isles.push(isle);
        }
        self.isle_mut(isle)?.area = Some(area);
        Ok(())
    }

    /// Records a centroid's binding. The first centroid of an area binds,
    /// later ones are recorded as duplicates. Returns the stored binding.
    pub(crate) fn bind_centroid(
        &mut self,
        centroid: LineId,
        area: Option<AreaId>,
    ) -> Result<CentroidArea, TopologyError> {
        let binding = match area {
            None => CentroidArea::Outside,
            Some(a) => {
                let data = self.area_mut(a)?;
                if data.centroid.is_none() {
                    data.centroid = Some(centroid);
                    CentroidArea::Bound(a)
                } else {
                    CentroidArea::Duplicate(a)
                }
            }
        };
        let line = self.line_mut(centroid)?;
        match &mut line.topo {
            LineTopo::Centroid { area } => *area = binding,
            _ => {
                return Err(TopologyError::Structural(format!(
                    "line {centroid:?} is not a centroid"
                )))
            }
        }
        Ok(binding)
    }

    /// Vertices of a ring in traversal order, without closing vertex.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if a ring member is dead.
    pub fn ring_points(&self, ring: &[DirectedLine]) -> Result<Vec<Point3>, TopologyError> {
        let mut pts = Vec::new();
        for d in ring {
            append_to_ring(&mut pts, self.line(d.line)?.directed_points(d.forward));
        }
        if pts.len() > 1 && pts.first().map(|p| (p.x, p.y)) == pts.last().map(|p| (p.x, p.y)) {
            pts.pop();
        }
        Ok(pts)
    }

    /// Outer ring polygon of an area.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the area or a ring member is dead.
    pub fn area_points(&self, id: AreaId) -> Result<Vec<Point3>, TopologyError> {
        self.ring_points(&self.area(id)?.lines)
    }

    /// Ring polygon of an isle.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the isle or a ring member is dead.
    pub fn isle_points(&self, id: IsleId) -> Result<Vec<Point3>, TopologyError> {
        self.ring_points(&self.isle(id)?.lines)
    }

    /// Returns `true` if `(x, y)` is inside the outer ring of the area (or on
    /// it) and not strictly inside any of its isles.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the area or a ring member is dead.
    pub fn point_in_area(&self, x: f64, y: f64, id: AreaId) -> Result<bool, TopologyError> {
        let area = self.area(id)?;
        if !area.bbox.contains_point_2d(&Point3::new(x, y, 0.0)) {
            return Ok(false);
        }
        if point_location(x, y, &self.ring_points(&area.lines)?) == PointLocation::Outside {
            return Ok(false);
        }
        for &isle in &area.isles {
            if point_location(x, y, &self.isle_points(isle)?) == PointLocation::Inside {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Planar size of an area: outer ring minus its isles.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NotFound`] if the area or a ring member is dead.
    pub fn area_size(&self, id: AreaId) -> Result<f64, TopologyError> {
        let area = self.area(id)?;
        let mut size = signed_area_2d(&self.ring_points(&area.lines)?).abs();
        for &isle in &area.isles {
            size -= signed_area_2d(&self.isle_points(isle)?).abs();
        }
        Ok(size)
    }

    // --- Category index ---

    #[must_use]
    pub fn category_index(&self) -> &CategoryIndex {
        &self.cidx
    }

    pub(crate) fn category_index_mut(&mut self) -> &mut CategoryIndex {
        &mut self.cidx
    }

    // --- Level teardown ---

    pub(crate) fn clear_categories(&mut self) {
        self.cidx.clear();
    }

    pub(crate) fn unbind_centroids(&mut self) {
        for (_, area) in &mut self.areas {
            area.centroid = None;
        }
        for (_, line) in &mut self.lines {
            if let LineTopo::Centroid { area } = &mut line.topo {
                *area = CentroidArea::Outside;
            }
        }
    }

    pub(crate) fn detach_isles(&mut self) {
        for (_, area) in &mut self.areas {
            area.isles.clear();
        }
        for (_, isle) in &mut self.isles {
            isle.area = None;
        }
    }

    pub(crate) fn clear_areas(&mut self) {
        self.unbind_centroids();
        self.areas.clear();
        self.isles.clear();
        for (_, line) in &mut self.lines {
            if let LineTopo::Boundary { left, right, .. } = &mut line.topo {
                *left = SideRef::None;
                *right = SideRef::None;
            }
        }
    }

    /// Drops every record. Previously issued IDs stay invalid.
    pub(crate) fn clear(&mut self) {
        self.clear_areas();
        self.cidx.clear();
        self.lines.clear();
        self.nodes.clear();
        self.node_lookup.clear();
        self.bbox = BoundBox::empty();
        self.next_offset = 0;
        self.updates = NodeUpdates::default();
    }
}

fn check_vertices(kind: LineType, points: &[Point3]) -> Result<(), TopologyError> {
    if points.is_empty() {
        return Err(TopologyError::Structural(format!("{kind} without vertices")));
    }
    if kind.is_point_like() && points.len() != 1 {
        return Err(TopologyError::Structural(format!(
            "{kind} with {} vertices",
            points.len()
        )));
    }
    Ok(())
}
