//! The open-map handle: owns the primitive store, its spatial index and the
//! build state.

use crate::build::{self, BuildPass, BuildStats};
use crate::config::{IndexDims, MapConfig};
use crate::error::{BuildError, GraphError, IndexError, Result, TopologyError};
use crate::math::line::distance_2d;
use crate::math::{BoundBox, Point3};
use crate::network::{Graph, NetworkBuilder, ShortestPath};
use crate::spatial::SpatialIndex;
use crate::stream::{Primitive, PrimitiveReader};
use crate::topology::{
    AreaId, BuildLevel, Categories, CategoryIndex, CentroidArea, DirectedLine, IsleId, LineId,
    LineType, NodeId, PrimitiveStore, SideRef,
};

/// Progress callback: pass and percentage.
pub type ProgressFn = Box<dyn FnMut(BuildPass, u8)>;

/// One open vector map.
///
/// Topology is built level by level with [`build`](Self::build). Accessors
/// fail with [`TopologyError::NotBuilt`] until the level they need has been
/// reached.
pub struct Map {
    config: MapConfig,
    store: PrimitiveStore,
    index: SpatialIndex,
    level: BuildLevel,
    stats: BuildStats,
    source: Option<Box<dyn PrimitiveReader>>,
    progress: Option<ProgressFn>,
    graph: Option<Graph<NodeId, DirectedLine>>,
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("level", &self.level)
            .field("stats", &self.stats)
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl Map {
    /// Creates an empty map without a primitive source, ready for
    /// [`write_line`](Self::write_line). It starts at [`BuildLevel::Base`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if a file-backed index cannot be created.
    pub fn new(config: MapConfig) -> Result<Self> {
        let index = SpatialIndex::new(&config.index)?;
        Ok(Self {
            config,
            store: PrimitiveStore::new(),
            index,
            level: BuildLevel::Base,
            stats: BuildStats::default(),
            source: None,
            progress: None,
            graph: None,
        })
    }

    /// Opens a map over a primitive stream. Nothing is read until
    /// [`build`](Self::build) is called.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if a file-backed index cannot be created.
    pub fn open(config: MapConfig, source: impl PrimitiveReader + 'static) -> Result<Self> {
        let mut map = Self::new(config)?;
        map.level = BuildLevel::None;
        map.source = Some(Box::new(source));
        Ok(map)
    }

    /// Installs a progress callback for build passes.
    #[must_use]
    pub fn with_progress(mut self, f: impl FnMut(BuildPass, u8) + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[must_use]
    pub fn level(&self) -> BuildLevel {
        self.level
    }

    /// Counts of the topology built so far.
    #[must_use]
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Read access to the primitive store.
    #[must_use]
    pub fn store(&self) -> &PrimitiveStore {
        &self.store
    }

    fn require(&self, required: BuildLevel) -> std::result::Result<(), TopologyError> {
        if self.level < required {
            return Err(TopologyError::NotBuilt {
                required,
                current: self.level,
            });
        }
        Ok(())
    }

    // --- Building ---

    /// Brings the topology to `level`.
    ///
    /// Lower levels are dropped, higher ones built pass by pass. If a pass
    /// fails, its partial state is discarded and the map stays at the last
    /// level that completed.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing pass, e.g. [`BuildError::Reader`]
    /// for an unreadable primitive or [`BuildError::NoSource`] when the base
    /// pass has nothing to read.
    pub fn build(&mut self, level: BuildLevel) -> Result<BuildStats> {
        if level < self.level {
            self.downgrade(level)?;
        }
        while self.level < level {
            let Some(next) = self.level.next() else {
                break;
            };
            tracing::debug!(from = %self.level, to = %next, "build level");
            if let Err(e) = self.run_pass(next) {
                tracing::warn!(level = %next, error = %e, "build pass failed");
                let current = self.level;
                self.downgrade(current)?;
                return Err(e);
            }
            self.level = next;
        }
        Ok(self.stats)
    }

    fn run_pass(&mut self, level: BuildLevel) -> Result<()> {
        let sink: Option<&mut dyn FnMut(BuildPass, u8)> = match &mut self.progress {
            Some(f) => Some(f.as_mut()),
            None => None,
        };
        match level {
            BuildLevel::None => {}
            BuildLevel::Base => {
                let reader = self.source.as_deref_mut().ok_or(BuildError::NoSource)?;
                build::base::run(&mut self.store, &mut self.index, reader, &mut self.stats, sink)?;
            }
            BuildLevel::Areas => {
                build::areas::run(&mut self.store, &mut self.index, &mut self.stats, sink)?;
            }
            BuildLevel::AttachIsles => {
                build::isles::run(&mut self.store, &mut self.index, &mut self.stats, sink)?;
            }
            BuildLevel::Centroids => {
                build::centroids::run(&mut self.store, &mut self.index, &mut self.stats, sink)?;
            }
            BuildLevel::All => build::categories::run(&mut self.store, &mut self.stats, sink),
        }
        Ok(())
    }

    /// Drops all derived state above `target`.
    fn downgrade(&mut self, target: BuildLevel) -> Result<()> {
        if target < BuildLevel::All {
            self.store.clear_categories();
            self.stats.category_entries = 0;
        }
        if target < BuildLevel::Centroids {
            self.store.unbind_centroids();
            self.stats.bound_centroids = 0;
            self.stats.duplicate_centroids = 0;
            self.stats.orphan_centroids = 0;
        }
        if target < BuildLevel::AttachIsles {
            self.store.detach_isles();
            self.stats.attached_isles = 0;
        }
        if target < BuildLevel::Areas {
            self.store.clear_areas();
            self.index.clear_areas()?;
            self.stats.areas = 0;
            self.stats.isles = 0;
            self.stats.open_rings = 0;
        }
        if target < BuildLevel::Base {
            self.store.clear();
            self.index.clear()?;
            self.stats = BuildStats::default();
            self.graph = None;
        }
        if target != self.level {
            tracing::debug!(from = %self.level, to = %target, "topology downgraded");
        }
        self.level = target;
        Ok(())
    }

    // --- Counts and topology accessors ---

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`].
    pub fn num_nodes(&self) -> Result<usize> {
        self.require(BuildLevel::Base)?;
        Ok(self.store.num_nodes())
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`].
    pub fn num_lines(&self) -> Result<usize> {
        self.require(BuildLevel::Base)?;
        Ok(self.store.num_lines())
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Areas`].
    pub fn num_areas(&self) -> Result<usize> {
        self.require(BuildLevel::Areas)?;
        Ok(self.store.num_areas())
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Areas`].
    pub fn num_isles(&self) -> Result<usize> {
        self.require(BuildLevel::Areas)?;
        Ok(self.store.num_isles())
    }

    /// Start and end node of a line or boundary; `None` for other types.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Areas`], or
    /// [`TopologyError::NotFound`] for a dead line.
    pub fn line_nodes(&self, line: LineId) -> Result<Option<(NodeId, NodeId)>> {
        self.require(BuildLevel::Areas)?;
        Ok(self.store.line(line)?.nodes())
    }

    /// Left and right side of a boundary; `None` for other types.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Areas`], or
    /// [`TopologyError::NotFound`] for a dead line.
    pub fn line_areas(&self, line: LineId) -> Result<Option<(SideRef, SideRef)>> {
        self.require(BuildLevel::Areas)?;
        Ok(self.store.line(line)?.sides())
    }

    /// Area binding of a centroid; `None` for other types.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Centroids`], or
    /// [`TopologyError::NotFound`] for a dead line.
    pub fn centroid_area(&self, line: LineId) -> Result<Option<CentroidArea>> {
        self.require(BuildLevel::Centroids)?;
        Ok(self.store.line(line)?.centroid_area())
    }

    /// The area containing `(x, y)`, isles excluded.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::AttachIsles`].
    pub fn find_area(&mut self, x: f64, y: f64) -> Result<Option<AreaId>> {
        self.require(BuildLevel::AttachIsles)?;
        build::centroids::find_area(&self.store, &mut self.index, x, y)
    }

    /// The node nearest to `(x, y)` within `max_dist`.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`].
    pub fn find_node(&mut self, x: f64, y: f64, max_dist: f64) -> Result<Option<NodeId>> {
        self.require(BuildLevel::Base)?;
        let q = Point3::new(x, y, 0.0);
        let rect = BoundBox::from_xy(x, y, x, y).expanded_2d(max_dist);
        let mut best: Option<(NodeId, f64)> = None;
        for id in self.index.select_nodes(&rect)? {
            let d = distance_2d(&self.store.node(id)?.point, &q);
            if d <= max_dist && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        Ok(best.map(|(id, _)| id))
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`].
    pub fn select_nodes(&mut self, rect: &BoundBox) -> Result<Vec<NodeId>> {
        self.require(BuildLevel::Base)?;
        Ok(self.index.select_nodes(rect)?)
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`].
    pub fn select_lines(&mut self, rect: &BoundBox) -> Result<Vec<LineId>> {
        self.require(BuildLevel::Base)?;
        Ok(self.index.select_lines(rect)?)
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Areas`].
    pub fn select_areas(&mut self, rect: &BoundBox) -> Result<Vec<AreaId>> {
        self.require(BuildLevel::Areas)?;
        Ok(self.index.select_areas(rect)?)
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Areas`].
    pub fn select_isles(&mut self, rect: &BoundBox) -> Result<Vec<IsleId>> {
        self.require(BuildLevel::Areas)?;
        Ok(self.index.select_isles(rect)?)
    }

    /// Discards the spatial index and indexes the store from scratch.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`], or an
    /// [`IndexError`] from node storage.
    pub fn rebuild_spatial_index(&mut self) -> Result<()> {
        self.require(BuildLevel::Base)?;
        self.store.take_node_updates();
        self.index.build_from_store(&self.store)?;
        Ok(())
    }

    /// Writes back cached spatial index nodes.
    ///
    /// # Errors
    ///
    /// [`IndexError::Io`] on write failure.
    pub fn flush_index(&mut self) -> Result<()> {
        Ok(self.index.flush()?)
    }

    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::All`].
    pub fn category_index(&self) -> Result<&CategoryIndex> {
        self.require(BuildLevel::All)?;
        Ok(self.store.category_index())
    }

    // --- Editing ---

    /// Reads a primitive back.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`], or
    /// [`TopologyError::NotFound`] for a dead line.
    pub fn read_line(&self, line: LineId) -> Result<Primitive> {
        self.require(BuildLevel::Base)?;
        Ok(self.store.read(line)?)
    }

    /// Registers a new primitive and indexes it with its nodes.
    ///
    /// Areas, centroid bindings and the category index are not updated;
    /// rebuild from [`BuildLevel::Base`] to refresh them.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`],
    /// [`TopologyError::Structural`] for a malformed vertex list, or an
    /// [`IndexError`] from node storage.
    pub fn write_line(
        &mut self,
        kind: LineType,
        points: Vec<Point3>,
        cats: Categories,
    ) -> Result<LineId> {
        self.require(BuildLevel::Base)?;
        let id = self.store.register(kind, points, cats)?;
        self.index.insert_line(id, self.store.line(id)?.bbox)?;
        self.sync_nodes()?;
        Ok(id)
    }

    /// Deletes a line and the nodes it leaves empty.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`],
    /// [`TopologyError::NotFound`] for a dead line, or
    /// [`IndexError::Unsupported`] with a 3D index.
    pub fn delete_line(&mut self, line: LineId) -> Result<Primitive> {
        self.require(BuildLevel::Base)?;
        self.require_deletable_index()?;
        let bbox = self.store.line(line)?.bbox;
        let primitive = self.store.delete_line(line)?;
        self.index.delete_line(line, &bbox)?;
        self.sync_nodes()?;
        Ok(primitive)
    }

    /// Replaces the vertices and categories of a line, keeping its id.
    ///
    /// # Errors
    ///
    /// As [`delete_line`](Self::delete_line), plus
    /// [`TopologyError::Structural`] for a malformed vertex list.
    pub fn rewrite_line(
        &mut self,
        line: LineId,
        points: Vec<Point3>,
        cats: Categories,
    ) -> Result<()> {
        self.require(BuildLevel::Base)?;
        self.require_deletable_index()?;
        let old = self.store.line(line)?.bbox;
        self.store.rewrite_line(line, points, cats)?;
        self.index.delete_line(line, &old)?;
        self.index.insert_line(line, self.store.line(line)?.bbox)?;
        self.sync_nodes()?;
        Ok(())
    }

    fn require_deletable_index(&self) -> Result<()> {
        if self.config.index.dims == IndexDims::Three {
            return Err(IndexError::Unsupported("delete from a 3D spatial index").into());
        }
        Ok(())
    }

    /// Applies the store's node journal to the node tree.
    fn sync_nodes(&mut self) -> Result<()> {
        let updates = self.store.take_node_updates();
        for (id, point) in updates.removed {
            self.index.delete_node(id, &point)?;
        }
        for id in updates.added {
            if let Ok(node) = self.store.node(id) {
                self.index.insert_node(id, &node.point)?;
            }
        }
        Ok(())
    }

    // --- Network ---

    /// Builds the network graph and keeps it on the map.
    ///
    /// # Errors
    ///
    /// [`TopologyError::NotBuilt`] below [`BuildLevel::Base`], or
    /// [`GraphError::InvalidCost`] for a non-finite cost.
    pub fn build_graph(&mut self, builder: &NetworkBuilder<'_>) -> Result<()> {
        self.graph = Some(builder.execute(self)?);
        Ok(())
    }

    #[must_use]
    pub fn graph(&self) -> Option<&Graph<NodeId, DirectedLine>> {
        self.graph.as_ref()
    }

    /// The built graph, for adding edges or node costs by hand.
    pub fn graph_mut(&mut self) -> Option<&mut Graph<NodeId, DirectedLine>> {
        self.graph.as_mut()
    }

    /// Cheapest path between two nodes over the built graph.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotBuilt`] without a graph, or
    /// [`GraphError::UnknownNode`] if `from` has no arcs and differs from `to`.
    pub fn shortest_path(&self, from: NodeId, to: NodeId) -> Result<ShortestPath<DirectedLine>> {
        let graph = self.graph.as_ref().ok_or(GraphError::NotBuilt)?;
        Ok(graph.shortest_path(from, to)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::stream::{ReaderError, VecReader};

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Primitive> {
        let c = [
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ];
        c.windows(2)
            .map(|w| {
                Primitive::new(LineType::Boundary, vec![p(w[0].0, w[0].1), p(w[1].0, w[1].1)])
            })
            .collect()
    }

    fn open(prims: Vec<Primitive>) -> Map {
        Map::open(MapConfig::default(), VecReader::new(prims)).unwrap()
    }

    #[test]
    fn accessors_name_the_missing_level() {
        let mut map = open(square(0.0, 0.0, 4.0));
        assert!(matches!(
            map.num_lines(),
            Err(Error::Topology(TopologyError::NotBuilt {
                required: BuildLevel::Base,
                current: BuildLevel::None
            }))
        ));
        map.build(BuildLevel::Base).unwrap();
        assert_eq!(map.num_lines().unwrap(), 4);
        assert!(matches!(
            map.num_areas(),
            Err(Error::Topology(TopologyError::NotBuilt {
                required: BuildLevel::Areas,
                ..
            }))
        ));
        assert!(map.find_area(1.0, 1.0).is_err());
    }

    #[test]
    fn square_with_hole_nests_isle() {
        let mut prims = square(0.0, 0.0, 10.0);
        prims.extend(square(4.0, 4.0, 2.0));
        prims.push(Primitive::new(LineType::Centroid, vec![p(1.0, 1.0)]).with_cat(1, 1));
        prims.push(Primitive::new(LineType::Centroid, vec![p(5.0, 5.0)]).with_cat(1, 2));
        let mut map = open(prims);
        let stats = map.build(BuildLevel::Centroids).unwrap();

        assert_eq!(stats.areas, 2);
        assert_eq!(stats.isles, 2);
        assert_eq!(stats.attached_isles, 1);
        assert_eq!(stats.bound_centroids, 2);

        let outer = map.find_area(1.0, 1.0).unwrap().unwrap();
        let inner = map.find_area(5.0, 5.0).unwrap().unwrap();
        assert_ne!(outer, inner);
        assert_eq!(map.store().area(outer).unwrap().isles.len(), 1);
        approx::assert_relative_eq!(map.store().area_size(outer).unwrap(), 96.0);
        assert!(map.find_area(20.0, 20.0).unwrap().is_none());
    }

    #[test]
    fn duplicate_centroid_keeps_first_binding() {
        let mut prims = square(0.0, 0.0, 4.0);
        prims.push(Primitive::new(LineType::Centroid, vec![p(1.0, 1.0)]));
        prims.push(Primitive::new(LineType::Centroid, vec![p(3.0, 3.0)]));
        prims.push(Primitive::new(LineType::Centroid, vec![p(9.0, 9.0)]));
        let mut map = open(prims);
        let stats = map.build(BuildLevel::Centroids).unwrap();
        assert_eq!(stats.bound_centroids, 1);
        assert_eq!(stats.duplicate_centroids, 1);
        assert_eq!(stats.orphan_centroids, 1);

        let centroids: Vec<LineId> = map
            .store()
            .lines()
            .filter(|(_, l)| l.kind == LineType::Centroid)
            .map(|(id, _)| id)
            .collect();
        let area = map.find_area(2.0, 2.0).unwrap().unwrap();
        assert_eq!(map.store().area(area).unwrap().centroid, Some(centroids[0]));
        assert_eq!(
            map.centroid_area(centroids[1]).unwrap(),
            Some(CentroidArea::Duplicate(area))
        );
        assert_eq!(
            map.centroid_area(centroids[2]).unwrap(),
            Some(CentroidArea::Outside)
        );
    }

    #[test]
    fn downgrade_drops_derived_state() {
        let mut prims = square(0.0, 0.0, 4.0);
        prims.push(Primitive::new(LineType::Centroid, vec![p(1.0, 1.0)]).with_cat(1, 7));
        let mut map = open(prims);
        map.build(BuildLevel::All).unwrap();
        assert_eq!(map.category_index().unwrap().find(1, 7).len(), 2);

        let stats = map.build(BuildLevel::Base).unwrap();
        assert_eq!(map.level(), BuildLevel::Base);
        assert_eq!(stats.areas, 0);
        assert_eq!(map.store().num_areas(), 0);
        assert!(map.store().category_index().is_empty());
        for (_, line) in map.store().lines() {
            if let Some((l, r)) = line.sides() {
                assert!(l.is_none() && r.is_none());
            }
        }

        map.build(BuildLevel::None).unwrap();
        assert_eq!(map.store().num_lines(), 0);
        let again = map.build(BuildLevel::All).unwrap();
        assert_eq!(again.areas, 1);
        assert_eq!(again.lines, 5);
    }

    #[test]
    fn progress_is_reported_per_pass() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut map = open(square(0.0, 0.0, 1.0))
            .with_progress(move |pass, pct| sink.borrow_mut().push((pass, pct)));
        map.build(BuildLevel::All).unwrap();
        let seen = seen.borrow();
        for pass in [
            BuildPass::Base,
            BuildPass::Areas,
            BuildPass::AttachIsles,
            BuildPass::Centroids,
            BuildPass::Categories,
        ] {
            assert!(seen.contains(&(pass, 100)), "{pass} did not complete");
        }
    }

    /// Serves primitives without telling how many there are.
    struct UnsizedReader(VecReader);

    impl PrimitiveReader for UnsizedReader {
        fn next_primitive(&mut self) -> std::result::Result<Option<Primitive>, ReaderError> {
            self.0.next_primitive()
        }

        fn rewind(&mut self) -> std::result::Result<(), ReaderError> {
            self.0.rewind()
        }
    }

    #[test]
    fn unsized_stream_reports_start_and_end() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let reader = UnsizedReader(VecReader::new(square(0.0, 0.0, 1.0)));
        let mut map = Map::open(MapConfig::default(), reader)
            .unwrap()
            .with_progress(move |pass, pct| sink.borrow_mut().push((pass, pct)));
        map.build(BuildLevel::Base).unwrap();
        assert_eq!(*seen.borrow(), vec![(BuildPass::Base, 0), (BuildPass::Base, 100)]);
    }

    struct FailingReader {
        served: usize,
    }

    impl PrimitiveReader for FailingReader {
        fn next_primitive(&mut self) -> std::result::Result<Option<Primitive>, ReaderError> {
            self.served += 1;
            if self.served > 2 {
                return Err("truncated record".into());
            }
            Ok(Some(Primitive::new(LineType::Point, vec![p(0.0, 0.0)])))
        }

        fn rewind(&mut self) -> std::result::Result<(), ReaderError> {
            self.served = 0;
            Ok(())
        }
    }

    #[test]
    fn unreadable_primitive_aborts_and_rolls_back() {
        let mut map = Map::open(MapConfig::default(), FailingReader { served: 0 }).unwrap();
        let err = map.build(BuildLevel::Base).unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::Reader { index: 2, .. })
        ));
        assert_eq!(map.level(), BuildLevel::None);
        assert_eq!(map.store().num_lines(), 0);
    }

    #[test]
    fn malformed_primitive_is_reported() {
        let mut map = open(vec![Primitive::new(LineType::Line, Vec::new())]);
        assert!(matches!(
            map.build(BuildLevel::Base),
            Err(Error::Build(BuildError::MalformedPrimitive { index: 0, .. }))
        ));
    }

    #[test]
    fn edits_keep_the_index_in_step() {
        let mut map = Map::new(MapConfig::default()).unwrap();
        let a = map
            .write_line(LineType::Line, vec![p(0.0, 0.0), p(5.0, 0.0)], Categories::new())
            .unwrap();
        assert!(map.find_node(5.1, 0.0, 0.5).unwrap().is_some());

        map.rewrite_line(a, vec![p(0.0, 0.0), p(0.0, 5.0)], Categories::new())
            .unwrap();
        assert!(map.find_node(5.1, 0.0, 0.5).unwrap().is_none());
        assert!(map.find_node(0.0, 5.2, 0.5).unwrap().is_some());
        assert_eq!(
            map.select_lines(&BoundBox::from_xy(4.0, -1.0, 6.0, 1.0)).unwrap(),
            Vec::<LineId>::new()
        );

        map.delete_line(a).unwrap();
        assert_eq!(map.num_nodes().unwrap(), 0);
        assert!(map
            .select_nodes(&BoundBox::from_xy(-10.0, -10.0, 10.0, 10.0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn map_without_source_cannot_rebuild_base() {
        let mut map = Map::new(MapConfig::default()).unwrap();
        map.build(BuildLevel::None).unwrap();
        assert!(matches!(
            map.build(BuildLevel::Base),
            Err(Error::Build(BuildError::NoSource))
        ));
    }
}
