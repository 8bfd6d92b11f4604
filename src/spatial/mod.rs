//! R-tree spatial index over the records of a [`PrimitiveStore`].
//!
//! One tree per record kind. Entries are not kept in sync with store
//! mutations; callers insert/delete explicitly or rebuild.

pub mod node;
mod rtree;
mod split;
pub mod storage;

pub use rtree::RTree;

use slotmap::{Key, KeyData};

use crate::config::{IndexBacking, SpatialIndexConfig};
use crate::error::IndexError;
use crate::math::{BoundBox, Point3};
use crate::topology::{AreaId, IsleId, LineId, NodeId, PrimitiveStore};

fn to_raw<K: Key>(k: K) -> u64 {
    k.data().as_ffi()
}

fn from_raw<K: Key>(raw: u64) -> K {
    KeyData::from_ffi(raw).into()
}

/// Spatial index of one map: nodes, lines, areas and isles.
#[derive(Debug)]
pub struct SpatialIndex {
    nodes: RTree,
    lines: RTree,
    areas: RTree,
    isles: RTree,
}

impl SpatialIndex {
    /// Creates empty trees as configured.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if a record file cannot be created.
    pub fn new(config: &SpatialIndexConfig) -> Result<Self, IndexError> {
        let tree = |name: &str| -> Result<RTree, IndexError> {
            match &config.backing {
                IndexBacking::Memory => Ok(RTree::in_memory(config.dims)),
                IndexBacking::File { dir } => {
                    std::fs::create_dir_all(dir)?;
                    RTree::with_file(
                        &dir.join(format!("{name}.sidx")),
                        config.dims,
                        config.cache_per_level,
                    )
                }
            }
        };
        Ok(Self {
            nodes: tree("nodes")?,
            lines: tree("lines")?,
            areas: tree("areas")?,
            isles: tree("isles")?,
        })
    }

    /// Clears all trees and indexes every alive record of `store`.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if node storage fails.
    pub fn build_from_store(&mut self, store: &PrimitiveStore) -> Result<(), IndexError> {
        self.clear()?;
        for (id, node) in store.nodes() {
            self.insert_node(id, &node.point)?;
        }
        for (id, line) in store.lines() {
            self.insert_line(id, line.bbox)?;
        }
        for (id, area) in store.areas() {
            self.insert_area(id, area.bbox)?;
        }
        for (id, isle) in store.isles() {
            self.insert_isle(id, isle.bbox)?;
        }
        tracing::debug!(
            nodes = self.nodes.len(),
            lines = self.lines.len(),
            areas = self.areas.len(),
            isles = self.isles.len(),
            "spatial index rebuilt"
        );
        Ok(())
    }

    /// Empties every tree.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if node storage fails.
    pub fn clear(&mut self) -> Result<(), IndexError> {
        self.nodes.clear()?;
        self.lines.clear()?;
        self.clear_areas()
    }

    /// Empties the area and isle trees.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if node storage fails.
    pub fn clear_areas(&mut self) -> Result<(), IndexError> {
        self.areas.clear()?;
        self.isles.clear()
    }

    /// Writes back cached nodes of file-backed trees.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] on write failure.
    pub fn flush(&mut self) -> Result<(), IndexError> {
        self.nodes.flush()?;
        self.lines.flush()?;
        self.areas.flush()?;
        self.isles.flush()
    }

    pub fn insert_node(&mut self, id: NodeId, point: &Point3) -> Result<(), IndexError> {
        self.nodes.insert(to_raw(id), BoundBox::point(point))
    }

    pub fn insert_line(&mut self, id: LineId, bbox: BoundBox) -> Result<(), IndexError> {
        self.lines.insert(to_raw(id), bbox)
    }

    pub fn insert_area(&mut self, id: AreaId, bbox: BoundBox) -> Result<(), IndexError> {
        self.areas.insert(to_raw(id), bbox)
    }

    pub fn insert_isle(&mut self, id: IsleId, bbox: BoundBox) -> Result<(), IndexError> {
        self.isles.insert(to_raw(id), bbox)
    }

    /// # Errors
    ///
    /// Returns [`IndexError::Unsupported`] for 3D indexes.
    pub fn delete_node(&mut self, id: NodeId, point: &Point3) -> Result<bool, IndexError> {
        self.nodes.delete(to_raw(id), &BoundBox::point(point))
    }

    /// # Errors
    ///
    /// Returns [`IndexError::Unsupported`] for 3D indexes.
    pub fn delete_line(&mut self, id: LineId, bbox: &BoundBox) -> Result<bool, IndexError> {
        self.lines.delete(to_raw(id), bbox)
    }

    /// # Errors
    ///
    /// Returns [`IndexError::Unsupported`] for 3D indexes.
    pub fn delete_area(&mut self, id: AreaId, bbox: &BoundBox) -> Result<bool, IndexError> {
        self.areas.delete(to_raw(id), bbox)
    }

    /// # Errors
    ///
    /// Returns [`IndexError::Unsupported`] for 3D indexes.
    pub fn delete_isle(&mut self, id: IsleId, bbox: &BoundBox) -> Result<bool, IndexError> {
        self.isles.delete(to_raw(id), bbox)
    }

    pub fn select_nodes(&mut self, rect: &BoundBox) -> Result<Vec<NodeId>, IndexError> {
        Ok(self.nodes.select(rect)?.into_iter().map(from_raw).collect())
    }

    pub fn select_lines(&mut self, rect: &BoundBox) -> Result<Vec<LineId>, IndexError> {
        Ok(self.lines.select(rect)?.into_iter().map(from_raw).collect())
    }

    pub fn select_areas(&mut self, rect: &BoundBox) -> Result<Vec<AreaId>, IndexError> {
        Ok(self.areas.select(rect)?.into_iter().map(from_raw).collect())
    }

    pub fn select_isles(&mut self, rect: &BoundBox) -> Result<Vec<IsleId>, IndexError> {
        Ok(self.isles.select(rect)?.into_iter().map(from_raw).collect())
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn num_areas(&self) -> usize {
        self.areas.len()
    }

    #[must_use]
    pub fn num_isles(&self) -> usize {
        self.isles.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::{Categories, LineType};

    fn square_store() -> PrimitiveStore {
        let mut store = PrimitiveStore::new();
        let pts = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)];
        for w in pts.windows(2) {
            store
                .register(
                    LineType::Boundary,
                    vec![
                        Point3::new(w[0].0, w[0].1, 0.0),
                        Point3::new(w[1].0, w[1].1, 0.0),
                    ],
                    Categories::new(),
                )
                .unwrap();
        }
        store
            .register(LineType::Point, vec![Point3::new(10.0, 10.0, 0.0)], Categories::new())
            .unwrap();
        store
    }

    #[test]
    fn ids_round_trip_through_the_tree() {
        let store = square_store();
        let mut index = SpatialIndex::new(&SpatialIndexConfig::default()).unwrap();
        index.build_from_store(&store).unwrap();
        assert_eq!(index.num_nodes(), 4);
        assert_eq!(index.num_lines(), 5);

        let hits = index
            .select_lines(&BoundBox::from_xy(9.0, 9.0, 11.0, 11.0))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(store.line(hits[0]).unwrap().kind, LineType::Point);

        let corner = index
            .select_nodes(&BoundBox::from_xy(3.9, 3.9, 4.1, 4.1))
            .unwrap();
        assert_eq!(corner.len(), 1);
        assert_eq!(store.node(corner[0]).unwrap().point, Point3::new(4.0, 4.0, 0.0));
    }

    #[test]
    fn file_backing_creates_one_file_per_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("index");
        let config = SpatialIndexConfig::default().with_file_backing(&dir);
        let store = square_store();
        let mut index = SpatialIndex::new(&config).unwrap();
        index.build_from_store(&store).unwrap();
        index.flush().unwrap();
        for name in ["nodes", "lines", "areas", "isles"] {
            assert!(dir.join(format!("{name}.sidx")).exists());
        }
        assert_eq!(
            index
                .select_lines(&BoundBox::from_xy(-1.0, -1.0, 5.0, 5.0))
                .unwrap()
                .len(),
            4
        );
    }
}
