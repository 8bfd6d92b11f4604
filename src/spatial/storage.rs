//! Node storage for the R-tree: in memory, or a flat record file behind a
//! per-level buffer cache.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::IndexError;

use super::node::{decode, encode, RTreeNode, RECORD_SIZE};

#[derive(Debug)]
pub enum NodeStorage {
    Memory(MemoryStore),
    File(FileStore),
}

impl NodeStorage {
    /// Stores a new node and returns its position.
    pub fn alloc(&mut self, node: RTreeNode) -> Result<u64, IndexError> {
        match self {
            NodeStorage::Memory(m) => Ok(m.alloc(node)),
            NodeStorage::File(f) => f.alloc(node),
        }
    }

    /// Loads the node at `pos`. `level` is the level the caller expects the
    /// node to have; the file store uses it to pick the cache.
    pub fn get(&mut self, pos: u64, level: u32) -> Result<RTreeNode, IndexError> {
        match self {
            NodeStorage::Memory(m) => m.get(pos),
            NodeStorage::File(f) => f.get(pos, level),
        }
    }

    pub fn put(&mut self, pos: u64, node: RTreeNode) -> Result<(), IndexError> {
        match self {
            NodeStorage::Memory(m) => m.put(pos, node),
            NodeStorage::File(f) => f.put(pos, node),
        }
    }

    /// Releases the node at `pos` for reuse.
    pub fn free(&mut self, pos: u64, level: u32) {
        match self {
            NodeStorage::Memory(m) => m.free(pos),
            NodeStorage::File(f) => f.free(pos, level),
        }
    }

    pub fn flush(&mut self) -> Result<(), IndexError> {
        match self {
            NodeStorage::Memory(_) => Ok(()),
            NodeStorage::File(f) => f.flush(),
        }
    }

    /// Drops every node.
    pub fn reset(&mut self) -> Result<(), IndexError> {
        match self {
            NodeStorage::Memory(m) => {
                *m = MemoryStore::default();
                Ok(())
            }
            NodeStorage::File(f) => f.reset(),
        }
    }

    /// Number of reclaimed positions waiting for reuse.
    #[must_use]
    pub fn free_len(&self) -> usize {
        match self {
            NodeStorage::Memory(m) => m.free.len(),
            NodeStorage::File(f) => f.free.len(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: Vec<Option<RTreeNode>>,
    free: Vec<u64>,
}

impl MemoryStore {
    fn slot(&mut self, pos: u64) -> Result<&mut Option<RTreeNode>, IndexError> {
        usize::try_from(pos)
            .ok()
            .and_then(|i| self.nodes.get_mut(i))
            .ok_or_else(|| IndexError::Corrupt {
                offset: pos,
                reason: "node position out of range".to_owned(),
            })
    }

    pub(crate) fn alloc(&mut self, node: RTreeNode) -> u64 {
        if let Some(pos) = self.free.pop() {
            if let Ok(slot) = self.slot(pos) {
                *slot = Some(node);
                return pos;
            }
        }
        self.nodes.push(Some(node));
        (self.nodes.len() - 1) as u64
    }

    fn get(&mut self, pos: u64) -> Result<RTreeNode, IndexError> {
        self.slot(pos)?.clone().ok_or_else(|| IndexError::Corrupt {
            offset: pos,
            reason: "read of a freed node".to_owned(),
        })
    }

    fn put(&mut self, pos: u64, node: RTreeNode) -> Result<(), IndexError> {
        *self.slot(pos)? = Some(node);
        Ok(())
    }

    fn free(&mut self, pos: u64) {
        if let Ok(slot) = self.slot(pos) {
            if slot.take().is_some() {
                self.free.push(pos);
            }
        }
    }
}

#[derive(Debug)]
struct CacheSlot {
    pos: u64,
    node: RTreeNode,
    dirty: bool,
}

/// Flat file of fixed-size node records.
///
/// Each tree level has its own small cache, most recently used first. A
/// dirty node is written back when it falls off the end of its cache or on
/// [`flush`](Self::flush).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
    cache: Vec<Vec<CacheSlot>>,
    capacity: usize,
    free: Vec<u64>,
    end: u64,
}

const RECORD_LEN: u64 = RECORD_SIZE as u64;

impl FileStore {
    /// Creates (or truncates) the record file at `path`.
    pub fn create(path: &Path, capacity: usize) -> Result<Self, IndexError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            cache: Vec::new(),
            capacity: capacity.max(1),
            free: Vec::new(),
            end: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn level_cache(&mut self, level: u32) -> &mut Vec<CacheSlot> {
        let l = level as usize;
        if self.cache.len() <= l {
            self.cache.resize_with(l + 1, Vec::new);
        }
        &mut self.cache[l]
    }

    fn write_record(&mut self, pos: u64, node: &RTreeNode) -> Result<(), IndexError> {
        let rec = encode(node).map_err(|e| match e {
            IndexError::Corrupt { reason, .. } => IndexError::Corrupt {
                offset: pos,
                reason,
            },
            other => other,
        })?;
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(&rec)?;
        Ok(())
    }

    fn read_record(&mut self, pos: u64) -> Result<RTreeNode, IndexError> {
        let mut buf = [0u8; RECORD_SIZE];
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.read_exact(&mut buf)?;
        decode(&buf, pos)
    }

    /// Puts a slot at the front of its level cache, writing back whatever
    /// gets evicted.
    fn admit(&mut self, slot: CacheSlot) -> Result<(), IndexError> {
        let capacity = self.capacity;
        let cache = self.level_cache(slot.node.level);
        cache.insert(0, slot);
        if cache.len() > capacity {
            if let Some(evicted) = cache.pop() {
                if evicted.dirty {
                    tracing::trace!(pos = evicted.pos, "write back evicted index node");
                    self.write_record(evicted.pos, &evicted.node)?;
                }
            }
        }
        Ok(())
    }

    fn take_cached(&mut self, pos: u64, level: u32) -> Option<CacheSlot> {
        let cache = self.level_cache(level);
        let i = cache.iter().position(|s| s.pos == pos)?;
        Some(cache.remove(i))
    }

    fn alloc(&mut self, node: RTreeNode) -> Result<u64, IndexError> {
        let pos = if let Some(pos) = self.free.pop() {
            pos
        } else {
            let pos = self.end;
            self.end += RECORD_LEN;
            pos
        };
        self.admit(CacheSlot {
            pos,
            node,
            dirty: true,
        })?;
        Ok(pos)
    }

    fn get(&mut self, pos: u64, level: u32) -> Result<RTreeNode, IndexError> {
        let slot = match self.take_cached(pos, level) {
            Some(slot) => slot,
            None => CacheSlot {
                pos,
                node: self.read_record(pos)?,
                dirty: false,
            },
        };
        let node = slot.node.clone();
        self.admit(slot)?;
        Ok(node)
    }

    fn put(&mut self, pos: u64, node: RTreeNode) -> Result<(), IndexError> {
        self.take_cached(pos, node.level);
        self.admit(CacheSlot {
            pos,
            node,
            dirty: true,
        })
    }

    fn free(&mut self, pos: u64, level: u32) {
        self.take_cached(pos, level);
        self.free.push(pos);
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        let mut pending = Vec::new();
        for cache in &mut self.cache {
            for slot in cache.iter_mut().filter(|s| s.dirty) {
                slot.dirty = false;
                pending.push((slot.pos, slot.node.clone()));
            }
        }
        for (pos, node) in pending {
            self.write_record(pos, &node)?;
        }
        self.file.flush()?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), IndexError> {
        self.cache.clear();
        self.free.clear();
        self.end = 0;
        self.file.set_len(0)?;
        Ok(())
    }

    /// Current file length in bytes, counting records not yet written back.
    #[must_use]
    pub fn len_bytes(&self) -> u64 {
        self.end
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::BoundBox;
    use crate::spatial::node::Branch;

    fn temp_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("tree.sidx")
    }

    fn leaf(child: u64) -> RTreeNode {
        let mut n = RTreeNode::new(0);
        n.branches.push(Branch {
            rect: BoundBox::from_xy(0.0, 0.0, 1.0, 1.0),
            child,
        });
        n
    }

    #[test]
    fn evicted_nodes_are_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        let mut store = FileStore::create(&path, 2).unwrap();
        let positions: Vec<u64> = (0..5).map(|i| store.alloc(leaf(i)).unwrap()).collect();
        assert_eq!(store.cache[0].len(), 2);
        // the first three fell out of the cache and must come back from disk
        for (i, &pos) in positions.iter().enumerate() {
            assert_eq!(store.get(pos, 0).unwrap().branches[0].child, i as u64);
        }
    }

    #[test]
    fn most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        let mut store = FileStore::create(&path, 3).unwrap();
        let a = store.alloc(leaf(1)).unwrap();
        let _b = store.alloc(leaf(2)).unwrap();
        store.get(a, 0).unwrap();
        assert_eq!(store.cache[0][0].pos, a);
    }

    #[test]
    fn freed_positions_are_recycled() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        let mut store = FileStore::create(&path, 4).unwrap();
        let a = store.alloc(leaf(1)).unwrap();
        let _b = store.alloc(leaf(2)).unwrap();
        let before = store.len_bytes();
        store.free(a, 0);
        let c = store.alloc(leaf(3)).unwrap();
        assert_eq!(c, a);
        assert_eq!(store.len_bytes(), before);
    }

    #[test]
    fn flush_writes_fixed_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        let mut store = FileStore::create(&path, 8).unwrap();
        store.alloc(leaf(1)).unwrap();
        store.alloc(leaf(2)).unwrap();
        store.flush().unwrap();
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, 2 * RECORD_LEN);
    }

    #[test]
    fn memory_store_reuses_slots() {
        let mut store = NodeStorage::Memory(MemoryStore::default());
        let a = store.alloc(leaf(1)).unwrap();
        store.free(a, 0);
        assert_eq!(store.free_len(), 1);
        assert!(store.get(a, 0).is_err());
        let b = store.alloc(leaf(2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.free_len(), 0);
    }
}
