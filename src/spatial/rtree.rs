use std::path::Path;

use crate::config::IndexDims;
use crate::error::IndexError;
use crate::math::BoundBox;

use super::node::{Branch, RTreeNode, MAXCARD, MINFILL};
use super::split::{measure, quadratic_split};
use super::storage::{FileStore, MemoryStore, NodeStorage};

enum Inserted {
    /// The node absorbed the branch; its new cover.
    Fit(BoundBox),
    /// The node split; its new cover and the branch for the new sibling.
    Split(BoundBox, Branch),
}

/// A height-balanced R-tree over item ids.
///
/// Queries compare boxes only: every item whose box overlaps the query box is
/// returned, including items whose geometry does not.
#[derive(Debug)]
pub struct RTree {
    storage: NodeStorage,
    root: u64,
    root_level: u32,
    dims: IndexDims,
    len: usize,
}

impl RTree {
    /// Creates an empty in-memory tree.
    #[must_use]
    pub fn in_memory(dims: IndexDims) -> Self {
        let mut storage = MemoryStore::default();
        let root = storage.alloc(RTreeNode::new(0));
        Self {
            storage: NodeStorage::Memory(storage),
            root,
            root_level: 0,
            dims,
            len: 0,
        }
    }

    /// Creates an empty tree backed by a record file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if the file cannot be created.
    pub fn with_file(
        path: &Path,
        dims: IndexDims,
        cache_per_level: usize,
    ) -> Result<Self, IndexError> {
        let mut storage = NodeStorage::File(FileStore::create(path, cache_per_level)?);
        let root = storage.alloc(RTreeNode::new(0))?;
        Ok(Self {
            storage,
            root,
            root_level: 0,
            dims,
            len: 0,
        })
    }

    #[must_use]
    pub fn dims(&self) -> IndexDims {
        self.dims
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Level of the root node; 0 while the tree is a single leaf.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.root_level
    }

    fn overlaps(&self, a: &BoundBox, b: &BoundBox) -> bool {
        match self.dims {
            IndexDims::Two => a.overlaps_2d(b),
            IndexDims::Three => a.overlaps(b),
        }
    }

    /// Adds an item.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if node storage fails.
    pub fn insert(&mut self, id: u64, rect: BoundBox) -> Result<(), IndexError> {
        self.insert_branch(Branch { rect, child: id }, 0)?;
        self.len += 1;
        Ok(())
    }

    /// Inserts a branch into a node at `level`, growing a new root if the
    /// old one splits.
    fn insert_branch(&mut self, branch: Branch, level: u32) -> Result<(), IndexError> {
        if let Inserted::Split(cover, sibling) =
            self.insert_rec(self.root, self.root_level, branch, level)?
        {
            let mut root = RTreeNode::new(self.root_level + 1);
            root.branches.push(Branch {
                rect: cover,
                child: self.root,
            });
            root.branches.push(sibling);
            self.root = self.storage.alloc(root)?;
            self.root_level += 1;
            tracing::trace!(height = self.root_level, "spatial index root split");
        }
        Ok(())
    }

    fn insert_rec(
        &mut self,
        pos: u64,
        level: u32,
        branch: Branch,
        target: u32,
    ) -> Result<Inserted, IndexError> {
        let mut node = self.storage.get(pos, level)?;
        if node.level > target {
            if node.branches.is_empty() {
                return Err(IndexError::Corrupt {
                    offset: pos,
                    reason: "empty internal node".to_owned(),
                });
            }
            let i = self.pick_branch(&node, &branch.rect);
            let child = node.branches[i].child;
            match self.insert_rec(child, node.level - 1, branch, target)? {
                Inserted::Fit(cover) => {
                    node.branches[i].rect = cover;
                    let cover = node.cover();
                    self.storage.put(pos, node)?;
                    return Ok(Inserted::Fit(cover));
                }
                Inserted::Split(cover, sibling) => {
                    node.branches[i].rect = cover;
                    node.branches.push(sibling);
                }
            }
        } else {
            node.branches.push(branch);
        }

        if node.branches.len() <= MAXCARD {
            let cover = node.cover();
            self.storage.put(pos, node)?;
            return Ok(Inserted::Fit(cover));
        }

        let (keep, moved) = quadratic_split(std::mem::take(&mut node.branches), self.dims);
        node.branches = keep;
        let sibling = RTreeNode {
            level: node.level,
            branches: moved,
        };
        let cover = node.cover();
        let sibling_cover = sibling.cover();
        self.storage.put(pos, node)?;
        let sibling_pos = self.storage.alloc(sibling)?;
        Ok(Inserted::Split(
            cover,
            Branch {
                rect: sibling_cover,
                child: sibling_pos,
            },
        ))
    }

    /// Branch needing the least enlargement to include `rect`; ties go to
    /// the smaller branch.
    fn pick_branch(&self, node: &RTreeNode, rect: &BoundBox) -> usize {
        let mut best = 0;
        let mut best_growth = f64::INFINITY;
        let mut best_size = f64::INFINITY;
        for (i, b) in node.branches.iter().enumerate() {
            let size = measure(&b.rect, self.dims);
            let growth = measure(&b.rect.union(rect), self.dims) - size;
            if growth < best_growth || (growth == best_growth && size < best_size) {
                best = i;
                best_growth = growth;
                best_size = size;
            }
        }
        best
    }

    /// Removes an item. `rect` must overlap the box it was inserted with.
    ///
    /// Returns `false` if the item was not found.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unsupported`] for 3D trees, or an
    /// [`IndexError`] if node storage fails.
    pub fn delete(&mut self, id: u64, rect: &BoundBox) -> Result<bool, IndexError> {
        if self.dims == IndexDims::Three {
            return Err(IndexError::Unsupported("delete from a 3D spatial index"));
        }
        let mut orphans = Vec::new();
        if self
            .delete_rec(self.root, self.root_level, id, rect, &mut orphans)?
            .is_none()
        {
            return Ok(false);
        }
        self.len -= 1;

        for (branch, level) in orphans {
            self.insert_branch(branch, level)?;
        }

        // shrink the root while it has a single child
        while self.root_level > 0 {
            let root = self.storage.get(self.root, self.root_level)?;
            if root.branches.len() != 1 {
                break;
            }
            self.storage.free(self.root, self.root_level);
            self.root = root.branches[0].child;
            self.root_level -= 1;
        }
        Ok(true)
    }

    /// Returns the new cover and branch count of the node at `pos` if the
    /// item was found below it. Underfull children are dissolved and their
    /// branches pushed to `orphans` with the level they belong to.
    fn delete_rec(
        &mut self,
        pos: u64,
        level: u32,
        id: u64,
        rect: &BoundBox,
        orphans: &mut Vec<(Branch, u32)>,
    ) -> Result<Option<(BoundBox, usize)>, IndexError> {
        let mut node = self.storage.get(pos, level)?;
        if node.is_leaf() {
            let Some(i) = node.branches.iter().position(|b| b.child == id) else {
                return Ok(None);
            };
            node.branches.remove(i);
            let out = (node.cover(), node.branches.len());
            self.storage.put(pos, node)?;
            return Ok(Some(out));
        }

        for i in 0..node.branches.len() {
            if !self.overlaps(&node.branches[i].rect, rect) {
                continue;
            }
            let child = node.branches[i].child;
            let Some((cover, count)) = self.delete_rec(child, node.level - 1, id, rect, orphans)?
            else {
                continue;
            };
            if count >= MINFILL {
                node.branches[i].rect = cover;
            } else {
                let dissolved = self.storage.get(child, node.level - 1)?;
                orphans.extend(dissolved.branches.iter().map(|b| (*b, dissolved.level)));
                self.storage.free(child, node.level - 1);
                node.branches.remove(i);
            }
            let out = (node.cover(), node.branches.len());
            self.storage.put(pos, node)?;
            return Ok(Some(out));
        }
        Ok(None)
    }

    /// Returns the ids of all items whose box overlaps `rect`.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if node storage fails.
    pub fn select(&mut self, rect: &BoundBox) -> Result<Vec<u64>, IndexError> {
        let mut found = Vec::new();
        let mut stack = vec![(self.root, self.root_level)];
        while let Some((pos, level)) = stack.pop() {
            let node = self.storage.get(pos, level)?;
            for b in &node.branches {
                if !self.overlaps(&b.rect, rect) {
                    continue;
                }
                if node.is_leaf() {
                    found.push(b.child);
                } else {
                    stack.push((b.child, node.level - 1));
                }
            }
        }
        Ok(found)
    }

    /// Removes every item.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if node storage fails.
    pub fn clear(&mut self) -> Result<(), IndexError> {
        self.storage.reset()?;
        self.root = self.storage.alloc(RTreeNode::new(0))?;
        self.root_level = 0;
        self.len = 0;
        Ok(())
    }

    /// Writes back every cached node.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] on write failure.
    pub fn flush(&mut self) -> Result<(), IndexError> {
        self.storage.flush()
    }

    /// Number of reclaimed node positions awaiting reuse.
    #[must_use]
    pub fn free_nodes(&self) -> usize {
        self.storage.free_len()
    }
}
