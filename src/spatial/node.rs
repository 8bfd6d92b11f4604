//! R-tree node records and their fixed-size on-disk layout.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::IndexError;
use crate::math::{BoundBox, Point3};

/// Maximum number of branches per node.
pub const MAXCARD: usize = 9;

/// Minimum number of branches a non-root node keeps after a split or delete.
pub const MINFILL: usize = MAXCARD / 2;

/// Layout version of the node records. Not written to the file.
pub const NODE_LAYOUT_V1: u32 = 1;

/// Bytes per branch: six coordinates and an 8-byte child reference.
pub const BRANCH_SIZE: usize = 6 * 8 + 8;

/// Bytes per node record: count and level, then `MAXCARD` branch slots.
pub const RECORD_SIZE: usize = 4 + 4 + MAXCARD * BRANCH_SIZE;

/// One entry of a node.
///
/// In a leaf, `child` is the indexed item id; in an internal node it is the
/// storage position of the child node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    pub rect: BoundBox,
    pub child: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RTreeNode {
    /// 0 for leaves, increasing towards the root.
    pub level: u32,
    pub branches: Vec<Branch>,
}

impl RTreeNode {
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level,
            branches: Vec::with_capacity(MAXCARD + 1),
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }

    /// Union of the branch boxes.
    #[must_use]
    pub fn cover(&self) -> BoundBox {
        self.branches
            .iter()
            .fold(BoundBox::empty(), |acc, b| acc.union(&b.rect))
    }
}

/// Encodes a node into a [`RECORD_SIZE`] record (little-endian).
///
/// # Errors
///
/// Returns [`IndexError::Corrupt`] if the node holds more than [`MAXCARD`]
/// branches.
pub fn encode(node: &RTreeNode) -> Result<Bytes, IndexError> {
    if node.branches.len() > MAXCARD {
        return Err(IndexError::Corrupt {
            offset: 0,
            reason: format!("node with {} branches", node.branches.len()),
        });
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let count = node.branches.len() as i32;
    let level = i32::try_from(node.level).map_err(|_| IndexError::Corrupt {
        offset: 0,
        reason: format!("node level {} out of range", node.level),
    })?;

    let mut buf = BytesMut::with_capacity(RECORD_SIZE);
    buf.put_i32_le(count);
    buf.put_i32_le(level);
    for b in &node.branches {
        buf.put_f64_le(b.rect.min.x);
        buf.put_f64_le(b.rect.min.y);
        buf.put_f64_le(b.rect.min.z);
        buf.put_f64_le(b.rect.max.x);
        buf.put_f64_le(b.rect.max.y);
        buf.put_f64_le(b.rect.max.z);
        buf.put_u64_le(b.child);
    }
    buf.put_bytes(0, RECORD_SIZE - buf.len());
    Ok(buf.freeze())
}

/// Decodes a record read at `offset`.
///
/// # Errors
///
/// Returns [`IndexError::Corrupt`] if the record is short or its header is
/// out of range.
pub fn decode(mut data: &[u8], offset: u64) -> Result<RTreeNode, IndexError> {
    let corrupt = |reason: String| IndexError::Corrupt { offset, reason };
    if data.len() < RECORD_SIZE {
        return Err(corrupt(format!("short record ({} bytes)", data.len())));
    }
    let count = data.get_i32_le();
    let level = data.get_i32_le();
    let count = usize::try_from(count)
        .ok()
        .filter(|&c| c <= MAXCARD)
        .ok_or_else(|| corrupt(format!("branch count {count}")))?;
    let level = u32::try_from(level).map_err(|_| corrupt(format!("level {level}")))?;

    let mut node = RTreeNode::new(level);
    for _ in 0..count {
        let min = Point3::new(data.get_f64_le(), data.get_f64_le(), data.get_f64_le());
        let max = Point3::new(data.get_f64_le(), data.get_f64_le(), data.get_f64_le());
        let child = data.get_u64_le();
        node.branches.push(Branch {
            rect: BoundBox::new(min, max),
            child,
        });
    }
    Ok(node)
}
