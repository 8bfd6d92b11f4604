use crate::math::BoundBox;

use super::isle::IsleId;
use super::line::{DirectedLine, LineId};

slotmap::new_key_type! {
    /// Unique identifier for an area in the primitive store.
    pub struct AreaId;
}

/// Data associated with an area.
///
/// The ring is clockwise: a boundary traversed forward has the area on its
/// right, a boundary traversed backward has it on its left.
#[derive(Debug, Clone)]
pub struct AreaData {
    /// The ordered ring of boundaries.
    pub lines: Vec<DirectedLine>,
    /// Union of the ring boundaries' boxes.
    pub bbox: BoundBox,
    /// The bound centroid, if any.
    pub centroid: Option<LineId>,
    /// Isles nested directly in this area.
    pub isles: Vec<IsleId>,
}
