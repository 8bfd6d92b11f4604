use crate::math::BoundBox;

use super::area::AreaId;
use super::line::DirectedLine;

slotmap::new_key_type! {
    /// Unique identifier for an isle in the primitive store.
    pub struct IsleId;
}

/// Data associated with an isle: a counter-clockwise boundary ring.
#[derive(Debug, Clone)]
pub struct IsleData {
    /// The ordered ring of boundaries.
    pub lines: Vec<DirectedLine>,
    /// Union of the ring boundaries' boxes.
    pub bbox: BoundBox,
    /// The area the isle lies in, `None` if unattached.
    pub area: Option<AreaId>,
}
