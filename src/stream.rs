//! The primitive stream consumed by the topology builder.

use crate::math::Point3;
use crate::topology::{Categories, LineType};

/// Error produced by a [`PrimitiveReader`].
pub type ReaderError = Box<dyn std::error::Error + Send + Sync>;

/// A geometric primitive as delivered by a format reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: LineType,
    pub points: Vec<Point3>,
    pub cats: Categories,
}

impl Primitive {
    /// Creates an untagged primitive.
    #[must_use]
    pub fn new(kind: LineType, points: Vec<Point3>) -> Self {
        Self {
            kind,
            points,
            cats: Categories::new(),
        }
    }

    /// Adds a category pair.
    #[must_use]
    pub fn with_cat(mut self, layer: i32, cat: i32) -> Self {
        self.cats.add(layer, cat);
        self
    }

    /// Replaces the category set.
    #[must_use]
    pub fn with_cats(mut self, cats: Categories) -> Self {
        self.cats = cats;
        self
    }
}

/// Source of primitives, supplied by a format reader.
pub trait PrimitiveReader {
    /// Returns the next primitive, `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the element cannot be read.
    fn next_primitive(&mut self) -> Result<Option<Primitive>, ReaderError>;

    /// Restarts the stream from its first element.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be rewound.
    fn rewind(&mut self) -> Result<(), ReaderError>;

    /// Total number of primitives, when known. Used for progress only.
    fn size_hint(&self) -> Option<u64> {
        None
    }
}

/// An in-memory primitive stream.
#[derive(Debug, Clone, Default)]
pub struct VecReader {
    primitives: Vec<Primitive>,
    pos: usize,
}

impl VecReader {
    #[must_use]
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self { primitives, pos: 0 }
    }
}

impl PrimitiveReader for VecReader {
    fn next_primitive(&mut self) -> Result<Option<Primitive>, ReaderError> {
        let p = self.primitives.get(self.pos).cloned();
        if p.is_some() {
            self.pos += 1;
        }
        Ok(p)
    }

    fn rewind(&mut self) -> Result<(), ReaderError> {
        self.pos = 0;
        Ok(())
    }

    fn size_hint(&self) -> Option<u64> {
        u64::try_from(self.primitives.len()).ok()
    }
}
