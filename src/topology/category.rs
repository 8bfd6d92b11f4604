use super::area::AreaId;
use super::line::{LineId, LineType};

/// A `(layer, category)` pair attached to a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category {
    /// Layer (field) number.
    pub layer: i32,
    /// Category number within the layer.
    pub cat: i32,
}

impl Category {
    /// Creates a new category pair.
    #[must_use]
    pub fn new(layer: i32, cat: i32) -> Self {
        Self { layer, cat }
    }
}

/// The set of categories carried by a primitive.
///
/// Pairs are kept sorted and unique, so equality and union do not depend on
/// the order in which categories were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Categories {
    pairs: Vec<Category>,
}

impl Categories {
    /// Creates an empty category set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair; duplicates are ignored.
    pub fn add(&mut self, layer: i32, cat: i32) {
        let c = Category::new(layer, cat);
        if let Err(pos) = self.pairs.binary_search(&c) {
            self.pairs.insert(pos, c);
        }
    }

    /// Returns a builder-style copy with the pair added.
    #[must_use]
    pub fn with(mut self, layer: i32, cat: i32) -> Self {
        self.add(layer, cat);
        self
    }

    /// Adds every pair of `other`.
    pub fn merge(&mut self, other: &Categories) {
        for c in &other.pairs {
            self.add(c.layer, c.cat);
        }
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(&self, other: &Categories) -> Categories {
        let mut u = self.clone();
        u.merge(other);
        u
    }

    /// Returns `true` if the pair is present.
    #[must_use]
    pub fn contains(&self, layer: i32, cat: i32) -> bool {
        self.pairs.binary_search(&Category::new(layer, cat)).is_ok()
    }

    /// Returns the first category in `layer`, if any.
    #[must_use]
    pub fn get(&self, layer: i32) -> Option<i32> {
        self.pairs.iter().find(|c| c.layer == layer).map(|c| c.cat)
    }

    /// The sorted pairs.
    #[must_use]
    pub fn as_slice(&self) -> &[Category] {
        &self.pairs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(i32, i32)> for Categories {
    fn from_iter<T: IntoIterator<Item = (i32, i32)>>(iter: T) -> Self {
        let mut cats = Categories::new();
        for (layer, cat) in iter {
            cats.add(layer, cat);
        }
        cats
    }
}

/// The primitive a category index entry points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    Line { kind: LineType, id: LineId },
    /// An area, indexed through the categories of its bound centroid.
    Area(AreaId),
}

/// One entry of a layer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryEntry {
    pub cat: i32,
    pub feature: Feature,
}

/// All entries of one layer, sorted by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerIndex {
    layer: i32,
    entries: Vec<CategoryEntry>,
}

impl LayerIndex {
    #[must_use]
    pub fn layer(&self) -> i32 {
        self.layer
    }

    #[must_use]
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Returns the entries with category `cat` (binary search).
    #[must_use]
    pub fn find(&self, cat: i32) -> &[CategoryEntry] {
        let start = self.entries.partition_point(|e| e.cat < cat);
        let end = self.entries.partition_point(|e| e.cat <= cat);
        &self.entries[start..end]
    }

    /// Number of distinct categories in this layer.
    #[must_use]
    pub fn unique_cats(&self) -> usize {
        let mut n = 0;
        let mut last = None;
        for e in &self.entries {
            if last != Some(e.cat) {
                n += 1;
                last = Some(e.cat);
            }
        }
        n
    }
}

/// Category index: entries grouped by layer, each layer sorted for binary
/// search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIndex {
    layers: Vec<LayerIndex>,
    sorted: bool,
}

impl Default for CategoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            sorted: true,
        }
    }

    /// Adds one entry. The index must be [`sort`](Self::sort)ed before lookups.
    pub fn add(&mut self, layer: i32, cat: i32, feature: Feature) {
        let idx = match self.layers.binary_search_by_key(&layer, |l| l.layer) {
            Ok(i) => i,
            Err(i) => {
                self.layers.insert(
                    i,
                    LayerIndex {
                        layer,
                        entries: Vec::new(),
                    },
                );
                i
            }
        };
        self.layers[idx].entries.push(CategoryEntry { cat, feature });
        self.sorted = false;
    }

    /// Adds one entry per pair of `cats`, or the implicit `(0, 0)` entry for
    /// untagged primitives.
    pub fn add_all(&mut self, cats: &Categories, feature: Feature) {
        if cats.is_empty() {
            self.add(0, 0, feature);
            return;
        }
        for c in cats.as_slice() {
            self.add(c.layer, c.cat, feature);
        }
    }

    /// Sorts every layer.
    pub fn sort(&mut self) {
        for l in &mut self.layers {
            l.entries.sort_unstable();
        }
        self.sorted = true;
    }

    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    #[must_use]
    pub fn layers(&self) -> &[LayerIndex] {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, layer: i32) -> Option<&LayerIndex> {
        self.layers
            .binary_search_by_key(&layer, |l| l.layer)
            .ok()
            .map(|i| &self.layers[i])
    }

    /// Returns the entries for `(layer, cat)`.
    #[must_use]
    pub fn find(&self, layer: i32, cat: i32) -> &[CategoryEntry] {
        self.layer(layer).map_or(&[], |l| l.find(cat))
    }

    /// Total number of entries over all layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.entries.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.sorted = true;
    }
}
