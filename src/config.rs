use std::path::PathBuf;

/// Box dimensionality used by the spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexDims {
    /// Overlap tests ignore Z.
    #[default]
    Two,
    /// Overlap tests honour Z. Deletion is not available.
    Three,
}

/// Where spatial index nodes live.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IndexBacking {
    #[default]
    Memory,
    /// One flat record file per tree, created inside `dir`.
    File { dir: PathBuf },
}

/// Spatial index parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialIndexConfig {
    pub dims: IndexDims,
    pub backing: IndexBacking,
    /// Nodes kept in the buffer cache per tree level (file backing only).
    pub cache_per_level: usize,
}

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        Self {
            dims: IndexDims::Two,
            backing: IndexBacking::Memory,
            cache_per_level: 32,
        }
    }
}

impl SpatialIndexConfig {
    #[must_use]
    pub fn with_dims(mut self, dims: IndexDims) -> Self {
        self.dims = dims;
        self
    }

    #[must_use]
    pub fn with_file_backing(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backing = IndexBacking::File { dir: dir.into() };
        self
    }

    /// Sets the per-level cache capacity. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_cache_per_level(mut self, n: usize) -> Self {
        self.cache_per_level = n.max(1);
        self
    }
}

/// Parameters of an open map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapConfig {
    pub index: SpatialIndexConfig,
}

impl MapConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_index(mut self, index: SpatialIndexConfig) -> Self {
        self.index = index;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = MapConfig::new();
        assert_eq!(c.index.dims, IndexDims::Two);
        assert_eq!(c.index.backing, IndexBacking::Memory);
        assert_eq!(c.index.cache_per_level, 32);
    }

    #[test]
    fn cache_capacity_floor() {
        let c = SpatialIndexConfig::default().with_cache_per_level(0);
        assert_eq!(c.cache_per_level, 1);
    }
}
