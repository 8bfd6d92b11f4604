pub mod build;
pub mod config;
pub mod error;
pub mod map;
pub mod math;
pub mod network;
pub mod operations;
pub mod spatial;
pub mod stream;
pub mod topology;

pub use build::{BuildPass, BuildStats};
pub use config::{IndexBacking, IndexDims, MapConfig, SpatialIndexConfig};
pub use error::{Error, Result};
pub use map::Map;
pub use stream::{Primitive, PrimitiveReader, VecReader};
