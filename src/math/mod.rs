pub mod angle;
pub mod bbox;
pub mod line;
pub mod polygon_2d;

pub use bbox::BoundBox;

/// 3D point type. Planar topology uses x/y; z is carried along.
pub type Point3 = nalgebra::Point3<f64>;

/// Geometric tolerance for floating-point comparisons of derived values.
///
/// Topology itself never snaps: node matching and duplicate tests are exact.
pub const TOLERANCE: f64 = 1e-10;
