//! Operations that mutate an open map while keeping its topology consistent.

pub mod clean;

pub use clean::{CleanSmallAngles, RemoveDuplicates};
