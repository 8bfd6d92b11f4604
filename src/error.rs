use thiserror::Error;

use crate::topology::BuildLevel;

/// Top-level error type for the vtopo engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors raised by the primitive store and the topology accessors.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The id refers to a dead or unknown record.
    #[error("{kind} not found")]
    NotFound { kind: &'static str },

    /// The requested level has not been reached yet.
    #[error("topology level {required} required, map is built to {current}")]
    NotBuilt {
        required: BuildLevel,
        current: BuildLevel,
    },

    /// A structural invariant is violated (e.g. a missing referenced node).
    #[error("structural error: {0}")]
    Structural(String),
}

/// Errors raised while consuming the primitive stream.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The reader could not produce the next primitive.
    #[error("cannot read primitive {index}: {reason}")]
    Reader { index: u64, reason: String },

    /// The primitive was read but cannot be registered.
    #[error("malformed primitive {index}: {reason}")]
    MalformedPrimitive { index: u64, reason: String },

    /// `build` needs a primitive source but the map has none.
    #[error("no primitive source attached to the map")]
    NoSource,
}

/// Errors raised by the spatial index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("spatial index I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A node record could not be decoded.
    #[error("corrupt spatial index record at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// The operation is not available for this index configuration.
    #[error("unsupported spatial index operation: {0}")]
    Unsupported(&'static str),
}

/// Errors raised by the network graph layer.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node is not part of the graph")]
    UnknownNode,

    #[error("invalid edge cost {0}")]
    InvalidCost(f64),

    /// The map has no network graph built.
    #[error("network graph not built")]
    NotBuilt,
}

/// Convenience type alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
