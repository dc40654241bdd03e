//! Error types for orientation.

use thiserror::Error;

/// Errors that can occur while orienting a mesh.
#[derive(Error, Debug)]
pub enum OrientError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Coordinate buffer does not hold 9 values per triangle.
    #[error("expected {expected} coordinates for the triangle count, got {got}")]
    CoordinateCount {
        /// 9 × the declared triangle count.
        expected: usize,
        /// Length of the supplied buffer.
        got: usize,
    },

    /// A coordinate is NaN or infinite.
    #[error("coordinate {index} is not finite")]
    NonFiniteCoordinate {
        /// Offset into the flat coordinate buffer.
        index: usize,
    },

    /// A direction vector has no length.
    #[error("direction has zero length")]
    ZeroDirection,

    /// Invalid optimizer parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Every candidate direction scored NaN or infinity.
    #[error("none of the {candidates} candidate directions has a finite cost")]
    NoFiniteCost {
        /// Number of candidates scored.
        candidates: usize,
    },

    /// STL content could not be parsed.
    #[error("invalid STL: {0}")]
    InvalidStl(String),

    /// Binary STL is shorter than its triangle count requires.
    #[error("truncated STL: expected {expected} bytes, got {got}")]
    TruncatedStl {
        /// Byte length implied by the header.
        expected: usize,
        /// Actual byte length.
        got: usize,
    },

    /// 3MF archive or model XML could not be used.
    #[error("invalid 3MF: {0}")]
    InvalidThreeMf(String),

    /// File extension names no supported mesh format.
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The search panicked; the mesh was left untouched.
    #[error("orientation search failed: {0}")]
    SearchPanicked(String),

    /// An orientation is already running for this mesh.
    #[error("an orientation is already in progress")]
    Busy,

    /// A previous worker vanished together with the mesh; the slot can no
    /// longer run.
    #[error("the mesh was lost when a previous orientation worker died")]
    MeshLost,

    /// The worker thread went away without reporting.
    #[error("orientation worker disconnected")]
    WorkerDisconnected,
}

/// Result type for orientation operations.
pub type Result<T> = std::result::Result<T, OrientError>;
