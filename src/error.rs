use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the UGX reader.
#[derive(Debug, Error)]
pub enum UgxError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Info(#[from] InfoError),
}

/// Errors raised while reading or parsing the raw document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed markup: {0}")]
    Markup(#[from] roxmltree::Error),
}

/// Errors that make a grid's geometry unusable.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("invalid vertex index {index} in <{node}>, grid has {num_vertices} vertices")]
    InvalidVertexIndex {
        node: String,
        index: i64,
        num_vertices: usize,
    },

    #[error("<{node}> needs a positive 'coords' attribute")]
    InvalidCoordinateCount { node: String },

    #[error("position dimension must be in 1..=3, got {0}")]
    InvalidPositionDim(usize),

    #[error("grid index {index} is out of range, document holds {num_grids} grids")]
    BadGridIndex { index: usize, num_grids: usize },

    #[error("grid {0} has not been loaded")]
    GridNotLoaded(usize),

    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),
}

/// Errors related to typed per-element attachments.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachment entry has no '{0}' attribute")]
    MissingAttribute(&'static str),

    #[error("attachment '{name}' is declared as '{declared}', but the file gives '{given}'")]
    TypeMismatch {
        name: String,
        declared: String,
        given: String,
    },

    #[error("attachment '{0}' was never declared")]
    Undeclared(String),

    #[error("attachment value type '{0}' is not registered")]
    UnregisteredType(String),
}

/// Errors raised while filling subset handlers and selectors.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("{container} index {index} is out of range, grid holds {available}")]
    BadIndex {
        container: &'static str,
        index: usize,
        available: usize,
    },

    #[error("bad element index {index} in <{node}>, grid holds {available} such elements")]
    BadElementIndex {
        node: String,
        index: i64,
        available: usize,
    },
}

/// Errors related to refinement projectors.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("unknown projector type '{0}'")]
    UnknownType(String),

    #[error("projector '{type_name}' expects {expected} values, got {found}")]
    BadParameters {
        type_name: String,
        expected: usize,
        found: usize,
    },
}

/// Errors raised by the file-info inspector.
#[derive(Debug, Error)]
pub enum InfoError {
    #[error("{what} index {index} is out of range, {available} available")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        available: usize,
    },
}

/// Convenience type alias for results using [`UgxError`].
pub type Result<T> = std::result::Result<T, UgxError>;
