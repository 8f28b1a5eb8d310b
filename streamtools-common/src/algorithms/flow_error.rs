use std::io;
use thiserror::Error;

/// Errors raised while loading a flow grid or propagating distances over it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Raster size mismatch: {layer} has {rows}x{columns} cells, expected {expected_rows}x{expected_columns}")]
    SizeMismatch {
        layer: String,
        rows: isize,
        columns: isize,
        expected_rows: isize,
        expected_columns: isize,
    },

    #[error("Raster resolution mismatch: {layer} does not share the cell size of the D8 pointer raster")]
    ResolutionMismatch { layer: String },

    #[error("Invalid D8 pointer value {value} at row {row}, column {col}")]
    InvalidPointer { value: f64, row: isize, col: isize },

    #[error("Flow directions form a cycle through row {row}, column {col}")]
    CyclicFlowDirection { row: isize, col: isize },

    #[error("Work queue overflow: more than {capacity} cells queued")]
    QueueOverflow { capacity: usize },

    #[error("Traversal exceeded {limit} iterations without converging")]
    IterationLimit { limit: u64 },

    #[error("An elevation raster is required to calculate elevation differences")]
    MissingElevation,
}

impl From<FlowError> for io::Error {
    fn from(e: FlowError) -> io::Error {
        let kind = match e {
            FlowError::QueueOverflow { .. } | FlowError::IterationLimit { .. } => io::ErrorKind::Other,
            FlowError::CyclicFlowDirection { .. } | FlowError::InvalidPointer { .. } => {
                io::ErrorKind::InvalidData
            }
            _ => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, e.to_string())
    }
}
