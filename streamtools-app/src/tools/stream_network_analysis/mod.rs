// private sub-module defined in other files
mod flow_grid_io;
mod stream_distance;

// exports identifiers from private sub-modules in the current module namespace
pub use self::stream_distance::StreamDistance;
