// D8 flow-path distance calculations
mod d8;
mod flow_cycles;
mod flow_distance;
mod flow_error;
mod flow_targets;
mod work_queue;

pub use self::d8::{CellGeometry, Direction, Flow, FlowGrid, PointerScheme};
pub use self::flow_cycles::check_acyclic;
pub use self::flow_distance::{
    flow_distance, FlowDistanceParams, FlowDistances, FlowMethod, Preference, Relaxation, NODATA,
};
pub use self::flow_error::FlowError;
pub use self::flow_targets::{locate_exits, locate_targets, TargetSelection};
pub use self::work_queue::{QueueStrategy, WorkQueue};
