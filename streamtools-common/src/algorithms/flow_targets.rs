use super::d8::{Flow, FlowGrid};
use std::str::FromStr;

/// Which stream cells distances are measured to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TargetSelection {
    /// Every stream cell.
    #[default]
    Streams,
    /// Only the last cell of each network, i.e. where the stream leaves the
    /// network, the grid or the data.
    Outlets,
    /// The last cell of every stream link: where the identifier changes.
    Subbasins,
}

impl FromStr for TargetSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<TargetSelection, String> {
        match s.trim().to_lowercase().as_str() {
            "streams" | "stream" => Ok(TargetSelection::Streams),
            "outlets" | "outlet" => Ok(TargetSelection::Outlets),
            "subbasins" | "subbasin" => Ok(TargetSelection::Subbasins),
            other => Err(format!("Unrecognized target selection '{}'.", other)),
        }
    }
}

/// Scans the grid in row-major order and returns the flat indices of all
/// target cells.
pub fn locate_targets(grid: &FlowGrid, selection: TargetSelection) -> Vec<usize> {
    let mut targets = vec![];
    for cell in 0..grid.num_cells() {
        let id = match grid.feature(cell) {
            Some(id) => id,
            None => continue,
        };
        let downstream = grid.outflow(cell).map(|(next, _)| grid.feature(next));
        let is_target = match selection {
            TargetSelection::Streams => true,
            TargetSelection::Outlets => !matches!(downstream, Some(Some(_))),
            TargetSelection::Subbasins => downstream.flatten() != Some(id),
        };
        if is_target {
            targets.push(cell);
        }
    }
    targets
}

/// Non-stream cells whose flow leaves the grid or enters a no-data cell.
/// Upstream walks end at these cells as they do at targets.
pub fn locate_exits(grid: &FlowGrid) -> Vec<usize> {
    (0..grid.num_cells())
        .filter(|&cell| {
            grid.feature(cell).is_none()
                && matches!(grid.flow(cell), Flow::Toward(_))
                && grid.outflow(cell).is_none()
        })
        .collect()
}
