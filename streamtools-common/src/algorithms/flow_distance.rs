use super::d8::{Direction, FlowGrid};
use super::flow_cycles::check_acyclic;
use super::flow_error::FlowError;
use super::flow_targets::{locate_exits, locate_targets, TargetSelection};
use super::work_queue::{QueueStrategy, WorkQueue};
use crate::structures::Array2D;
use std::str::FromStr;

/// No-data value of the distance and difference grids.
pub const NODATA: f64 = -32768.0;

/// Direction in which distances are measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FlowMethod {
    /// Distance from each cell down its flow path to the target it drains to.
    /// Propagates upslope from the targets.
    #[default]
    Downstream,
    /// Distance from the drainage divide down to each cell. Propagates
    /// downslope from source cells and stops at the first target.
    Upstream,
}

impl FromStr for FlowMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<FlowMethod, String> {
        match s.trim().to_lowercase().as_str() {
            "downstream" | "down" => Ok(FlowMethod::Downstream),
            "upstream" | "up" => Ok(FlowMethod::Upstream),
            other => Err(format!(
                "Unrecognized method '{}'; expected upstream or downstream.",
                other
            )),
        }
    }
}

/// Which divide an upstream distance refers to when several paths meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Preference {
    #[default]
    Farthest,
    Nearest,
}

/// How a cell reached by more than one path settles its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relaxation {
    /// The first path to reach a cell fixes it.
    FirstVisitWins,
    /// A later path replaces the recorded one when it is preferred; equal
    /// distances keep the path with the higher baseline elevation.
    RelaxOnImprovement(Preference),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowDistanceParams {
    pub method: FlowMethod,
    pub targets: TargetSelection,
    /// Only used by `FlowMethod::Upstream`.
    pub preference: Preference,
    pub queue: QueueStrategy,
    /// Also compute elevation differences; requires elevations on the grid.
    pub difference: bool,
    /// Reject grids whose pointers form a loop before traversing.
    pub validate_acyclic: bool,
}

impl Default for FlowDistanceParams {
    fn default() -> Self {
        FlowDistanceParams {
            method: FlowMethod::Downstream,
            targets: TargetSelection::Streams,
            preference: Preference::Farthest,
            queue: QueueStrategy::Growable,
            difference: false,
            validate_acyclic: true,
        }
    }
}

impl FlowDistanceParams {
    pub fn relaxation(&self) -> Relaxation {
        match self.method {
            FlowMethod::Downstream => Relaxation::FirstVisitWins,
            FlowMethod::Upstream => Relaxation::RelaxOnImprovement(self.preference),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FlowDistances {
    pub distance: Array2D<f64>,
    pub difference: Option<Array2D<f64>>,
    /// Flat indices of the target cells, in the order they were located.
    pub targets: Vec<usize>,
    /// Upstream method only: non-stream cells where flow leaves the grid or
    /// the data, which end walks like targets.
    pub exits: Vec<usize>,
    pub seeds: usize,
    pub visited: usize,
}

/// Computes along-flow distances (and optionally elevation differences) to
/// the stream targets of `grid`.
pub fn flow_distance(grid: &FlowGrid, params: &FlowDistanceParams) -> Result<FlowDistances, FlowError> {
    if params.difference && !grid.has_elevation() {
        return Err(FlowError::MissingElevation);
    }
    if params.validate_acyclic {
        check_acyclic(grid)?;
    }
    let targets = locate_targets(grid, params.targets);
    let exits = match params.method {
        FlowMethod::Downstream => vec![],
        FlowMethod::Upstream => locate_exits(grid),
    };
    let terminals = terminal_cells(&targets, &exits);
    let mut traversal = Traversal::new(grid, &terminals);
    let seeds = match params.method {
        FlowMethod::Downstream => targets.clone(),
        FlowMethod::Upstream => upstream_sources(grid, &terminals, params.queue)?,
    };
    let edge = match params.method {
        FlowMethod::Downstream => Edge::Upslope,
        FlowMethod::Upstream => Edge::Downslope,
    };
    traversal.run(&seeds, edge, params.relaxation(), params.queue)?;
    Ok(traversal.finish(params.method, params.difference, targets, exits, seeds.len()))
}

/// Cells where walks end: the targets plus the exits, in row-major order.
fn terminal_cells(targets: &[usize], exits: &[usize]) -> Vec<usize> {
    let mut terminals = [targets, exits].concat();
    terminals.sort_unstable();
    terminals
}

/// Source cells of the upstream walks: members of the contributing area of
/// the terminal cells that are not fed by any non-terminal member.
fn upstream_sources(grid: &FlowGrid, terminals: &[usize], queue: QueueStrategy) -> Result<Vec<usize>, FlowError> {
    let mut reach = Traversal::new(grid, terminals);
    reach.run(terminals, Edge::Upslope, Relaxation::FirstVisitWins, queue)?;
    let member = |cell: usize| reach.state[cell] != CellState::Unvisited;
    let mut sources = vec![];
    for cell in 0..grid.num_cells() {
        if !member(cell) {
            continue;
        }
        let fed = grid
            .contributors(cell)
            .any(|(n, _)| member(n) && !reach.is_target[n]);
        if !fed {
            sources.push(cell);
        }
    }
    Ok(sources)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellState {
    Unvisited,
    Queued,
    Visited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    /// From a cell to the neighbours draining into it.
    Upslope,
    /// From a cell to the cell it drains into.
    Downslope,
}

struct Traversal<'a> {
    grid: &'a FlowGrid,
    state: Vec<CellState>,
    distance: Vec<f64>,
    /// Elevation of the target (downstream) or source (upstream) of the
    /// path that settled each cell.
    baseline: Vec<Option<f64>>,
    is_target: Vec<bool>,
}

impl<'a> Traversal<'a> {
    fn new(grid: &'a FlowGrid, targets: &[usize]) -> Traversal<'a> {
        let n = grid.num_cells();
        let mut is_target = vec![false; n];
        for &t in targets {
            is_target[t] = true;
        }
        Traversal {
            grid,
            state: vec![CellState::Unvisited; n],
            distance: vec![0f64; n],
            baseline: vec![None; n],
            is_target,
        }
    }

    fn run(
        &mut self,
        seeds: &[usize],
        edge: Edge,
        relaxation: Relaxation,
        strategy: QueueStrategy,
    ) -> Result<(), FlowError> {
        let grid = self.grid;
        let mut queue = WorkQueue::new(strategy, grid.rows(), grid.columns());
        for &seed in seeds {
            self.state[seed] = CellState::Queued;
            self.distance[seed] = 0.0;
            self.baseline[seed] = grid.elevation(seed);
            queue.push(seed)?;
        }

        let n = grid.num_cells() as u64;
        let limit = match relaxation {
            Relaxation::FirstVisitWins => n,
            Relaxation::RelaxOnImprovement(_) => n.saturating_mul(n),
        };
        let mut iterations = 0u64;
        let mut next_cells: Vec<(usize, Direction)> = Vec::with_capacity(8);
        while let Some(cell) = queue.pop() {
            iterations += 1;
            if iterations > limit {
                return Err(FlowError::IterationLimit { limit });
            }
            self.state[cell] = CellState::Visited;

            next_cells.clear();
            match edge {
                Edge::Upslope => next_cells.extend(grid.contributors(cell)),
                Edge::Downslope => {
                    if self.is_target[cell] {
                        continue;
                    }
                    next_cells.extend(grid.outflow(cell));
                }
            }

            let baseline = self.baseline[cell];
            for &(next, dir) in &next_cells {
                let candidate = self.distance[cell] + grid.step_length(cell, dir);
                let accept = match (self.state[next], relaxation) {
                    (CellState::Unvisited, _) => true,
                    (_, Relaxation::FirstVisitWins) => false,
                    (_, Relaxation::RelaxOnImprovement(preference)) => improves(
                        preference,
                        (candidate, baseline),
                        (self.distance[next], self.baseline[next]),
                    ),
                };
                if !accept {
                    continue;
                }
                self.distance[next] = candidate;
                self.baseline[next] = baseline;
                if self.state[next] != CellState::Queued {
                    self.state[next] = CellState::Queued;
                    queue.push(next)?;
                }
            }
        }
        Ok(())
    }

    fn finish(
        self,
        method: FlowMethod,
        difference: bool,
        targets: Vec<usize>,
        exits: Vec<usize>,
        seeds: usize,
    ) -> FlowDistances {
        let grid = self.grid;
        let mut distance = grid.new_output(NODATA);
        let mut diff = if difference {
            Some(grid.new_output(NODATA))
        } else {
            None
        };
        let mut visited = 0usize;
        for cell in 0..grid.num_cells() {
            if self.state[cell] == CellState::Unvisited {
                continue;
            }
            visited += 1;
            distance.set_by_index(cell, self.distance[cell]);
            if let Some(diff) = diff.as_mut() {
                let value = match (grid.elevation(cell), self.baseline[cell]) {
                    (Some(z), Some(base)) => match method {
                        FlowMethod::Downstream => z - base,
                        FlowMethod::Upstream => base - z,
                    },
                    _ => NODATA,
                };
                diff.set_by_index(cell, value);
            }
        }
        FlowDistances {
            distance,
            difference: diff,
            targets,
            exits,
            seeds,
            visited,
        }
    }
}

fn improves(preference: Preference, candidate: (f64, Option<f64>), current: (f64, Option<f64>)) -> bool {
    let (d_new, b_new) = candidate;
    let (d_old, b_old) = current;
    let higher_baseline = match (b_new, b_old) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        _ => false,
    };
    match preference {
        Preference::Farthest => d_new > d_old || (d_new == d_old && higher_baseline),
        Preference::Nearest => d_new < d_old || (d_new == d_old && higher_baseline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{CellGeometry, Flow, PointerScheme};
    use proptest::prelude::*;

    const ND: f64 = -9999.0;

    /// Builds a grid from GRASS pointer codes (`ND` marks no-data).
    fn grid(rows: isize, columns: isize, codes: &[f64], features: &[i32], res: (f64, f64)) -> FlowGrid {
        let flow: Vec<Flow> = codes
            .iter()
            .map(|&v| PointerScheme::Grass.decode(v, ND).unwrap())
            .collect();
        let flow = Array2D::from_data(rows, columns, flow, Flow::NoData).unwrap();
        let features = Array2D::from_data(rows, columns, features.to_vec(), 0).unwrap();
        FlowGrid::new(flow, features, CellGeometry::projected(res.0, res.1)).unwrap()
    }

    fn star(res: (f64, f64)) -> FlowGrid {
        grid(
            3,
            3,
            &[7.0, 6.0, 5.0, 8.0, 0.0, 4.0, 1.0, 2.0, 3.0],
            &[0, 0, 0, 0, 1, 0, 0, 0, 0],
            res,
        )
    }

    /// Two branches meet at the target in the lower-right corner: a three
    /// step branch along the top row and a one step branch from the left.
    fn confluence() -> FlowGrid {
        let g = grid(
            2,
            3,
            &[8.0, 8.0, 6.0, ND, 8.0, 0.0],
            &[0, 0, 0, 0, 0, 1],
            (10.0, 10.0),
        );
        let z = Array2D::from_data(2, 3, vec![50.0, 40.0, 30.0, ND, 15.0, 10.0], ND).unwrap();
        g.with_elevation(z).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_star_distances() {
        let g = star((10.0, 10.0));
        let out = flow_distance(&g, &FlowDistanceParams::default()).unwrap();
        let d = &out.distance;
        assert_eq!(d.get_value(1, 1), 0.0);
        for (r, c) in [(0, 1), (1, 0), (1, 2), (2, 1)] {
            assert!(approx(d.get_value(r, c), 10.0));
        }
        for (r, c) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert!(approx(d.get_value(r, c), 10.0 * 2f64.sqrt()));
        }
        assert_eq!(out.seeds, 1);
        assert_eq!(out.visited, 9);
    }

    #[test]
    fn test_star_uses_both_resolutions() {
        let g = star((30.0, 40.0));
        let out = flow_distance(&g, &FlowDistanceParams::default()).unwrap();
        let d = &out.distance;
        assert!(approx(d.get_value(0, 1), 40.0));
        assert!(approx(d.get_value(1, 0), 30.0));
        assert!(approx(d.get_value(2, 2), 50.0));
    }

    #[test]
    fn test_downstream_confluence() {
        let g = confluence();
        let params = FlowDistanceParams {
            difference: true,
            ..Default::default()
        };
        let out = flow_distance(&g, &params).unwrap();
        let d = &out.distance;
        assert!(approx(d.get_value(0, 2), 10.0));
        assert!(approx(d.get_value(0, 1), 20.0));
        assert!(approx(d.get_value(0, 0), 30.0));
        assert!(approx(d.get_value(1, 1), 10.0));
        assert_eq!(d.get_value(1, 2), 0.0);
        assert_eq!(d.get_value(1, 0), NODATA);
        let z = out.difference.unwrap();
        assert!(approx(z.get_value(0, 0), 40.0));
        assert!(approx(z.get_value(1, 1), 5.0));
        assert_eq!(z.get_value(1, 2), 0.0);
    }

    #[test]
    fn test_upstream_farthest_and_nearest() {
        let g = confluence();
        let mut params = FlowDistanceParams {
            method: FlowMethod::Upstream,
            difference: true,
            ..Default::default()
        };
        let far = flow_distance(&g, &params).unwrap();
        assert_eq!(far.seeds, 2);
        assert!(approx(far.distance.get_value(1, 2), 30.0));
        assert!(approx(far.distance.get_value(0, 2), 20.0));
        assert_eq!(far.distance.get_value(0, 0), 0.0);
        let far_z = far.difference.as_ref().unwrap();
        assert!(approx(far_z.get_value(1, 2), 40.0));
        assert!(approx(far_z.get_value(0, 2), 20.0));

        params.preference = Preference::Nearest;
        let near = flow_distance(&g, &params).unwrap();
        assert!(approx(near.distance.get_value(1, 2), 10.0));
        assert!(approx(near.difference.as_ref().unwrap().get_value(1, 2), 5.0));
        assert!(approx(near.distance.get_value(0, 2), 20.0));
    }

    #[test]
    fn test_upstream_walks_stop_at_first_target() {
        // a channel of stream cells: with every stream cell a target, the
        // lower cells only see their own hillslope
        let g = grid(1, 4, &[8.0, 8.0, 8.0, 0.0], &[0, 1, 1, 1], (10.0, 10.0));
        let params = FlowDistanceParams {
            method: FlowMethod::Upstream,
            ..Default::default()
        };
        let out = flow_distance(&g, &params).unwrap();
        assert!(approx(out.distance.get_value(0, 1), 10.0));
        assert_eq!(out.distance.get_value(0, 2), 0.0);
        assert_eq!(out.distance.get_value(0, 3), 0.0);

        let params = FlowDistanceParams {
            method: FlowMethod::Upstream,
            targets: TargetSelection::Outlets,
            ..Default::default()
        };
        let out = flow_distance(&g, &params).unwrap();
        assert!(approx(out.distance.get_value(0, 3), 30.0));
    }

    #[test]
    fn test_outlet_targets_measure_along_streams() {
        let g = grid(1, 4, &[8.0, 8.0, 8.0, 0.0], &[0, 1, 1, 1], (10.0, 10.0));
        let streams = flow_distance(&g, &FlowDistanceParams::default()).unwrap();
        assert!(approx(streams.distance.get_value(0, 0), 10.0));
        let params = FlowDistanceParams {
            targets: TargetSelection::Outlets,
            ..Default::default()
        };
        let outlets = flow_distance(&g, &params).unwrap();
        assert!(approx(outlets.distance.get_value(0, 0), 30.0));
        assert_eq!(outlets.targets, vec![3]);
    }

    #[test]
    fn test_nodata_band_blocks_paths() {
        let g = grid(1, 5, &[8.0, 8.0, ND, 8.0, 0.0], &[0, 0, 0, 0, 1], (10.0, 10.0));
        let out = flow_distance(&g, &FlowDistanceParams::default()).unwrap();
        assert_eq!(out.distance.get_value(0, 0), NODATA);
        assert_eq!(out.distance.get_value(0, 1), NODATA);
        assert_eq!(out.distance.get_value(0, 2), NODATA);
        assert_eq!(out.visited, 2);

        // upstream, the band edge ends the walk of the cells above it
        let params = FlowDistanceParams {
            method: FlowMethod::Upstream,
            ..Default::default()
        };
        let out = flow_distance(&g, &params).unwrap();
        assert_eq!(out.exits, vec![1]);
        assert_eq!(out.distance.get_row_data(0), vec![0.0, 10.0, NODATA, 0.0, 10.0]);
        assert_eq!(out.visited, 4);
    }

    #[test]
    fn test_upstream_hillslope_draining_off_the_grid() {
        // every cell flows east; only the lower row ends in a stream
        let g = grid(2, 3, &[8.0; 6], &[0, 0, 0, 0, 0, 1], (10.0, 10.0));
        let params = FlowDistanceParams {
            method: FlowMethod::Upstream,
            ..Default::default()
        };
        let out = flow_distance(&g, &params).unwrap();
        assert_eq!(out.targets, vec![5]);
        assert_eq!(out.exits, vec![2]);
        assert_eq!(out.seeds, 2);
        assert_eq!(out.distance.get_row_data(0), vec![0.0, 10.0, 20.0]);
        assert_eq!(out.distance.get_row_data(1), vec![0.0, 10.0, 20.0]);

        let down = flow_distance(&g, &FlowDistanceParams::default()).unwrap();
        assert!(down.exits.is_empty());
        assert_eq!(down.distance.get_row_data(0), vec![NODATA; 3]);
    }

    #[test]
    fn test_iteration_limit_stops_a_relaxing_loop() {
        // two cells draining into each other keep lengthening the path
        let g = grid(1, 2, &[8.0, 4.0], &[0, 0], (1.0, 1.0));
        let mut traversal = Traversal::new(&g, &[]);
        let err = traversal
            .run(
                &[0],
                Edge::Downslope,
                Relaxation::RelaxOnImprovement(Preference::Farthest),
                QueueStrategy::Growable,
            )
            .unwrap_err();
        assert_eq!(err, FlowError::IterationLimit { limit: 4 });
    }

    #[test]
    fn test_detached_loop() {
        let g = grid(1, 4, &[8.0, 4.0, 8.0, 0.0], &[0, 0, 0, 1], (10.0, 10.0));
        let err = flow_distance(&g, &FlowDistanceParams::default()).unwrap_err();
        assert_eq!(err, FlowError::CyclicFlowDirection { row: 0, col: 0 });

        let params = FlowDistanceParams {
            validate_acyclic: false,
            ..Default::default()
        };
        let out = flow_distance(&g, &params).unwrap();
        assert_eq!(out.distance.get_value(0, 0), NODATA);
        assert_eq!(out.distance.get_value(0, 1), NODATA);
        assert!(approx(out.distance.get_value(0, 2), 10.0));
    }

    #[test]
    fn test_no_targets() {
        let g = grid(1, 3, &[8.0, 8.0, 0.0], &[0, 0, 0], (1.0, 1.0));
        let out = flow_distance(&g, &FlowDistanceParams::default()).unwrap();
        assert!(out.targets.is_empty());
        assert_eq!(out.visited, 0);
        assert_eq!(out.distance.get_value(0, 0), NODATA);
    }

    #[test]
    fn test_bounded_queue_overflow() {
        let g = star((1.0, 1.0));
        let params = FlowDistanceParams {
            queue: QueueStrategy::Bounded(2),
            ..Default::default()
        };
        let err = flow_distance(&g, &params).unwrap_err();
        assert_eq!(err, FlowError::QueueOverflow { capacity: 2 });

        let params = FlowDistanceParams {
            queue: QueueStrategy::ReferenceBound,
            ..Default::default()
        };
        assert!(flow_distance(&g, &params).is_ok());
    }

    #[test]
    fn test_difference_requires_elevation() {
        let g = star((1.0, 1.0));
        let params = FlowDistanceParams {
            difference: true,
            ..Default::default()
        };
        assert_eq!(
            flow_distance(&g, &params).unwrap_err(),
            FlowError::MissingElevation
        );
    }

    #[test]
    fn test_improves_tie_break() {
        let p = Preference::Farthest;
        assert!(improves(p, (2.0, None), (1.0, Some(5.0))));
        assert!(improves(p, (1.0, Some(6.0)), (1.0, Some(5.0))));
        assert!(!improves(p, (1.0, Some(5.0)), (1.0, Some(5.0))));
        assert!(improves(Preference::Nearest, (0.5, None), (1.0, None)));
    }

    /// Steepest-descent pointers over a random surface; never cyclic.
    fn random_grid(rows: isize, columns: isize, z: &[f64], streams: &[bool]) -> FlowGrid {
        let mut flow = vec![];
        for row in 0..rows {
            for col in 0..columns {
                let here = z[(row * columns + col) as usize];
                let mut best: Option<(f64, Direction)> = None;
                for dir in Direction::ALL {
                    let (dr, dc) = dir.offset();
                    let (rn, cn) = (row + dr, col + dc);
                    if rn < 0 || cn < 0 || rn >= rows || cn >= columns {
                        continue;
                    }
                    let zn = z[(rn * columns + cn) as usize];
                    if zn < here && best.map_or(true, |(b, _)| zn < b) {
                        best = Some((zn, dir));
                    }
                }
                flow.push(match best {
                    Some((_, dir)) => Flow::Toward(dir),
                    None => Flow::Sink,
                });
            }
        }
        let flow = Array2D::from_data(rows, columns, flow, Flow::NoData).unwrap();
        let features: Vec<i32> = streams.iter().map(|&s| if s { 1 } else { 0 }).collect();
        let features = Array2D::from_data(rows, columns, features, 0).unwrap();
        let elevation = Array2D::from_data(rows, columns, z.to_vec(), ND).unwrap();
        FlowGrid::new(flow, features, CellGeometry::projected(10.0, 12.5))
            .unwrap()
            .with_elevation(elevation)
            .unwrap()
    }

    fn surfaces() -> impl Strategy<Value = (isize, isize, Vec<f64>, Vec<bool>)> {
        (2isize..8, 2isize..8).prop_flat_map(|(rows, columns)| {
            let n = (rows * columns) as usize;
            (
                Just(rows),
                Just(columns),
                prop::collection::vec(0.0f64..100.0, n),
                prop::collection::vec(prop::bool::weighted(0.25), n),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_downstream_distance_grows_away_from_targets((rows, columns, z, s) in surfaces()) {
            let g = random_grid(rows, columns, &z, &s);
            let out = flow_distance(&g, &FlowDistanceParams::default()).unwrap();
            for cell in 0..g.num_cells() {
                let d = out.distance.get_by_index(cell);
                if d == NODATA {
                    continue;
                }
                if out.targets.contains(&cell) {
                    prop_assert_eq!(d, 0.0);
                } else {
                    let (next, _) = g.outflow(cell).unwrap();
                    prop_assert!(d >= out.distance.get_by_index(next));
                }
            }
        }

        #[test]
        fn prop_upstream_farthest_is_monotone((rows, columns, z, s) in surfaces()) {
            let g = random_grid(rows, columns, &z, &s);
            let params = FlowDistanceParams { method: FlowMethod::Upstream, ..Default::default() };
            let far = flow_distance(&g, &params).unwrap();
            let near = flow_distance(&g, &FlowDistanceParams { preference: Preference::Nearest, ..params.clone() }).unwrap();
            for cell in 0..g.num_cells() {
                let d = far.distance.get_by_index(cell);
                prop_assert_eq!(d == NODATA, near.distance.get_by_index(cell) == NODATA);
                if d == NODATA {
                    continue;
                }
                prop_assert!(d >= near.distance.get_by_index(cell));
                if far.targets.contains(&cell) || far.exits.contains(&cell) {
                    continue;
                }
                let (next, _) = g.outflow(cell).unwrap();
                prop_assert!(far.distance.get_by_index(next) >= d);
            }
        }

        #[test]
        fn prop_seed_order_does_not_matter(
            (rows, columns, z, s) in surfaces(),
            shuffle_seed in any::<u64>(),
        ) {
            let g = random_grid(rows, columns, &z, &s);
            for method in [FlowMethod::Downstream, FlowMethod::Upstream] {
                let params = FlowDistanceParams { method, difference: true, ..Default::default() };
                let expected = flow_distance(&g, &params).unwrap();

                let mut terminals = terminal_cells(&expected.targets, &expected.exits);
                permute(&mut terminals, shuffle_seed);
                let mut seeds = match method {
                    FlowMethod::Downstream => terminals.clone(),
                    FlowMethod::Upstream => upstream_sources(&g, &terminals, params.queue).unwrap(),
                };
                permute(&mut seeds, shuffle_seed.rotate_left(17));
                let edge = if method == FlowMethod::Downstream { Edge::Upslope } else { Edge::Downslope };
                let mut traversal = Traversal::new(&g, &terminals);
                traversal.run(&seeds, edge, params.relaxation(), params.queue).unwrap();
                let actual = traversal.finish(method, true, terminals, vec![], seeds.len());

                prop_assert_eq!(&actual.distance, &expected.distance);
                prop_assert_eq!(&actual.difference, &expected.difference);
            }
        }
    }

    /// Deterministic Fisher-Yates shuffle driven by a 64-bit LCG.
    fn permute(v: &mut [usize], mut state: u64) {
        for i in (1..v.len()).rev() {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            v.swap(i, j);
        }
    }
}
