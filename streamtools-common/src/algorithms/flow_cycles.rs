use super::d8::FlowGrid;
use super::flow_error::FlowError;

const UNSEEN: u8 = 0;
const ON_PATH: u8 = 1;
const DONE: u8 = 2;

/// Verifies that following outflow pointers from any cell ends at a terminal
/// cell. Each cell is walked over at most once.
pub fn check_acyclic(grid: &FlowGrid) -> Result<(), FlowError> {
    let mut state = vec![UNSEEN; grid.num_cells()];
    let mut path: Vec<usize> = Vec::new();
    for start in 0..grid.num_cells() {
        if state[start] != UNSEEN {
            continue;
        }
        let mut cell = start;
        loop {
            match state[cell] {
                DONE => break,
                ON_PATH => {
                    let (row, col) = grid.position(cell);
                    return Err(FlowError::CyclicFlowDirection { row, col });
                }
                _ => {}
            }
            state[cell] = ON_PATH;
            path.push(cell);
            match grid.outflow(cell) {
                Some((next, _)) => cell = next,
                None => break,
            }
        }
        for visited in path.drain(..) {
            state[visited] = DONE;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{CellGeometry, Direction, Flow};
    use crate::structures::Array2D;

    fn grid(rows: isize, columns: isize, flow: Vec<Flow>) -> FlowGrid {
        let flow = Array2D::from_data(rows, columns, flow, Flow::NoData).unwrap();
        let features = Array2D::new(rows, columns, 0, 0).unwrap();
        FlowGrid::new(flow, features, CellGeometry::projected(1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_two_cell_loop() {
        use Flow::*;
        let g = grid(
            1,
            3,
            vec![Toward(Direction::West), Toward(Direction::East), Toward(Direction::West)],
        );
        let err = check_acyclic(&g).unwrap_err();
        assert!(matches!(err, FlowError::CyclicFlowDirection { row: 0, .. }));
    }

    #[test]
    fn test_converging_paths_are_not_cycles() {
        use Flow::*;
        let g = grid(
            2,
            2,
            vec![
                Toward(Direction::SouthEast),
                Toward(Direction::South),
                Toward(Direction::East),
                Sink,
            ],
        );
        assert!(check_acyclic(&g).is_ok());
    }

    #[test]
    fn test_four_cell_ring() {
        use Flow::*;
        let g = grid(
            2,
            2,
            vec![
                Toward(Direction::East),
                Toward(Direction::South),
                Toward(Direction::North),
                Toward(Direction::West),
            ],
        );
        assert!(check_acyclic(&g).is_err());
    }
}
