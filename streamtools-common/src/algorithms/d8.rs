use super::flow_error::FlowError;
use crate::structures::Array2D;
use std::str::FromStr;

const EARTH_RADIUS: f64 = 6_371_008.8;

/// The eight D8 flow directions, in the counter-clockwise order of the
/// GRASS pointer codes (1 = north-east ... 8 = east).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    NorthEast,
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
    East,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::NorthEast,
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
        Direction::East,
    ];

    /// Row and column offsets of the neighbour lying in this direction.
    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::NorthEast => (-1, 1),
            Direction::North => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::West => (0, -1),
            Direction::SouthWest => (1, -1),
            Direction::South => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::East => (0, 1),
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        Direction::ALL[(self.index() + 4) % 8]
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_diagonal(self) -> bool {
        let (dr, dc) = self.offset();
        dr != 0 && dc != 0
    }
}

/// The decoded content of one cell of a D8 pointer raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    NoData,
    /// Defined cell without an outflow (pit or flat).
    Sink,
    Toward(Direction),
}

/// Encoding used by a D8 pointer raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerScheme {
    /// 1 = NE, 2 = N, ... 8 = E. Negative values mark flow leaving the region
    /// and are read as their absolute value.
    Grass,
    /// 1 = NE, 2 = E, 4 = SE, ... 128 = N.
    Whitebox,
    /// 1 = E, 2 = SE, 4 = S, ... 128 = NE.
    Esri,
}

impl PointerScheme {
    /// Decodes one raster value. Returns `None` when the value is not a code
    /// of this scheme.
    pub fn decode(self, value: f64, nodata: f64) -> Option<Flow> {
        if value == nodata || value.is_nan() {
            return Some(Flow::NoData);
        }
        if value.fract() != 0.0 {
            return None;
        }
        if value == 0.0 {
            return Some(Flow::Sink);
        }
        match self {
            PointerScheme::Grass => {
                let code = value.abs() as usize;
                if (1..=8).contains(&code) {
                    Some(Flow::Toward(Direction::ALL[code - 1]))
                } else {
                    None
                }
            }
            PointerScheme::Whitebox | PointerScheme::Esri => {
                if value < 0.0 || value > 128.0 {
                    return None;
                }
                let code = value as u32;
                if !code.is_power_of_two() {
                    return None;
                }
                let bit = code.trailing_zeros() as usize;
                Some(Flow::Toward(self.bit_order()[bit]))
            }
        }
    }

    /// The pointer value this scheme uses for `dir`.
    pub fn encode(self, dir: Direction) -> f64 {
        match self {
            PointerScheme::Grass => (dir.index() + 1) as f64,
            PointerScheme::Whitebox | PointerScheme::Esri => {
                let bit = self
                    .bit_order()
                    .iter()
                    .position(|d| *d == dir)
                    .unwrap_or_default();
                (1u32 << bit) as f64
            }
        }
    }

    fn bit_order(self) -> [Direction; 8] {
        use Direction::*;
        match self {
            PointerScheme::Esri => [East, SouthEast, South, SouthWest, West, NorthWest, North, NorthEast],
            _ => [NorthEast, East, SouthEast, South, SouthWest, West, NorthWest, North],
        }
    }
}

impl FromStr for PointerScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<PointerScheme, String> {
        match s.trim().to_lowercase().as_str() {
            "grass" | "r.watershed" => Ok(PointerScheme::Grass),
            "whitebox" | "wbt" => Ok(PointerScheme::Whitebox),
            "esri" | "arcgis" => Ok(PointerScheme::Esri),
            other => Err(format!(
                "Unrecognized pointer scheme '{}'; expected grass, whitebox or esri.",
                other
            )),
        }
    }
}

/// Ground length of a single step between adjacent cell centres.
#[derive(Clone, Debug, PartialEq)]
pub enum CellGeometry {
    /// Planar grid; lengths are indexed by `Direction::index`.
    Projected { lengths: [f64; 8] },
    /// Geographic grid in degrees; steps are measured on the sphere.
    Geographic {
        west: f64,
        north: f64,
        resolution_x: f64,
        resolution_y: f64,
    },
}

impl CellGeometry {
    pub fn projected(resolution_x: f64, resolution_y: f64) -> CellGeometry {
        let diag = (resolution_x * resolution_x + resolution_y * resolution_y).sqrt();
        let mut lengths = [0f64; 8];
        for dir in Direction::ALL {
            lengths[dir.index()] = if dir.is_diagonal() {
                diag
            } else if dir.offset().0 != 0 {
                resolution_y
            } else {
                resolution_x
            };
        }
        CellGeometry::Projected { lengths }
    }

    pub fn geographic(west: f64, north: f64, resolution_x: f64, resolution_y: f64) -> CellGeometry {
        CellGeometry::Geographic {
            west,
            north,
            resolution_x,
            resolution_y,
        }
    }

    pub fn step_length(&self, row: isize, col: isize, dir: Direction) -> f64 {
        match self {
            CellGeometry::Projected { lengths } => lengths[dir.index()],
            CellGeometry::Geographic {
                west,
                north,
                resolution_x,
                resolution_y,
            } => {
                let (dr, dc) = dir.offset();
                let centre = |r: isize, c: isize| {
                    (
                        west + (c as f64 + 0.5) * resolution_x,
                        north - (r as f64 + 0.5) * resolution_y,
                    )
                };
                let (lon1, lat1) = centre(row, col);
                let (lon2, lat2) = centre(row + dr, col + dc);
                haversine(lon1, lat1, lon2, lat2)
            }
        }
    }
}

fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * a.sqrt().asin()
}

/// The in-memory drainage graph. Edges are implied by the pointer of each cell;
/// cells are addressed by their flat index `row * columns + col`.
#[derive(Clone, Debug)]
pub struct FlowGrid {
    flow: Array2D<Flow>,
    features: Array2D<i32>,
    elevation: Option<Array2D<f64>>,
    geometry: CellGeometry,
}

impl FlowGrid {
    /// `features` holds the stream/outlet identifiers; values <= 0 are background.
    pub fn new(flow: Array2D<Flow>, features: Array2D<i32>, geometry: CellGeometry) -> Result<FlowGrid, FlowError> {
        check_size("streams", &flow, features.rows, features.columns)?;
        Ok(FlowGrid {
            flow,
            features,
            elevation: None,
            geometry,
        })
    }

    /// Attaches elevations; the array's `nodata` value marks missing cells.
    pub fn with_elevation(mut self, elevation: Array2D<f64>) -> Result<FlowGrid, FlowError> {
        check_size("elevation", &self.flow, elevation.rows, elevation.columns)?;
        self.elevation = Some(elevation);
        Ok(self)
    }

    pub fn rows(&self) -> isize {
        self.flow.rows
    }

    pub fn columns(&self) -> isize {
        self.flow.columns
    }

    pub fn num_cells(&self) -> usize {
        self.flow.num_cells()
    }

    /// A grid of the same shape filled with `nodata`.
    pub fn new_output(&self, nodata: f64) -> Array2D<f64> {
        self.flow.new_like(nodata, nodata)
    }

    pub fn has_elevation(&self) -> bool {
        self.elevation.is_some()
    }

    #[inline]
    pub fn position(&self, index: usize) -> (isize, isize) {
        let columns = self.flow.columns as usize;
        ((index / columns) as isize, (index % columns) as isize)
    }

    #[inline]
    fn neighbour(&self, index: usize, dir: Direction) -> Option<usize> {
        let (row, col) = self.position(index);
        let (dr, dc) = dir.offset();
        let (rn, cn) = (row + dr, col + dc);
        if self.flow.is_in_bounds(rn, cn) {
            Some((rn * self.flow.columns + cn) as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn flow(&self, index: usize) -> Flow {
        self.flow.get_by_index(index)
    }

    /// The cell this one drains into. Flow leaving the grid, or entering a
    /// no-data cell, has no downstream cell.
    pub fn outflow(&self, index: usize) -> Option<(usize, Direction)> {
        match self.flow(index) {
            Flow::Toward(dir) => {
                let next = self.neighbour(index, dir)?;
                if self.flow(next) == Flow::NoData {
                    None
                } else {
                    Some((next, dir))
                }
            }
            _ => None,
        }
    }

    /// Neighbours draining into `index`, each paired with the direction from
    /// `index` towards it.
    pub fn contributors(&self, index: usize) -> impl Iterator<Item = (usize, Direction)> + '_ {
        let defined = self.flow(index) != Flow::NoData;
        Direction::ALL.into_iter().filter_map(move |dir| {
            if !defined {
                return None;
            }
            let n = self.neighbour(index, dir)?;
            if self.flow(n) == Flow::Toward(dir.opposite()) {
                Some((n, dir))
            } else {
                None
            }
        })
    }

    /// The feature identifier of a stream/outlet cell, if this is one.
    #[inline]
    pub fn feature(&self, index: usize) -> Option<i32> {
        let id = self.features.get_by_index(index);
        if id > 0 && self.flow(index) != Flow::NoData {
            Some(id)
        } else {
            None
        }
    }

    #[inline]
    pub fn elevation(&self, index: usize) -> Option<f64> {
        let elevation = self.elevation.as_ref()?;
        let z = elevation.get_by_index(index);
        if z == elevation.nodata || z.is_nan() {
            None
        } else {
            Some(z)
        }
    }

    #[inline]
    pub fn step_length(&self, index: usize, dir: Direction) -> f64 {
        let (row, col) = self.position(index);
        self.geometry.step_length(row, col, dir)
    }
}

fn check_size(layer: &str, flow: &Array2D<Flow>, rows: isize, columns: isize) -> Result<(), FlowError> {
    if rows != flow.rows || columns != flow.columns {
        return Err(FlowError::SizeMismatch {
            layer: layer.to_string(),
            rows,
            columns,
            expected_rows: flow.rows,
            expected_columns: flow.columns,
        });
    }
    Ok(())
}
