use std::io::Error;
use streamtools_common::algorithms::{
    CellGeometry, Flow, FlowDistances, FlowError, FlowGrid, PointerScheme, NODATA,
};
use streamtools_common::structures::Array2D;
use streamtools_raster::*;

/// Builds the drainage graph from the pointer, streams and (optional)
/// elevation rasters. All rasters must share the pointer raster's shape and
/// cell size.
pub fn load_flow_grid(
    pntr: &Raster,
    streams: &Raster,
    dem: Option<&Raster>,
    scheme: PointerScheme,
) -> Result<FlowGrid, Error> {
    check_layer("streams", pntr, streams)?;
    if let Some(dem) = dem {
        check_layer("dem", pntr, dem)?;
    }

    let rows = pntr.configs.rows as isize;
    let columns = pntr.configs.columns as isize;

    let mut flow: Array2D<Flow> = Array2D::new(rows, columns, Flow::NoData, Flow::NoData)?;
    let nodata = pntr.configs.nodata;
    for row in 0..rows {
        let mut decoded = Vec::with_capacity(columns as usize);
        for (col, value) in pntr.get_row_data(row).into_iter().enumerate() {
            let cell = scheme.decode(value, nodata).ok_or(FlowError::InvalidPointer {
                value,
                row,
                col: col as isize,
            })?;
            decoded.push(cell);
        }
        flow.set_row_data(row, decoded);
    }

    let mut features: Array2D<i32> = Array2D::new(rows, columns, 0, 0)?;
    let nodata = streams.configs.nodata;
    for row in 0..rows {
        let ids = streams
            .get_row_data(row)
            .into_iter()
            .map(|z| if z == nodata || z.is_nan() || z <= 0.0 { 0 } else { z.round() as i32 })
            .collect();
        features.set_row_data(row, ids);
    }

    let configs = &pntr.configs;
    let geometry = if pntr.is_in_geographic_coordinates() {
        CellGeometry::geographic(configs.west, configs.north, configs.resolution_x, configs.resolution_y)
    } else {
        CellGeometry::projected(configs.resolution_x, configs.resolution_y)
    };

    let grid = FlowGrid::new(flow, features, geometry)?;
    match dem {
        Some(dem) => {
            let nodata = dem.configs.nodata;
            let mut elevation: Array2D<f64> = Array2D::new(rows, columns, nodata, nodata)?;
            for row in 0..rows {
                elevation.set_row_data(row, dem.get_row_data(row));
            }
            Ok(grid.with_elevation(elevation)?)
        }
        None => Ok(grid),
    }
}

fn check_layer(layer: &str, pntr: &Raster, other: &Raster) -> Result<(), FlowError> {
    if other.configs.rows != pntr.configs.rows || other.configs.columns != pntr.configs.columns {
        return Err(FlowError::SizeMismatch {
            layer: layer.to_string(),
            rows: other.configs.rows as isize,
            columns: other.configs.columns as isize,
            expected_rows: pntr.configs.rows as isize,
            expected_columns: pntr.configs.columns as isize,
        });
    }
    let same = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0);
    if !same(other.configs.resolution_x, pntr.configs.resolution_x)
        || !same(other.configs.resolution_y, pntr.configs.resolution_y)
    {
        return Err(FlowError::ResolutionMismatch {
            layer: layer.to_string(),
        });
    }
    Ok(())
}

/// Post-processing applied to the engine's grids before they are written.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OutputOptions {
    /// Write no-data on the target cells themselves.
    pub exclude_targets: bool,
    /// Clamp negative elevation differences to zero.
    pub floor_zero: bool,
    /// Write zero rather than no-data for unreached cells with a defined pointer.
    pub zero_background: bool,
}

pub fn apply_output_options(grid: &FlowGrid, result: &mut FlowDistances, options: OutputOptions) {
    if options.exclude_targets {
        for &cell in &result.targets {
            result.distance.set_by_index(cell, NODATA);
            if let Some(difference) = result.difference.as_mut() {
                difference.set_by_index(cell, NODATA);
            }
        }
    }
    if options.floor_zero {
        if let Some(difference) = result.difference.as_mut() {
            for cell in 0..difference.num_cells() {
                let z = difference.get_by_index(cell);
                if z != NODATA && z < 0.0 {
                    difference.set_by_index(cell, 0.0);
                }
            }
        }
    }
    if options.zero_background {
        let is_target = |cell: usize| options.exclude_targets && result.targets.binary_search(&cell).is_ok();
        let mut background = vec![];
        for cell in 0..grid.num_cells() {
            if grid.flow(cell) != Flow::NoData && result.distance.get_by_index(cell) == NODATA && !is_target(cell) {
                background.push(cell);
            }
        }
        for cell in background {
            result.distance.set_by_index(cell, 0.0);
            if let Some(difference) = result.difference.as_mut() {
                if difference.get_by_index(cell) == NODATA {
                    difference.set_by_index(cell, 0.0);
                }
            }
        }
    }
}

/// Copies a result grid, row by row, into a new raster shaped like `base`.
pub fn to_raster(file_name: &str, base: &Raster, values: &Array2D<f64>, verbose: bool) -> Raster {
    let mut output = Raster::initialize_using_file(file_name, base);
    output.configs.nodata = NODATA;
    output.configs.data_type = DataType::F32;
    output.configs.photometric_interp = PhotometricInterpretation::Continuous;
    output.configs.palette = "spectrum.plt".to_string();
    let rows = values.rows;
    let mut old_progress = usize::MAX;
    for row in 0..rows {
        output.set_row_data(row, values.get_row_data(row));
        if verbose {
            let progress = (100.0_f64 * (row + 1) as f64 / rows as f64) as usize;
            if progress != old_progress {
                println!("Progress: {}%", progress);
                old_progress = progress;
            }
        }
    }
    output
}
