/*
This library is part of the StreamTools stream network analysis project.
*/

mod arcascii_raster;
mod whitebox_raster;

use std::f64;
use std::fs;
use std::io::{Error, ErrorKind};
use std::ops::Index;
use std::path::Path;

/// Geographic (latitude/longitude) coordinate systems commonly found in raster headers.
const GEOGRAPHIC_EPSG_CODES: [u16; 15] = [
    4326, 4269, 4267, 4258, 4283, 4230, 4617, 4674, 4612, 4148, 4152, 4167, 4171, 4322, 4324,
];

/// Supported raster file formats, identified by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterType {
    Unknown,
    ArcAscii,
    Whitebox,
}

impl RasterType {
    pub fn from_file_name(file_name: &str) -> RasterType {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "asc" | "txt" => RasterType::ArcAscii,
            "dep" | "tas" => RasterType::Whitebox,
            _ => RasterType::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    F64,
    F32,
    I32,
    I16,
    U8,
    Unknown,
}

impl DataType {
    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F64 | DataType::F32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhotometricInterpretation {
    Continuous,
    Categorical,
    Boolean,
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    LittleEndian,
    BigEndian,
}

#[derive(Clone, Debug)]
pub struct RasterConfigs {
    pub rows: usize,
    pub columns: usize,
    pub nodata: f64,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub display_min: f64,
    pub display_max: f64,
    pub palette: String,
    pub projection: String,
    pub endian: Endianness,
    pub photometric_interp: PhotometricInterpretation,
    pub data_type: DataType,
    pub z_units: String,
    pub xy_units: String,
    pub epsg_code: u16,
    pub metadata: Vec<String>,
}

impl Default for RasterConfigs {
    fn default() -> RasterConfigs {
        RasterConfigs {
            rows: 0,
            columns: 0,
            nodata: -32768.0,
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
            resolution_x: f64::NEG_INFINITY,
            resolution_y: f64::NEG_INFINITY,
            minimum: f64::INFINITY,
            maximum: f64::NEG_INFINITY,
            display_min: f64::INFINITY,
            display_max: f64::NEG_INFINITY,
            palette: "not specified".to_string(),
            projection: "not specified".to_string(),
            endian: Endianness::LittleEndian,
            photometric_interp: PhotometricInterpretation::Unknown,
            data_type: DataType::Unknown,
            z_units: "not specified".to_string(),
            xy_units: "not specified".to_string(),
            epsg_code: 0,
            metadata: vec![],
        }
    }
}

/// An in-memory raster layer. Values are held as `f64` whatever the data type
/// of the file; reads outside of the grid return the nodata value.
#[derive(Clone, Debug)]
pub struct Raster {
    pub file_name: String,
    pub file_mode: String,
    pub raster_type: RasterType,
    pub configs: RasterConfigs,
    data: Vec<f64>,
}

impl Raster {
    /// Opens `file_name` for reading (`"r"`) or creates an empty raster to be
    /// filled and written (`"w"`).
    pub fn new<'a>(file_name: &'a str, file_mode: &'a str) -> Result<Raster, Error> {
        let raster_type = RasterType::from_file_name(file_name);
        let mut r = Raster {
            file_name: file_name.to_string(),
            file_mode: file_mode.to_lowercase(),
            raster_type,
            configs: RasterConfigs::default(),
            data: vec![],
        };
        if !r.file_mode.contains('r') {
            return Ok(r);
        }
        match raster_type {
            RasterType::ArcAscii => arcascii_raster::read_arcascii(&r.file_name, &mut r.configs, &mut r.data)?,
            RasterType::Whitebox => whitebox_raster::read_whitebox(&r.file_name, &mut r.configs, &mut r.data)?,
            RasterType::Unknown => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unrecognized raster type: {}", file_name),
                ))
            }
        }
        r.update_min_max();
        Ok(r)
    }

    /// Creates a new raster sharing the extent, resolution and nodata value of
    /// `file`, with every cell set to nodata.
    pub fn initialize_using_file<'a>(file_name: &'a str, file: &'a Raster) -> Raster {
        let mut configs = RasterConfigs {
            rows: file.configs.rows,
            columns: file.configs.columns,
            nodata: file.configs.nodata,
            north: file.configs.north,
            south: file.configs.south,
            east: file.configs.east,
            west: file.configs.west,
            resolution_x: file.configs.resolution_x,
            resolution_y: file.configs.resolution_y,
            projection: file.configs.projection.clone(),
            xy_units: file.configs.xy_units.clone(),
            z_units: file.configs.z_units.clone(),
            epsg_code: file.configs.epsg_code,
            data_type: file.configs.data_type,
            photometric_interp: file.configs.photometric_interp,
            ..Default::default()
        };
        if configs.data_type == DataType::Unknown {
            configs.data_type = DataType::F32;
        }
        Raster::initialize_using_config(file_name, &configs)
    }

    pub fn initialize_using_config<'a>(file_name: &'a str, configs: &'a RasterConfigs) -> Raster {
        let data = vec![configs.nodata; configs.rows * configs.columns];
        Raster {
            file_name: file_name.to_string(),
            file_mode: "w".to_string(),
            raster_type: RasterType::from_file_name(file_name),
            configs: configs.clone(),
            data,
        }
    }

    pub fn num_cells(&self) -> usize {
        self.configs.rows * self.configs.columns
    }

    #[inline]
    fn is_in_bounds(&self, row: isize, column: isize) -> bool {
        row >= 0 && column >= 0 && (row as usize) < self.configs.rows && (column as usize) < self.configs.columns
    }

    #[inline]
    pub fn get_value(&self, row: isize, column: isize) -> f64 {
        if self.is_in_bounds(row, column) {
            self.data[row as usize * self.configs.columns + column as usize]
        } else {
            self.configs.nodata
        }
    }

    #[inline]
    pub fn set_value(&mut self, row: isize, column: isize, value: f64) {
        if self.is_in_bounds(row, column) {
            self.data[row as usize * self.configs.columns + column as usize] = value;
        }
    }

    pub fn get_row_data(&self, row: isize) -> Vec<f64> {
        (0..self.configs.columns as isize)
            .map(|col| self.get_value(row, col))
            .collect()
    }

    pub fn set_row_data(&mut self, row: isize, values: Vec<f64>) {
        for (col, value) in values.into_iter().enumerate() {
            self.set_value(row, col as isize, value);
        }
    }

    pub fn is_in_geographic_coordinates(&self) -> bool {
        let projection = self.configs.projection.to_lowercase();
        if projection.contains("projcs") {
            return false;
        }
        if projection.contains("geogcs") || self.configs.xy_units.to_lowercase().contains("deg") {
            return true;
        }
        GEOGRAPHIC_EPSG_CODES.contains(&self.configs.epsg_code)
    }

    pub fn add_metadata_entry(&mut self, value: String) {
        self.configs.metadata.push(value);
    }

    pub fn update_min_max(&mut self) {
        self.configs.minimum = f64::INFINITY;
        self.configs.maximum = f64::NEG_INFINITY;
        let nodata = self.configs.nodata;
        for &v in self.data.iter().filter(|&&v| v != nodata && !v.is_nan()) {
            if v < self.configs.minimum {
                self.configs.minimum = v;
            }
            if v > self.configs.maximum {
                self.configs.maximum = v;
            }
        }
        self.configs.display_min = self.configs.minimum;
        self.configs.display_max = self.configs.maximum;
    }

    /// Removes the file(s) backing this raster. Files that do not exist are skipped.
    pub fn delete(&self) -> Result<(), Error> {
        let files = match self.raster_type {
            RasterType::Whitebox => {
                let (header_file, data_file) = whitebox_raster::header_and_data_files(&self.file_name);
                vec![header_file, data_file]
            }
            _ => vec![self.file_name.clone()],
        };
        for file in files {
            match fs::remove_file(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn write(&mut self) -> Result<(), Error> {
        if !self.file_mode.contains('w') {
            return Err(Error::new(
                ErrorKind::PermissionDenied,
                format!("Raster {} was not opened in write mode.", self.file_name),
            ));
        }
        self.update_min_max();
        match self.raster_type {
            RasterType::ArcAscii => arcascii_raster::write_arcascii(self),
            RasterType::Whitebox => whitebox_raster::write_whitebox(self),
            RasterType::Unknown => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Unrecognized raster type: {}", self.file_name),
            )),
        }
    }
}

impl Index<(isize, isize)> for Raster {
    type Output = f64;

    fn index(&self, index: (isize, isize)) -> &f64 {
        let (row, column) = index;
        if self.is_in_bounds(row, column) {
            &self.data[row as usize * self.configs.columns + column as usize]
        } else {
            &self.configs.nodata
        }
    }
}
