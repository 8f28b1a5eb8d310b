use super::*;
use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use std::fs::{self, File};
use std::io::prelude::*;
use std::io::{BufReader, BufWriter, Error, ErrorKind};
use std::path::Path;

/// Whitebox GAT rasters are a text header (`.dep`) next to a binary data file (`.tas`).
pub(crate) fn header_and_data_files(file_name: &str) -> (String, String) {
    let path = Path::new(file_name);
    (
        path.with_extension("dep").to_string_lossy().to_string(),
        path.with_extension("tas").to_string_lossy().to_string(),
    )
}

pub fn read_whitebox(file_name: &str, configs: &mut RasterConfigs, data: &mut Vec<f64>) -> Result<(), Error> {
    let (header_file, data_file) = header_and_data_files(file_name);
    let f = File::open(&header_file)?;
    let reader = BufReader::new(f);

    for line in reader.lines() {
        let line = line?;
        let (key, value) = match line.split_once(':') {
            Some((k, v)) => (k.trim().to_lowercase(), v.trim().to_string()),
            None => continue,
        };
        match key.as_str() {
            "north" => configs.north = parse_number(&value, &header_file)?,
            "south" => configs.south = parse_number(&value, &header_file)?,
            "east" => configs.east = parse_number(&value, &header_file)?,
            "west" => configs.west = parse_number(&value, &header_file)?,
            "cols" => configs.columns = parse_number(&value, &header_file)? as usize,
            "rows" => configs.rows = parse_number(&value, &header_file)? as usize,
            "nodata" => configs.nodata = parse_number(&value, &header_file)?,
            "data type" => {
                configs.data_type = match value.to_lowercase().as_str() {
                    "double" => DataType::F64,
                    "float" => DataType::F32,
                    "integer" => DataType::I16,
                    "byte" => DataType::U8,
                    _ => DataType::Unknown,
                }
            }
            "data scale" => {
                configs.photometric_interp = match value.to_lowercase().as_str() {
                    "continuous" => PhotometricInterpretation::Continuous,
                    "categorical" => PhotometricInterpretation::Categorical,
                    "boolean" => PhotometricInterpretation::Boolean,
                    _ => PhotometricInterpretation::Unknown,
                }
            }
            "byte order" => {
                configs.endian = if value.to_lowercase().contains("big") {
                    Endianness::BigEndian
                } else {
                    Endianness::LittleEndian
                }
            }
            "z units" => configs.z_units = value,
            "xy units" => configs.xy_units = value,
            "projection" => configs.projection = value,
            "preferred palette" => configs.palette = value,
            "metadata entry" => configs.metadata.push(value),
            _ => {}
        }
    }

    if configs.rows == 0 || configs.columns == 0 || configs.data_type == DataType::Unknown {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("Incomplete Whitebox raster header in {}", header_file),
        ));
    }
    configs.resolution_x = (configs.east - configs.west) / configs.columns as f64;
    configs.resolution_y = (configs.north - configs.south) / configs.rows as f64;

    let n = configs.rows.checked_mul(configs.columns).ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidData,
            format!(
                "{} declares {} rows and {} columns, more cells than can be addressed.",
                header_file, configs.rows, configs.columns
            ),
        )
    })?;
    let bytes = fs::read(&data_file)?;
    *data = match configs.endian {
        Endianness::LittleEndian => decode_values::<LittleEndian>(&bytes, configs.data_type, n),
        Endianness::BigEndian => decode_values::<BigEndian>(&bytes, configs.data_type, n),
    }
    .ok_or_else(|| {
        Error::new(
            ErrorKind::UnexpectedEof,
            format!("{} is too short for {} cells.", data_file, n),
        )
    })?;
    Ok(())
}

fn parse_number(value: &str, file_name: &str) -> Result<f64, Error> {
    value.parse::<f64>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Unreadable header value '{}' in {}", value, file_name),
        )
    })
}

fn decode_values<B: ByteOrder>(bytes: &[u8], data_type: DataType, n: usize) -> Option<Vec<f64>> {
    let width = match data_type {
        DataType::F64 => 8,
        DataType::F32 | DataType::I32 => 4,
        DataType::I16 => 2,
        DataType::U8 => 1,
        DataType::Unknown => return None,
    };
    if bytes.len() < n * width {
        return None;
    }
    let values = bytes
        .chunks_exact(width)
        .take(n)
        .map(|b| match data_type {
            DataType::F64 => B::read_f64(b),
            DataType::F32 => B::read_f32(b) as f64,
            DataType::I32 => B::read_i32(b) as f64,
            DataType::I16 => B::read_i16(b) as f64,
            _ => b[0] as f64,
        })
        .collect();
    Some(values)
}

pub fn write_whitebox(r: &Raster) -> Result<(), Error> {
    let (header_file, data_file) = header_and_data_files(&r.file_name);
    let configs = &r.configs;

    // no 32-bit integer type in this format
    let data_type = match configs.data_type {
        DataType::I32 | DataType::Unknown => DataType::F32,
        dt => dt,
    };
    let data_type_str = match data_type {
        DataType::F64 => "DOUBLE",
        DataType::I16 => "INTEGER",
        DataType::U8 => "BYTE",
        _ => "FLOAT",
    };
    let data_scale = match configs.photometric_interp {
        PhotometricInterpretation::Categorical => "categorical",
        PhotometricInterpretation::Boolean => "Boolean",
        _ => "continuous",
    };

    let f = File::create(&header_file)?;
    let mut writer = BufWriter::new(f);
    writeln!(writer, "Min:\t{}", configs.minimum)?;
    writeln!(writer, "Max:\t{}", configs.maximum)?;
    writeln!(writer, "North:\t{}", configs.north)?;
    writeln!(writer, "South:\t{}", configs.south)?;
    writeln!(writer, "East:\t{}", configs.east)?;
    writeln!(writer, "West:\t{}", configs.west)?;
    writeln!(writer, "Cols:\t{}", configs.columns)?;
    writeln!(writer, "Rows:\t{}", configs.rows)?;
    writeln!(writer, "Stacks:\t1")?;
    writeln!(writer, "Data Type:\t{}", data_type_str)?;
    writeln!(writer, "Z Units:\t{}", configs.z_units)?;
    writeln!(writer, "XY Units:\t{}", configs.xy_units)?;
    writeln!(writer, "Projection:\t{}", configs.projection)?;
    writeln!(writer, "Data Scale:\t{}", data_scale)?;
    writeln!(writer, "Display Min:\t{}", configs.display_min)?;
    writeln!(writer, "Display Max:\t{}", configs.display_max)?;
    writeln!(writer, "Preferred Palette:\t{}", configs.palette)?;
    writeln!(writer, "NoData:\t{}", configs.nodata)?;
    writeln!(writer, "Byte Order:\tLITTLE_ENDIAN")?;
    writeln!(writer, "Palette Nonlinearity:\t1.0")?;
    for entry in &configs.metadata {
        writeln!(writer, "Metadata Entry:\t{}", entry.replace(':', ";"))?;
    }
    writer.flush()?;

    let f = File::create(&data_file)?;
    let mut writer = BufWriter::new(f);
    for row in 0..configs.rows as isize {
        for value in r.get_row_data(row) {
            match data_type {
                DataType::F64 => writer.write_f64::<LittleEndian>(value)?,
                DataType::I16 => writer.write_i16::<LittleEndian>(value as i16)?,
                DataType::U8 => writer.write_u8(value as u8)?,
                _ => writer.write_f32::<LittleEndian>(value as f32)?,
            }
        }
    }
    writer.flush()
}
