use super::*;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter, Error, ErrorKind};

pub fn read_arcascii(file_name: &str, configs: &mut RasterConfigs, data: &mut Vec<f64>) -> Result<(), Error> {
    let f = File::open(file_name)?;
    let reader = BufReader::new(f);

    let mut x_ll = f64::NAN;
    let mut y_ll = f64::NAN;
    let mut x_centre = false;
    let mut y_centre = false;
    configs.nodata = -9999.0;
    data.clear();

    for line in reader.lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let key = tokens[0].to_lowercase();
        if tokens.len() == 2 && key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            let value = parse_value(tokens[1], file_name)?;
            match key.as_str() {
                "ncols" => configs.columns = value as usize,
                "nrows" => configs.rows = value as usize,
                "xllcorner" => x_ll = value,
                "yllcorner" => y_ll = value,
                "xllcenter" => {
                    x_ll = value;
                    x_centre = true;
                }
                "yllcenter" => {
                    y_ll = value;
                    y_centre = true;
                }
                "cellsize" => {
                    configs.resolution_x = value;
                    configs.resolution_y = value;
                }
                "dx" => configs.resolution_x = value,
                "dy" => configs.resolution_y = value,
                "nodata_value" => configs.nodata = value,
                _ => {}
            }
            continue;
        }
        for token in tokens {
            data.push(parse_value(token, file_name)?);
        }
    }

    if configs.rows == 0 || configs.columns == 0 || x_ll.is_nan() || y_ll.is_nan() || configs.resolution_x <= 0.0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!("Incomplete ArcAscii header in {}", file_name),
        ));
    }
    if configs.rows.checked_mul(configs.columns) != Some(data.len()) {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "{} holds {} values but its header declares {} rows and {} columns.",
                file_name,
                data.len(),
                configs.rows,
                configs.columns
            ),
        ));
    }

    configs.west = if x_centre { x_ll - configs.resolution_x / 2.0 } else { x_ll };
    configs.south = if y_centre { y_ll - configs.resolution_y / 2.0 } else { y_ll };
    configs.east = configs.west + configs.columns as f64 * configs.resolution_x;
    configs.north = configs.south + configs.rows as f64 * configs.resolution_y;
    configs.data_type = if data.iter().all(|v| v.fract() == 0.0) {
        DataType::I32
    } else {
        DataType::F32
    };
    configs.photometric_interp = PhotometricInterpretation::Continuous;
    Ok(())
}

fn parse_value(token: &str, file_name: &str) -> Result<f64, Error> {
    token.parse::<f64>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Unreadable value '{}' in {}", token, file_name),
        )
    })
}

pub fn write_arcascii(r: &Raster) -> Result<(), Error> {
    let f = File::create(&r.file_name)?;
    let mut writer = BufWriter::new(f);
    let configs = &r.configs;

    writeln!(writer, "NCOLS {}", configs.columns)?;
    writeln!(writer, "NROWS {}", configs.rows)?;
    writeln!(writer, "XLLCORNER {}", configs.west)?;
    writeln!(writer, "YLLCORNER {}", configs.south)?;
    if configs.resolution_x == configs.resolution_y {
        writeln!(writer, "CELLSIZE {}", configs.resolution_x)?;
    } else {
        writeln!(writer, "DX {}", configs.resolution_x)?;
        writeln!(writer, "DY {}", configs.resolution_y)?;
    }
    writeln!(writer, "NODATA_VALUE {}", configs.nodata)?;

    let integer = !configs.data_type.is_float();
    let mut line = String::new();
    for row in 0..configs.rows as isize {
        line.clear();
        for (col, value) in r.get_row_data(row).into_iter().enumerate() {
            if col > 0 {
                line.push(' ');
            }
            if integer && value.fract() == 0.0 {
                line.push_str(&format!("{}", value as i64));
            } else {
                line.push_str(&format!("{}", value));
            }
        }
        writeln!(writer, "{}", line)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_centre_registered_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.asc");
        std::fs::write(
            &path,
            "ncols 2\nnrows 2\nxllcenter 5\nyllcenter 5\ncellsize 10\n1 2\n3 -9999\n",
        )
        .unwrap();
        let r = Raster::new(path.to_str().unwrap(), "r").unwrap();
        assert_eq!(r.configs.west, 0.0);
        assert_eq!(r.configs.north, 20.0);
        assert_eq!(r.configs.nodata, -9999.0);
        assert_eq!(r.configs.data_type, DataType::I32);
        assert_eq!(r.get_value(1, 1), -9999.0);
    }

    #[test]
    fn test_short_data_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.asc");
        std::fs::write(
            &path,
            "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n",
        )
        .unwrap();
        let err = Raster::new(path.to_str().unwrap(), "r").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_oversized_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.asc");
        std::fs::write(
            &path,
            "ncols 18446744073709551615\nnrows 4\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3 4\n",
        )
        .unwrap();
        let err = Raster::new(path.to_str().unwrap(), "r").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
