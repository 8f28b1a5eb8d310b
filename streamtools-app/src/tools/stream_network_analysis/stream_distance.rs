/*
This tool measures, for every cell of a D8 drainage grid, the distance along
its flow path to a stream (downstream method) or from the drainage divide
(upstream method), optionally with the elevation difference over that path.
*/

use super::flow_grid_io::{apply_output_options, load_flow_grid, to_raster, OutputOptions};
use crate::tools::*;
use chrono::prelude::*;
use std::env;
use std::io::{Error, ErrorKind};
use std::path;
use streamtools_common::algorithms::{
    flow_distance, FlowDistanceParams, FlowMethod, PointerScheme, Preference, QueueStrategy,
    TargetSelection,
};
use streamtools_raster::*;

/// Calculates flow-path distances and elevation differences between each
/// cell and the stream network it drains to (`--method=downstream`), or
/// between the drainage divide and each cell (`--method=upstream`).
///
/// Targets are every stream cell by default. `--outlets` restricts them to
/// the cells where a network leaves the streams raster, and `--subbasins` to
/// the last cell of every stream link. In upstream mode the distance of a
/// cell reached from several divides is the longest one unless `--nearest`
/// is given.
pub struct StreamDistance {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl StreamDistance {
    pub fn new() -> StreamDistance {
        let name = "StreamDistance".to_string();
        let toolbox = "Stream Network Analysis".to_string();
        let description =
            "Calculates the along-flow distance and elevation difference between grid cells and streams."
                .to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input D8 Pointer File".to_owned(),
            flags: vec!["--d8_pntr".to_owned()],
            description: "Input raster D8 pointer file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });
        parameters.push(ToolParameter {
            name: "Input Streams File".to_owned(),
            flags: vec!["--streams".to_owned()],
            description: "Input raster streams file; cells > 0 are streams, their value is the link identifier."
                .to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });
        parameters.push(ToolParameter {
            name: "Input DEM File".to_owned(),
            flags: vec!["--dem".to_owned()],
            description: "Input raster DEM file; required for the difference output.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Method".to_owned(),
            flags: vec!["--method".to_owned()],
            description: "Direction of measurement: 'downstream' (to the stream) or 'upstream' (from the divide)."
                .to_owned(),
            parameter_type: ParameterType::OptionList(vec![
                "downstream".to_owned(),
                "upstream".to_owned(),
            ]),
            default_value: Some("downstream".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Output Distance File".to_owned(),
            flags: vec!["--distance".to_owned()],
            description: "Output raster of along-flow distances.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Raster),
            default_value: None,
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Output Elevation Difference File".to_owned(),
            flags: vec!["--difference".to_owned()],
            description: "Output raster of elevation differences along the flow path.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Raster),
            default_value: None,
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "D8 Pointer Scheme".to_owned(),
            flags: vec!["--pntr_scheme".to_owned()],
            description: "Encoding of the pointer raster: 'grass', 'whitebox' or 'esri'.".to_owned(),
            parameter_type: ParameterType::OptionList(vec![
                "grass".to_owned(),
                "whitebox".to_owned(),
                "esri".to_owned(),
            ]),
            default_value: Some("grass".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Measure to outlets only?".to_owned(),
            flags: vec!["--outlets".to_owned()],
            description: "Use only the outlet cell of each stream network as target.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Measure to sub-basin outlets?".to_owned(),
            flags: vec!["--subbasins".to_owned()],
            description: "Use the last cell of every stream link as target.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Nearest divide?".to_owned(),
            flags: vec!["--nearest".to_owned()],
            description: "Upstream method: measure from the nearest rather than the farthest divide.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Exclude targets?".to_owned(),
            flags: vec!["--exclude_targets".to_owned()],
            description: "Write NoData on the target cells themselves.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Floor differences at zero?".to_owned(),
            flags: vec!["--floor_zero".to_owned()],
            description: "Replace negative elevation differences with zero.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Should a background value of zero be used?".to_owned(),
            flags: vec!["--zero_background".to_owned()],
            description: "Flag indicating whether a background value of zero should be used.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Queue Capacity".to_owned(),
            flags: vec!["--queue_capacity".to_owned()],
            description: "Fixed capacity of the work queue: a cell count, 'auto' for 4 x (rows + columns), or 'growable'."
                .to_owned(),
            parameter_type: ParameterType::String,
            default_value: Some("growable".to_owned()),
            optional: true,
        });
        parameters.push(ToolParameter {
            name: "Skip the flow-cycle check?".to_owned(),
            flags: vec!["--skip_cycle_check".to_owned()],
            description: "Do not reject pointer rasters containing loops; cells on a loop stay NoData.".to_owned(),
            parameter_type: ParameterType::Boolean,
            default_value: Some("false".to_owned()),
            optional: true,
        });

        let sep: String = path::MAIN_SEPARATOR.to_string();
        let exe = env::current_exe().unwrap_or_default();
        let e = format!("{}", exe.display());
        let mut parent = exe.clone();
        parent.pop();
        let p = format!("{}", parent.display());
        let mut short_exe = e
            .replace(&p, "")
            .replace(".exe", "")
            .replace(".", "")
            .replace(&sep, "");
        if e.contains(".exe") {
            short_exe += ".exe";
        }
        let usage = format!(
            ">>.*{} -r={} -v --wd=\"*path*to*data*\" --d8_pntr=D8.asc --streams=streams.asc --dem=dem.asc --distance=dist.asc --difference=diff.asc
>>.*{} -r={} -v --wd=\"*path*to*data*\" --d8_pntr=D8.dep --streams=streams.dep --pntr_scheme=whitebox --method=upstream --nearest --distance=dist.dep --zero_background",
            short_exe, name, short_exe, name
        )
        .replace("*", &sep);

        StreamDistance {
            name,
            description,
            toolbox,
            parameters,
            example_usage: usage,
        }
    }
}

/// The value of a `--flag=value` or `--flag value` argument.
fn flag_value(args: &[String], i: usize, vec: &[&str]) -> Result<String, Error> {
    if vec.len() > 1 {
        return Ok(vec[1].to_string());
    }
    match args.get(i + 1) {
        Some(v) => Ok(v.replace("\"", "").replace("\'", "")),
        None => Err(Error::new(
            ErrorKind::InvalidInput,
            format!("No value was given for {}.", vec[0]),
        )),
    }
}

fn flag_is_set(vec: &[&str]) -> bool {
    vec.len() == 1 || !vec[1].to_lowercase().contains("false")
}

fn invalid_input(message: String) -> Error {
    Error::new(ErrorKind::InvalidInput, message)
}

impl StreamTool for StreamDistance {
    fn get_source_file(&self) -> String {
        String::from(file!())
    }

    fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    fn get_tool_parameters(&self) -> String {
        let mut s = String::from("{\"parameters\": [");
        for i in 0..self.parameters.len() {
            if i < self.parameters.len() - 1 {
                s.push_str(&(self.parameters[i].to_string()));
                s.push_str(",");
            } else {
                s.push_str(&(self.parameters[i].to_string()));
            }
        }
        s.push_str("]}");
        s
    }

    fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    fn get_toolbox(&self) -> String {
        self.toolbox.clone()
    }

    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error> {
        let mut d8_file = String::new();
        let mut streams_file = String::new();
        let mut dem_file = String::new();
        let mut distance_file = String::new();
        let mut difference_file = String::new();
        let mut method = FlowMethod::Downstream;
        let mut scheme = PointerScheme::Grass;
        let mut outlets = false;
        let mut subbasins = false;
        let mut nearest = false;
        let mut options = OutputOptions::default();
        let mut queue = QueueStrategy::Growable;
        let mut skip_cycle_check = false;

        if args.len() == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }
        for i in 0..args.len() {
            let arg = args[i].replace("\"", "").replace("\'", "");
            let cmd = arg.splitn(2, "=");
            let vec = cmd.collect::<Vec<&str>>();
            let flag = vec[0].to_lowercase();
            let flag = flag.trim_start_matches('-');
            match flag {
                "d8_pntr" => d8_file = flag_value(&args, i, &vec)?,
                "streams" => streams_file = flag_value(&args, i, &vec)?,
                "dem" => dem_file = flag_value(&args, i, &vec)?,
                "distance" => distance_file = flag_value(&args, i, &vec)?,
                "difference" => difference_file = flag_value(&args, i, &vec)?,
                "method" => method = flag_value(&args, i, &vec)?.parse().map_err(invalid_input)?,
                "pntr_scheme" => scheme = flag_value(&args, i, &vec)?.parse().map_err(invalid_input)?,
                "queue_capacity" => queue = flag_value(&args, i, &vec)?.parse().map_err(invalid_input)?,
                "outlets" => outlets = flag_is_set(&vec),
                "subbasins" => subbasins = flag_is_set(&vec),
                "nearest" => nearest = flag_is_set(&vec),
                "exclude_targets" => options.exclude_targets = flag_is_set(&vec),
                "floor_zero" => options.floor_zero = flag_is_set(&vec),
                "zero_background" => options.zero_background = flag_is_set(&vec),
                "skip_cycle_check" => skip_cycle_check = flag_is_set(&vec),
                _ => {}
            }
        }

        if d8_file.is_empty() || streams_file.is_empty() {
            return Err(invalid_input(
                "Both a D8 pointer file (--d8_pntr) and a streams file (--streams) are required.".to_string(),
            ));
        }
        if distance_file.is_empty() && difference_file.is_empty() {
            return Err(invalid_input(
                "At least one output (--distance or --difference) must be specified.".to_string(),
            ));
        }
        if !difference_file.is_empty() && dem_file.is_empty() {
            return Err(invalid_input(
                "An input DEM (--dem) is required to calculate elevation differences.".to_string(),
            ));
        }
        if outlets && subbasins {
            return Err(invalid_input(
                "The --outlets and --subbasins flags cannot be used together.".to_string(),
            ));
        }
        for output in [&distance_file, &difference_file] {
            if !output.is_empty() && RasterType::from_file_name(output) == RasterType::Unknown {
                return Err(invalid_input(format!(
                    "Unsupported output raster format: {}",
                    output
                )));
            }
        }
        let targets = if outlets {
            TargetSelection::Outlets
        } else if subbasins {
            TargetSelection::Subbasins
        } else {
            TargetSelection::Streams
        };

        if verbose {
            let tool_name = self.get_tool_name();
            let welcome_len = format!("* Welcome to {} *", tool_name).len().max(28);
            println!("{}", "*".repeat(welcome_len));
            println!(
                "* Welcome to {} {}*",
                tool_name,
                " ".repeat(welcome_len - 15 - tool_name.len())
            );
            println!(
                "* Powered by stream_tools {}*",
                " ".repeat(welcome_len - 28)
            );
            println!("{}", "*".repeat(welcome_len));
        }
        if nearest && method == FlowMethod::Downstream && verbose {
            println!("The --nearest flag only applies to the upstream method and is ignored.");
        }

        let sep: String = path::MAIN_SEPARATOR.to_string();
        for file in [
            &mut d8_file,
            &mut streams_file,
            &mut dem_file,
            &mut distance_file,
            &mut difference_file,
        ] {
            if !file.is_empty() && !file.contains(&sep) && !file.contains("/") {
                *file = format!("{}{}", working_directory, file);
            }
        }

        if verbose {
            println!("Reading pointer data...");
        }
        let pntr = Raster::new(&d8_file, "r")?;
        if verbose {
            println!("Reading streams data...");
        }
        let streams = Raster::new(&streams_file, "r")?;
        let dem = if dem_file.is_empty() {
            None
        } else {
            if verbose {
                println!("Reading DEM data...");
            }
            Some(Raster::new(&dem_file, "r")?)
        };

        let start = Instant::now();

        let grid = load_flow_grid(&pntr, &streams, dem.as_ref(), scheme)?;
        let params = FlowDistanceParams {
            method,
            targets,
            preference: if nearest {
                Preference::Nearest
            } else {
                Preference::Farthest
            },
            queue,
            difference: !difference_file.is_empty(),
            validate_acyclic: !skip_cycle_check,
        };
        if verbose {
            println!("Tracing flow paths...");
        }
        let mut result = flow_distance(&grid, &params)?;
        if result.targets.is_empty() {
            println!("Warning: No target cells were found in the streams raster.");
        }
        if verbose {
            println!(
                "{} targets, {} seed cells, {} cells reached",
                result.targets.len(),
                result.seeds,
                result.visited
            );
        }
        apply_output_options(&grid, &mut result, options);

        let elapsed_time = get_formatted_elapsed_time(start);
        let method_name = match method {
            FlowMethod::Downstream => "downstream",
            FlowMethod::Upstream if nearest => "upstream (nearest divide)",
            FlowMethod::Upstream => "upstream (farthest divide)",
        };

        let mut layers = vec![];
        if !distance_file.is_empty() {
            layers.push((distance_file.as_str(), &result.distance, "map units"));
        }
        if let Some(difference) = result.difference.as_ref() {
            layers.push((difference_file.as_str(), difference, "elevation units"));
        }
        let mut outputs = Vec::with_capacity(layers.len());
        for (file_name, values, z_units) in layers {
            let mut output = to_raster(file_name, &pntr, values, verbose);
            output.configs.z_units = z_units.to_string();
            output.add_metadata_entry(format!(
                "Created by stream_tools\' {} tool",
                self.get_tool_name()
            ));
            output.add_metadata_entry(format!("Input d8 pointer file: {}", d8_file));
            output.add_metadata_entry(format!("Input streams file: {}", streams_file));
            if !dem_file.is_empty() {
                output.add_metadata_entry(format!("Input DEM file: {}", dem_file));
            }
            output.add_metadata_entry(format!("Method: {}", method_name));
            output.add_metadata_entry(format!("Created on: {}", Local::now().format("%Y-%m-%d %H:%M:%S")));
            output.add_metadata_entry(format!("Elapsed Time (excluding I/O): {}", elapsed_time));
            outputs.push(output);
        }

        if verbose && !outputs.is_empty() {
            println!("Saving data...");
        }
        // all outputs are written or none are left behind
        for i in 0..outputs.len() {
            match outputs[i].write() {
                Ok(()) => {
                    if verbose {
                        println!("Output file written: {}", outputs[i].file_name);
                    }
                }
                Err(e) => {
                    if verbose {
                        println!("Error writing output file: {:?}", e);
                    }
                    for written in &outputs[..=i] {
                        if let Err(cleanup) = written.delete() {
                            println!("Warning: could not remove {}: {}", written.file_name, cleanup);
                        }
                    }
                    return Err(e);
                }
            }
        }
        if verbose {
            println!("Elapsed Time (excluding I/O): {}", elapsed_time);
        }

        Ok(())
    }
}
