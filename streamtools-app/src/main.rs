/*
stream_tools measures along-flow distances and elevation differences between
the cells of a D8 drainage grid and the streams they drain to.
*/

pub mod tools;

use crate::tools::ToolManager;
use std::env;
use std::io::Error;
use std::path;
use std::process;
use streamtools_common::configs::get_configs;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let sep: &str = &path::MAIN_SEPARATOR.to_string();
    let configs = get_configs()?;
    let mut working_dir = configs.working_directory.clone();
    let mut verbose = configs.verbose_mode;

    let mut tool_name = String::new();
    let mut run_tool = false;
    let mut tool_help = false;
    let mut tool_parameters = false;
    let mut toolbox = false;
    let mut list_tools = false;
    let mut tool_args_vec: Vec<String> = vec![];
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        help();
        return Ok(());
    }
    for arg in &args {
        let flag_val = arg.to_lowercase().replace("--", "-");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val.starts_with("-cd") || flag_val.starts_with("-wd") {
            let mut v = arg
                .replace("--cd", "")
                .replace("--wd", "")
                .replace("-cd", "")
                .replace("-wd", "")
                .replace("\"", "")
                .replace("\'", "");
            if v.starts_with("=") {
                v = v[1..v.len()].to_string();
            }
            if v.trim().is_empty() {
                working_dir = String::new();
            } else {
                if !v.ends_with(sep) && !v.ends_with("/") {
                    v.push_str(sep);
                }
                working_dir = v.to_string();
            }
        } else if flag_val.starts_with("-run") || flag_val.starts_with("-r=") {
            let mut v = arg
                .replace("--run", "")
                .replace("-run", "")
                .replace("-r", "")
                .replace("\"", "")
                .replace("\'", "");
            if v.starts_with("=") {
                v = v[1..v.len()].to_string();
            }
            tool_name = v;
            run_tool = true;
        } else if flag_val.starts_with("-toolhelp") {
            let mut v = arg
                .replace("--toolhelp", "")
                .replace("-toolhelp", "")
                .replace("\"", "")
                .replace("\'", "");
            if v.starts_with("=") {
                v = v[1..v.len()].to_string();
            }
            tool_name = v;
            tool_help = true;
        } else if flag_val.starts_with("-toolparameters") {
            let mut v = arg
                .replace("--toolparameters", "")
                .replace("-toolparameters", "")
                .replace("\"", "")
                .replace("\'", "");
            if v.starts_with("=") {
                v = v[1..v.len()].to_string();
            }
            tool_name = v;
            tool_parameters = true;
        } else if flag_val.starts_with("-toolbox") {
            let mut v = arg
                .replace("--toolbox", "")
                .replace("-toolbox", "")
                .replace("\"", "")
                .replace("\'", "");
            if v.starts_with("=") {
                v = v[1..v.len()].to_string();
            }
            tool_name = v;
            toolbox = true;
        } else if flag_val == "-listtools" || flag_val == "-list_tools" {
            list_tools = true;
        } else if flag_val == "-version" {
            version();
            return Ok(());
        } else if flag_val == "-v" {
            verbose = true;
        } else if flag_val == "-v=false" {
            verbose = false;
        } else if !arg.trim().is_empty() {
            // an argument to be fed to the tool
            tool_args_vec.push(arg.trim().to_string());
        }
    }
    if !working_dir.is_empty() && !working_dir.ends_with(sep) && !working_dir.ends_with("/") {
        working_dir.push_str(sep);
    }

    let tm = ToolManager::new(&working_dir, &verbose)?;
    if run_tool {
        tm.run_tool(tool_name, tool_args_vec)
    } else if tool_help {
        tm.tool_help(tool_name)
    } else if tool_parameters {
        tm.tool_parameters(tool_name)
    } else if toolbox {
        tm.toolbox(tool_name)
    } else if list_tools {
        tm.list_tools()
    } else {
        help();
        Ok(())
    }
}

fn help() {
    let mut ext = "";
    if cfg!(target_os = "windows") {
        ext = ".exe";
    }

    let exe_name = &format!("stream_tools{}", ext);
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let s = r#"
stream_tools Help

The following commands are recognized:
--cd, --wd          Changes the working directory; used in conjunction with --run flag.
-h, --help          Prints help information.
--listtools         Lists all available tools.
-r, --run           Runs a tool; used in conjunction with --wd flag; -r="StreamDistance".
--toolbox           Prints the toolbox associated with a tool; --toolbox=StreamDistance.
--toolhelp          Prints the help associated with a tool; --toolhelp="StreamDistance".
--toolparameters    Prints the parameters (in json form) for a specific tool; e.g. --toolparameters="StreamDistance".
-v                  Verbose mode. Without this flag, tool outputs will not be printed.
--version           Prints the version information.

Example Usage:
>> .*EXE_NAME -r=StreamDistance -v --wd="*path*to*data*" --d8_pntr=D8.asc --streams=streams.asc --distance=dist.asc

"#
    .replace("*", &sep)
    .replace("EXE_NAME", exe_name);
    println!("{}", s);
}

fn version() {
    println!("stream_tools v{}", VERSION);
}
