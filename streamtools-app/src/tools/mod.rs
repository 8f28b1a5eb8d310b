pub mod stream_network_analysis;

use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::io::{Error, ErrorKind};

pub use std::time::Instant;
pub use streamtools_common::utils::get_formatted_elapsed_time;

#[derive(Default)]
pub struct ToolManager {
    pub working_dir: String,
    pub verbose: bool,
    tool_names: Vec<String>,
}

impl ToolManager {
    pub fn new<'a>(working_directory: &'a str, verbose_mode: &'a bool) -> Result<ToolManager, Error> {
        let mut tool_names = vec![];
        tool_names.push("StreamDistance".to_string());
        tool_names.sort();

        let tm = ToolManager {
            working_dir: working_directory.to_string(),
            verbose: *verbose_mode,
            tool_names,
        };
        Ok(tm)
    }

    fn get_tool(&self, tool_name: &str) -> Option<Box<dyn StreamTool + 'static>> {
        match tool_name.to_lowercase().replace('_', "").as_ref() {
            "streamdistance" | "r.stream.distance" => {
                Some(Box::new(stream_network_analysis::StreamDistance::new()))
            }
            _ => None,
        }
    }

    fn unknown_tool(tool_name: &str) -> Error {
        Error::new(
            ErrorKind::NotFound,
            format!("Unrecognized tool name {}.", tool_name),
        )
    }

    pub fn run_tool(&self, tool_name: String, args: Vec<String>) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => tool.run(args, &self.working_dir, self.verbose),
            None => Err(Self::unknown_tool(&tool_name)),
        }
    }

    pub fn tool_help(&self, tool_name: String) -> Result<(), Error> {
        if tool_name.is_empty() {
            return self.list_tools();
        }
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => println!("{}", get_help(tool)),
            None => return Err(Self::unknown_tool(&tool_name)),
        }
        Ok(())
    }

    pub fn tool_parameters(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => println!("{}", tool.get_tool_parameters()),
            None => return Err(Self::unknown_tool(&tool_name)),
        }
        Ok(())
    }

    pub fn toolbox(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => println!("{}", tool.get_toolbox()),
            None => return Err(Self::unknown_tool(&tool_name)),
        }
        Ok(())
    }

    pub fn list_tools(&self) -> Result<(), Error> {
        let mut tool_details: Vec<(String, String)> = Vec::new();
        for name in &self.tool_names {
            if let Some(tool) = self.get_tool(name) {
                tool_details.push(get_name_and_description(tool));
            }
        }
        println!("All {} Available Tools:", tool_details.len());
        for (name, description) in tool_details {
            println!("{}: {}", name, description);
        }
        Ok(())
    }
}

pub trait StreamTool {
    fn get_source_file(&self) -> String;
    fn get_tool_name(&self) -> String;
    fn get_tool_description(&self) -> String;
    fn get_tool_parameters(&self) -> String;
    fn get_example_usage(&self) -> String;
    fn get_toolbox(&self) -> String;
    fn run<'a>(&self, args: Vec<String>, working_directory: &'a str, verbose: bool) -> Result<(), Error>;
}

fn get_help<'a>(st: Box<dyn StreamTool + 'a>) -> String {
    let tool_name = st.get_tool_name();
    let description = st.get_tool_description();
    let parameters = st.get_tool_parameters();
    let toolbox = st.get_toolbox();
    let o: serde_json::Value = match serde_json::from_str(&parameters) {
        Ok(v) => v,
        Err(e) => return format!("Error reading parameters of {}: {}", tool_name, e),
    };
    let mut p = String::new();
    p.push_str("Flag               Description\n");
    p.push_str("-----------------  -----------\n");
    if let Some(a) = o["parameters"].as_array() {
        for d in a {
            let flags: Vec<String> = d["flags"]
                .as_array()
                .map(|f| f.iter().filter_map(|s| s.as_str().map(String::from)).collect())
                .unwrap_or_default();
            let flag = flags.join(", ");
            p.push_str(&format!(
                "{:<19}{}\n",
                flag,
                d["description"].as_str().unwrap_or("")
            ));
        }
    }
    format!(
        "{}\nDescription:\n{}\nToolbox: {}\nParameters:\n\n{}\n\nExample usage:\n{}\n\nSource file: {}\n",
        tool_name,
        description,
        toolbox,
        p,
        st.get_example_usage(),
        st.get_source_file()
    )
}

fn get_name_and_description<'a>(st: Box<dyn StreamTool + 'a>) -> (String, String) {
    (st.get_tool_name(), st.get_tool_description())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolParameter {
    pub name: String,
    pub flags: Vec<String>,
    pub description: String,
    pub parameter_type: ParameterType,
    pub default_value: Option<String>,
    pub optional: bool,
}

impl fmt::Display for ToolParameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ParameterType {
    Boolean,
    String,
    ExistingFile(ParameterFileType),
    NewFile(ParameterFileType),
    OptionList(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ParameterFileType {
    Raster,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_lookup_ignores_case_and_underscores() {
        let tm = ToolManager::new("", &false).unwrap();
        assert!(tm.get_tool("Stream_Distance").is_some());
        assert!(tm.get_tool("streamdistance").is_some());
        assert!(tm.get_tool("FillDepressions").is_none());
        assert_eq!(
            tm.run_tool("NoSuchTool".to_string(), vec![]).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_help_lists_every_flag() {
        let tm = ToolManager::new("", &false).unwrap();
        let help = get_help(tm.get_tool("StreamDistance").unwrap());
        for flag in ["--d8_pntr", "--streams", "--dem", "--method", "--distance", "--difference"] {
            assert!(help.contains(flag), "help is missing {}", flag);
        }
    }

    #[test]
    fn test_parameters_are_json() {
        let p = ToolParameter {
            name: "Method".to_owned(),
            flags: vec!["--method".to_owned()],
            description: "Direction of measurement.".to_owned(),
            parameter_type: ParameterType::OptionList(vec!["downstream".to_owned(), "upstream".to_owned()]),
            default_value: Some("downstream".to_owned()),
            optional: true,
        };
        let s = p.to_string();
        let back: ToolParameter = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
    }
}
