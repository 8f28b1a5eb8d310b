/*
This library is part of the StreamTools stream network analysis project.
*/

pub mod algorithms;
pub mod configs;
pub mod structures;
pub mod utils;
