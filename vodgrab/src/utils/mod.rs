//! Small helpers shared by the command line front end.

pub mod filename;

pub use filename::{OUTPUT_EXTENSION, default_output_path, sanitize_stem};
