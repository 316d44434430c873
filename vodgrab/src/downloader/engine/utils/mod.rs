//! Utility modules for download engines.

mod ffmpeg_parser;
mod files;
mod process_runner;

pub use ffmpeg_parser::{
    StatusLine, parse_size_label, parse_status_line, parse_time, parse_time_field, percentage,
};
pub use files::{ensure_output_dir, prepare_output_file};
pub use process_runner::{kill_and_reap, wait_or_kill};
