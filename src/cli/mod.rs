//! CLI layer - Command-line interface

pub mod commands;
pub mod output;

pub use commands::{Cli, Commands, TagCommand, TagsetCommand};
pub use output::{format_sync_report, format_tag_tree, format_tagset_list};
