//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tagweave")]
#[command(about = "Hierarchical tag taxonomies that stay in sync", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new workspace
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },

    /// Manage tagsets
    Tagset {
        #[command(subcommand)]
        command: TagsetCommand,
    },

    /// Manage the tags of a tagset
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },

    /// Show the tags of a tagset as a tree
    Tree {
        /// Tagset uuid or name
        tagset: String,
    },

    /// Write a tagset to a TOML file
    Export {
        /// Tagset uuid or name
        tagset: String,
        file: PathBuf,
    },

    /// Add a tagset from a TOML file
    Import { file: PathBuf },

    /// Compare a tagset with a copy in a TOML file
    Status {
        /// Tagset uuid or name
        tagset: String,

        /// File holding the other copy
        #[arg(long, value_name = "FILE")]
        against: PathBuf,
    },

    /// Bring a tagset up to date with a copy in a TOML file
    Sync {
        /// Tagset uuid or name
        tagset: String,

        /// File holding the incoming copy
        #[arg(long, value_name = "FILE")]
        from: PathBuf,

        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagsetCommand {
    /// Create an empty tagset
    New { name: String },

    /// List all tagsets
    List,

    /// Rename a tagset
    Rename {
        /// Tagset uuid or name
        tagset: String,
        name: String,
    },

    /// Remove a tagset with all its tags
    Remove {
        /// Tagset uuid or name
        tagset: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Add a tag definition
    Add {
        /// Tagset uuid or name
        tagset: String,
        name: String,

        /// Parent tag uuid or name (default: top level)
        #[arg(short, long)]
        parent: Option<String>,

        /// Free-form tag type
        #[arg(short = 't', long = "type")]
        tag_type: Option<String>,

        /// Display color as #RRGGBB (default: from config)
        #[arg(short, long)]
        color: Option<String>,
    },

    /// Remove a tag and all tags below it
    Remove {
        /// Tagset uuid or name
        tagset: String,
        /// Tag uuid or name
        tag: String,
    },

    /// Change the display color of a tag
    Color {
        /// Tagset uuid or name
        tagset: String,
        /// Tag uuid or name
        tag: String,
        color: String,
    },
}
