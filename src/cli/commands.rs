use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "incident-tracker")]
#[command(version, about = "Track incident reports from OPEN to ARCHIVED")]
#[command(propagate_version = true)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Incident data file (overrides config and INCIDENTS_DATA_PATH)
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },

    /// List incidents
    List {
        /// Include archived incidents
        #[arg(long, short = 'a')]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single incident
    Get {
        /// Incident ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report a new incident
    Add {
        /// Short title (at least 5 characters)
        title: String,

        /// What happened (at least 10 characters)
        #[arg(long, short = 'd')]
        description: String,

        /// IT, SAFETY, FACILITIES or OTHER
        #[arg(long, short = 'c')]
        category: String,

        /// LOW, MEDIUM or HIGH
        #[arg(long, short = 's')]
        severity: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move an incident to a new status
    Status {
        /// Incident ID
        id: String,

        /// OPEN, INVESTIGATING, RESOLVED or ARCHIVED
        status: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Archive an incident
    Archive {
        /// Incident ID
        id: String,
    },

    /// Reopen an archived incident
    Reopen {
        /// Incident ID
        id: String,
    },

    /// Create incidents from a CSV file
    Import {
        /// CSV file with a title,description,category,severity[,status] header
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
