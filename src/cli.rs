//! CLI argument parsing for the paraplan binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "paraplan", about = "Paratransit route optimization backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Optimize a day of bookings and print or persist the result
    Solve {
        /// Bookings file (JSON array or dispatch CSV export)
        #[arg(long)]
        input: PathBuf,

        /// Input format; inferred from the file extension when omitted
        #[arg(long, value_enum)]
        format: Option<InputFormat>,

        /// Write the result JSON here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// POST the completed result to this webhook URL
        #[arg(long)]
        webhook_url: Option<String>,

        /// Override the solve time limit in seconds
        #[arg(long)]
        time_limit: Option<u64>,
    },
    /// Print the last persisted optimization result
    LastResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    /// Infer the format from a file extension, defaulting to JSON
    pub fn infer(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}
