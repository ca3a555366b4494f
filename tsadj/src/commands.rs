use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tsadj", version, about = "Adjustment panel step library CLI")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run Setup, Display, SetValue, Hide and Cleanup against a console panel
    Run(RunArgs),
    /// Format a value the way the panel limit labels do
    Format {
        format: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Bench definitions (TOML); a single "AdjustBench" is used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Panel timing configuration (TOML or JSON)
    #[arg(long)]
    pub panel_config: Option<PathBuf>,
    #[arg(long, default_value = "AdjustBench")]
    pub bench: String,
    #[arg(long, default_value = "Adjust value")]
    pub step: String,
    #[arg(long, default_value = "OK")]
    pub button: String,
    #[arg(long, default_value = "")]
    pub unit: String,
    #[arg(long, default_value = "%.2f")]
    pub format: String,
    #[arg(long, allow_negative_numbers = true, default_value_t = 0.0)]
    pub lower: f64,
    #[arg(long, allow_negative_numbers = true, default_value_t = 10.0)]
    pub upper: f64,
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub values: Vec<f64>,
    /// Press the panel button before hiding it
    #[arg(long)]
    pub commit: bool,
}
