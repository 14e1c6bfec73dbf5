use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Participant ID (e.g. 2099)
    #[arg(long)]
    pub participant: Option<u32>,

    /// Run number
    #[arg(long, default_value_t = 1)]
    pub run: u32,

    /// Study directory containing data/ and feedback/ subdirectories
    #[arg(long, default_value = ".")]
    pub data_root: PathBuf,

    /// Explicit roi_outputs CSV path (bypasses participant/run discovery)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Path to config TOML
    #[arg(long, default_value = "replay.toml")]
    pub config: String,

    /// Output directory for trace/hit CSVs and the figure (overrides config)
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Skip rendering the diagnosis figure
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,
}
