// Entry point: loads a recording, replays it through the simulator, and
// writes the diagnostic outputs.

use std::error::Error;
use std::fs::create_dir_all;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use balltask_replay::cli::Args;
use balltask_replay::config::ReplayConfig;
use balltask_replay::{data, plot, report, sim};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let file_cfg = ReplayConfig::load_or_default(&args.config);

    let input = match &args.input {
        Some(path) => path.clone(),
        None => {
            let participant = args
                .participant
                .ok_or("either --input or --participant is required")?;
            data::find_roi_outputs(&args.data_root, participant, args.run).ok_or_else(|| {
                format!(
                    "no roi_outputs recording found for participant {participant} run {} under {}",
                    args.run,
                    args.data_root.display()
                )
            })?
        }
    };

    let run_data = data::load_roi_outputs(&input)?;

    // Targets logged in the recording win over the configured defaults.
    let mut sim_cfg = file_cfg.simulation.clone();
    if let (Some(upper), Some(lower)) = (run_data.upper_target, run_data.lower_target) {
        sim_cfg.upper_target = upper;
        sim_cfg.lower_target = lower;
    }
    sim_cfg.validate()?;

    let outcome = sim::simulate(&run_data.samples, &sim_cfg)?;

    let label = match args.participant {
        Some(p) => format!("participant {p}, run {}", args.run),
        None => input.display().to_string(),
    };
    report::print_summary(&label, &run_data, &sim_cfg, &outcome);

    let outdir = args
        .outdir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&file_cfg.output.out_dir));
    create_dir_all(&outdir)?;

    let trace_path = outdir.join("virtual_trace.csv");
    report::write_trace_csv(&trace_path, &run_data.samples, &outcome.trace)?;
    let hits_path = outdir.join("virtual_hits.csv");
    report::write_hits_csv(&hits_path, &outcome.hits)?;
    info!(
        trace = %trace_path.display(),
        hits = %hits_path.display(),
        "wrote replay CSVs"
    );

    if !args.no_plot {
        let fig_path = outdir.join("replay_diagnosis.png");
        plot::render_diagnosis(&fig_path, &label, &run_data.samples, &outcome, &sim_cfg)?;
        println!("Diagnostic figure saved as: {}", fig_path.display());
    }

    Ok(())
}
