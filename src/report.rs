//! Console diagnostics and CSV export of a replay run. Pure presentation;
//! everything here consumes the simulator's outcome and imposes nothing
//! back on it.

use std::fs::write;
use std::io;
use std::path::Path;

use crate::config::SimulationConfig;
use crate::data::RoiRun;
use crate::sample::{HitEvent, Sample};
use crate::sim::RunOutcome;

/// Summary statistics over the present values of one channel.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelStats {
    pub n: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

pub fn channel_stats(values: impl Iterator<Item = Option<f64>>) -> ChannelStats {
    let present: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return ChannelStats::default();
    }
    let n = present.len();
    let mean = present.iter().sum::<f64>() / n as f64;
    let var = if n > 1 {
        present.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    ChannelStats {
        n,
        mean,
        std: var.sqrt(),
        min,
        max,
    }
}

fn outlier_volumes(samples: &[Sample], threshold: f64) -> usize {
    samples
        .iter()
        .filter_map(Sample::values)
        .filter(|(c, d)| c.abs().max(d.abs()) > threshold)
        .count()
}

/// The diagnostic printout: what the recording contains, what the session
/// logged, and what the participant's own signal would have produced.
pub fn print_summary(label: &str, run: &RoiRun, cfg: &SimulationConfig, outcome: &RunOutcome) {
    let bar = "=".repeat(70);
    println!("\n{bar}");
    println!("Virtual trajectory replay: {label}");
    println!("{bar}\n");

    println!("Total volumes: {}", run.total_volumes);
    println!("Feedback volumes: {}", run.samples.len());

    let cen = channel_stats(run.samples.iter().map(|s| s.cen));
    let dmn = channel_stats(run.samples.iter().map(|s| s.dmn));
    println!("\nBrain activity statistics:");
    println!(
        "  CEN - mean: {:.4}, std: {:.4}, min: {:.4}, max: {:.4}",
        cen.mean, cen.std, cen.min, cen.max
    );
    println!(
        "  DMN - mean: {:.4}, std: {:.4}, min: {:.4}, max: {:.4}",
        dmn.mean, dmn.std, dmn.min, dmn.max
    );

    if let (Some(c), Some(d)) = (run.recorded_cen_hits, run.recorded_dmn_hits) {
        println!("\nRecorded (displayed) hit counts:");
        println!("  CEN hits: {c}");
        println!("  DMN hits: {d}");
    }

    println!("\nTargets:");
    println!("  CEN (top): {:.4}", cfg.upper_target);
    println!("  DMN (bottom): {:.4}", cfg.lower_target);
    println!("\nSimulation parameters:");
    println!("  Scale factor: {}", cfg.scale_factor);
    println!("  Internal scaler: {}", cfg.internal_scaler);
    println!(
        "  Sub-frames per TR: {} (TR {} s at {} Hz)",
        cfg.frames_per_step(),
        cfg.tr_seconds,
        cfg.frame_rate_hz
    );

    for hit in &outcome.hits {
        println!(
            "  Volume {}: VIRTUAL {} HIT (ball_y={:.4}, frame={}/{})",
            hit.volume,
            hit.channel.label(),
            hit.position,
            hit.frame_index,
            cfg.frames_per_step()
        );
    }

    println!("\n{bar}");
    println!("Virtual results:");
    println!("  CEN hits: {}", outcome.cen_hits);
    println!("  DMN hits: {}", outcome.dmn_hits);
    println!("  Total: {}", outcome.total_hits());
    println!("{bar}\n");

    let pda = channel_stats(run.samples.iter().map(|s| s.pda()));
    println!("Diagnostic checks:");
    println!(
        "  PDA (CEN - DMN) - mean: {:.4}, min: {:.4}, max: {:.4}",
        pda.mean, pda.min, pda.max
    );
    let outliers = outlier_volumes(&run.samples, cfg.outlier_threshold);
    let pct = if run.samples.is_empty() {
        0.0
    } else {
        100.0 * outliers as f64 / run.samples.len() as f64
    };
    println!(
        "  Outlier volumes: {outliers} / {} ({pct:.1}%)",
        run.samples.len()
    );
    let (min_y, max_y) = outcome.position_extremes();
    println!(
        "  Max ball position reached: {max_y:.4} (target: {:.4})",
        cfg.upper_target
    );
    println!(
        "  Min ball position reached: {min_y:.4} (target: {:.4})",
        cfg.lower_target
    );
    println!(
        "  Distance from CEN target: {:.4}",
        (max_y - cfg.upper_target).abs()
    );
    println!(
        "  Distance from DMN target: {:.4}",
        (min_y - cfg.lower_target).abs()
    );
}

/// Write the virtual trajectory next to its inputs, one row per volume.
/// Missing channel values become empty cells.
pub fn write_trace_csv(path: &Path, samples: &[Sample], trace: &[f64]) -> io::Result<()> {
    let mut csv = String::from("volume,time,cen,dmn,virtual_ball_y\n");
    for (sample, &position) in samples.iter().zip(trace.iter()) {
        let cen = sample.cen.map(|v| format!("{v:.6}")).unwrap_or_default();
        let dmn = sample.dmn.map(|v| format!("{v:.6}")).unwrap_or_default();
        csv.push_str(&format!(
            "{},{:.4},{cen},{dmn},{position:.6}\n",
            sample.volume, sample.time_s
        ));
    }
    write(path, csv)
}

pub fn write_hits_csv(path: &Path, hits: &[HitEvent]) -> io::Result<()> {
    let mut csv = String::from("volume,channel,position,frame_index\n");
    for hit in hits {
        csv.push_str(&format!(
            "{},{},{:.6},{}\n",
            hit.volume,
            hit.channel.label(),
            hit.position,
            hit.frame_index
        ));
    }
    write(path, csv)
}
