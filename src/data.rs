//! Loading of recorded `*_roi_outputs.csv` files. This is collaborator
//! glue around the simulator: file and parse failures surface here, never
//! from inside the engine.

use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::sample::Sample;

pub const DEFAULT_UPPER_TARGET: f64 = 0.33;
pub const DEFAULT_LOWER_TARGET: f64 = -0.33;

/// One recording, filtered to the active feedback period.
#[derive(Clone, Debug)]
pub struct RoiRun {
    pub samples: Vec<Sample>,
    /// Target boundaries recorded in the file, when the session logged
    /// them. Absent columns fall back to the task defaults.
    pub upper_target: Option<f64>,
    pub lower_target: Option<f64>,
    /// Hit counts the session itself recorded (for a SHAM participant
    /// these describe the yoked display, not their own signal).
    pub recorded_cen_hits: Option<u64>,
    pub recorded_dmn_hits: Option<u64>,
    /// Row count before the feedback-stage filter.
    pub total_volumes: usize,
}

impl RoiRun {
    pub fn targets_or_default(&self) -> (f64, f64) {
        (
            self.upper_target.unwrap_or(DEFAULT_UPPER_TARGET),
            self.lower_target.unwrap_or(DEFAULT_LOWER_TARGET),
        )
    }
}

/// The layouts the experiment stored recordings under, most specific
/// first. Session type differs between the two `data/` variants.
pub fn candidate_paths(data_root: &Path, participant: u32, run: u32) -> Vec<PathBuf> {
    let sub = format!("sub-mindbpd{participant}");
    vec![
        data_root
            .join("data")
            .join(&sub)
            .join(format!("{sub}_DMN_feedback_{run}_roi_outputs.csv")),
        data_root
            .join("data")
            .join(&sub)
            .join(format!("{sub}_DMN_nofeedback_{run}_roi_outputs.csv")),
        data_root
            .join("feedback")
            .join(&sub)
            .join(format!("{sub}_DMN_feedback_{run}_roi_outputs.csv")),
    ]
}

/// First existing candidate for this participant and run.
pub fn find_roi_outputs(data_root: &Path, participant: u32, run: u32) -> Option<PathBuf> {
    for path in candidate_paths(data_root, participant, run) {
        debug!(path = %path.display(), "probing roi_outputs candidate");
        if path.exists() {
            info!(path = %path.display(), "found roi_outputs recording");
            return Some(path);
        }
    }
    None
}

pub fn load_roi_outputs(path: &Path) -> Result<RoiRun, String> {
    let text =
        read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_roi_csv(&text).map_err(|e| format!("{}: {e}", path.display()))
}

fn parse_opt_f64(v: Option<&str>) -> Option<f64> {
    let s = v?.trim();
    if s.is_empty() {
        return None;
    }
    let x = s.parse::<f64>().ok()?;
    if x.is_finite() { Some(x) } else { None }
}

/// Integer-valued columns arrive as "12" or "12.0" depending on how the
/// session serialized them.
fn parse_u64_loose(v: Option<&str>) -> Option<u64> {
    let x = parse_opt_f64(v)?;
    if x < 0.0 {
        return None;
    }
    Some(x.round() as u64)
}

fn parse_f64_required(cols: &[&str], idx: usize, name: &str, line_no: usize) -> Result<f64, String> {
    cols.get(idx)
        .ok_or_else(|| format!("line {line_no} missing column {name}"))?
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("line {line_no} invalid {name}: {e}"))
}

/// Parse a roi_outputs CSV and keep the feedback-period rows. Blank or
/// non-numeric `cen`/`dmn` cells become missing values, not errors; the
/// simulator treats those samples as inert.
pub fn parse_roi_csv(text: &str) -> Result<RoiRun, String> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or_else(|| "empty CSV".to_string())?;
    let mut col_idx = HashMap::new();
    for (i, c) in header.split(',').enumerate() {
        col_idx.insert(c.trim().to_string(), i);
    }

    for name in ["volume", "time", "stage", "cen", "dmn"] {
        if !col_idx.contains_key(name) {
            return Err(format!("missing required column `{name}`"));
        }
    }
    let volume_i = col_idx["volume"];
    let time_i = col_idx["time"];
    let stage_i = col_idx["stage"];
    let cen_i = col_idx["cen"];
    let dmn_i = col_idx["dmn"];
    let top_i = col_idx.get("top_circle_y_position").copied();
    let bottom_i = col_idx.get("bottom_circle_y_position").copied();
    let cen_hits_i = col_idx.get("cen_cumulative_hits").copied();
    let dmn_hits_i = col_idx.get("dmn_cumulative_hits").copied();

    let mut samples = Vec::new();
    let mut upper_target = None;
    let mut lower_target = None;
    let mut recorded_cen_hits: Option<u64> = None;
    let mut recorded_dmn_hits: Option<u64> = None;
    let mut total_volumes = 0usize;

    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let cols: Vec<&str> = line.split(',').collect();
        total_volumes += 1;

        let stage = cols
            .get(stage_i)
            .map(|s| s.trim())
            .ok_or_else(|| format!("line {line_no} missing column stage"))?;
        if stage != "feedback" {
            continue;
        }

        let volume = parse_u64_loose(cols.get(volume_i).copied())
            .ok_or_else(|| format!("line {line_no} has invalid volume"))?;
        let time_s = parse_f64_required(&cols, time_i, "time", line_no)?;
        let cen = parse_opt_f64(cols.get(cen_i).copied());
        let dmn = parse_opt_f64(cols.get(dmn_i).copied());

        // Targets are constant over a session; take them from the first
        // feedback row that carries both.
        if upper_target.is_none() || lower_target.is_none() {
            let top = top_i.and_then(|idx| parse_opt_f64(cols.get(idx).copied()));
            let bottom = bottom_i.and_then(|idx| parse_opt_f64(cols.get(idx).copied()));
            if let (Some(top), Some(bottom)) = (top, bottom) {
                upper_target = Some(top);
                lower_target = Some(bottom);
            }
        }

        // Cumulative columns are monotone; the last feedback row holds
        // the session totals.
        if let Some(idx) = cen_hits_i {
            if let Some(v) = parse_u64_loose(cols.get(idx).copied()) {
                recorded_cen_hits = Some(recorded_cen_hits.unwrap_or(0).max(v));
            }
        }
        if let Some(idx) = dmn_hits_i {
            if let Some(v) = parse_u64_loose(cols.get(idx).copied()) {
                recorded_dmn_hits = Some(recorded_dmn_hits.unwrap_or(0).max(v));
            }
        }

        samples.push(Sample {
            volume,
            time_s,
            cen,
            dmn,
        });
    }

    if samples.is_empty() {
        return Err("no feedback-stage rows in recording".to_string());
    }

    Ok(RoiRun {
        samples,
        upper_target,
        lower_target,
        recorded_cen_hits,
        recorded_dmn_hits,
        total_volumes,
    })
}
