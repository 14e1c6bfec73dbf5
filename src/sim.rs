//! The trajectory simulator: replays a recorded ROI sequence through the
//! same integrator and boundary-crossing logic the live control loop runs,
//! one sub-frame at a time. Replay fidelity is the whole point; every guard
//! and reset below mirrors the live loop exactly.

use tracing::debug;

use crate::config::SimulationConfig;
use crate::sample::{Channel, HitEvent, Sample};

/// Everything one replay run produces. `trace` has one entry per input
/// sample, in input order; `hits` is ordered by volume.
#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    pub trace: Vec<f64>,
    pub hits: Vec<HitEvent>,
    pub cen_hits: u32,
    pub dmn_hits: u32,
}

impl RunOutcome {
    pub fn total_hits(&self) -> u32 {
        self.cen_hits + self.dmn_hits
    }

    pub fn hits_for(&self, channel: Channel) -> u32 {
        match channel {
            Channel::Cen => self.cen_hits,
            Channel::Dmn => self.dmn_hits,
        }
    }

    /// Min and max position the ball reached, (0, 0) for an empty trace.
    pub fn position_extremes(&self) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &p in &self.trace {
            min = min.min(p);
            max = max.max(p);
        }
        if min > max { (0.0, 0.0) } else { (min, max) }
    }
}

/// Mutable state threaded through one run. Owned by the simulator only;
/// a fresh run always starts from zero.
struct SimulationState {
    position: f64,
    cen_hits: u32,
    dmn_hits: u32,
}

/// Channel whose activation is numerically larger. CEN wins ties because
/// it is checked first in the live loop's fixed two-channel ordering.
fn winner(cen: f64, dmn: f64) -> Channel {
    if cen >= dmn { Channel::Cen } else { Channel::Dmn }
}

/// Replay `samples` in order under `cfg`. Pure and deterministic: identical
/// inputs always produce identical outcomes. The config is validated up
/// front; nothing fails once the run has started.
pub fn simulate(samples: &[Sample], cfg: &SimulationConfig) -> Result<RunOutcome, String> {
    cfg.validate()?;

    let frames_per_step = cfg.frames_per_step();
    let tr_frame_ratio = cfg.tr_frame_ratio();
    let gain = cfg.scale_factor / cfg.internal_scaler;

    let mut state = SimulationState {
        position: 0.0,
        cen_hits: 0,
        dmn_hits: 0,
    };
    let mut trace = Vec::with_capacity(samples.len());
    let mut hits = Vec::new();

    for sample in samples {
        // Missing-value samples are fully inert: no guards, no movement,
        // no event. The unchanged position is still recorded.
        let Some((cen, dmn)) = sample.values() else {
            trace.push(state.position);
            continue;
        };

        // Saturation guard: a spike on either channel freezes the ball
        // for this TR.
        if cen.abs().max(dmn.abs()) > cfg.outlier_threshold {
            trace.push(state.position);
            continue;
        }

        // Zero mean activity contributes no movement. The live loop gates
        // on the mean of the pair, not on the difference, so e.g.
        // (1.0, -1.0) is frozen even though the channels disagree.
        if (cen + dmn) / 2.0 == 0.0 {
            trace.push(state.position);
            continue;
        }

        let channel = winner(cen, dmn);
        let magnitude = (cen - dmn).abs() / 10.0;
        let velocity = channel.direction() * magnitude;
        let delta_per_frame = velocity * gain / tr_frame_ratio;

        for frame_index in 0..frames_per_step {
            state.position += delta_per_frame;

            if state.position > cfg.upper_target {
                hits.push(HitEvent {
                    volume: sample.volume,
                    channel: Channel::Cen,
                    position: state.position,
                    frame_index,
                });
                state.cen_hits += 1;
                debug!(
                    volume = sample.volume,
                    frame_index,
                    position = state.position,
                    "virtual CEN hit"
                );
                // Reset to exactly zero; overshoot is discarded and the
                // remaining sub-frames of this TR are not processed.
                state.position = 0.0;
                break;
            } else if state.position < cfg.lower_target {
                hits.push(HitEvent {
                    volume: sample.volume,
                    channel: Channel::Dmn,
                    position: state.position,
                    frame_index,
                });
                state.dmn_hits += 1;
                debug!(
                    volume = sample.volume,
                    frame_index,
                    position = state.position,
                    "virtual DMN hit"
                );
                state.position = 0.0;
                break;
            }
        }

        trace.push(state.position);
    }

    Ok(RunOutcome {
        trace,
        hits,
        cen_hits: state.cen_hits,
        dmn_hits: state.dmn_hits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(volume: u64, cen: f64, dmn: f64) -> Sample {
        Sample {
            volume,
            time_s: volume as f64 * 1.2,
            cen: Some(cen),
            dmn: Some(dmn),
        }
    }

    #[test]
    fn cen_wins_ties() {
        assert_eq!(winner(0.5, 0.5), Channel::Cen);
        assert_eq!(winner(-0.2, -0.2), Channel::Cen);
        assert_eq!(winner(0.1, 0.3), Channel::Dmn);
    }

    #[test]
    fn equal_nonzero_channels_do_not_move_the_ball() {
        // Winner is CEN but the magnitude |cen - dmn| / 10 is zero.
        let cfg = SimulationConfig::default();
        let out = simulate(&[sample(0, 0.7, 0.7)], &cfg).unwrap();
        assert_eq!(out.trace, vec![0.0]);
        assert!(out.hits.is_empty());
    }

    #[test]
    fn dmn_dominance_moves_down_even_when_dmn_is_negative() {
        // cen below dmn means DMN wins regardless of sign.
        let cfg = SimulationConfig::default();
        let out = simulate(&[sample(0, -1.0, -0.2)], &cfg).unwrap();
        assert_eq!(out.trace.len(), 1);
        assert!(out.trace[0] < 0.0);
    }

    #[test]
    fn extremes_cover_the_whole_trace() {
        let cfg = SimulationConfig::default();
        let out = simulate(
            &[sample(0, 1.0, 0.0), sample(1, 0.0, 1.5), sample(2, 0.2, 0.1)],
            &cfg,
        )
        .unwrap();
        let (min, max) = out.position_extremes();
        assert!(min <= max);
        assert!(out.trace.iter().all(|&p| p >= min && p <= max));
    }

    #[test]
    fn empty_input_yields_empty_outcome() {
        let cfg = SimulationConfig::default();
        let out = simulate(&[], &cfg).unwrap();
        assert!(out.trace.is_empty());
        assert!(out.hits.is_empty());
        assert_eq!(out.total_hits(), 0);
        assert_eq!(out.position_extremes(), (0.0, 0.0));
    }

    #[test]
    fn invalid_config_is_rejected_before_the_run() {
        let cfg = SimulationConfig {
            frame_rate_hz: 0.0,
            ..SimulationConfig::default()
        };
        assert!(simulate(&[sample(0, 1.0, 0.0)], &cfg).is_err());
    }
}
