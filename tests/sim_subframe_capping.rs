use balltask_replay::config::SimulationConfig;
use balltask_replay::sample::Sample;
use balltask_replay::sim::simulate;

fn sample(volume: u64, cen: f64, dmn: f64) -> Sample {
    Sample {
        volume,
        time_s: volume as f64 * 1.2,
        cen: Some(cen),
        dmn: Some(dmn),
    }
}

// With the task defaults a TR holds floor(1.2 * 60) = 72 sub-frames and
// the per-frame delta divides by the unfloored ratio, so one TR moves the
// ball by exactly velocity * gain. A 1.5 z-score difference gives velocity
// 0.15: it would need ~159 sub-frames to reach the 0.33 target, so the
// step ends short of it and no hit fires.
#[test]
fn strong_sample_is_capped_at_frames_per_step() {
    let cfg = SimulationConfig::default();
    assert_eq!(cfg.frames_per_step(), 72);

    let out = simulate(&[sample(0, 1.5, 0.0)], &cfg).unwrap();
    assert!(out.hits.is_empty());
    assert_eq!(out.trace.len(), 1);
    assert!(
        (out.trace[0] - 0.15).abs() < 1e-9,
        "expected ~0.15, got {}",
        out.trace[0]
    );
}

// The winner is the numerically larger channel: a strongly negative DMN
// loses to a zero CEN, so the ball keeps moving up.
#[test]
fn negative_dmn_drives_the_ball_up() {
    let cfg = SimulationConfig::default();
    let out = simulate(&[sample(0, 1.5, 0.0), sample(1, 0.0, -1.6)], &cfg).unwrap();
    assert!(out.hits.is_empty());
    assert!(
        (out.trace[1] - 0.31).abs() < 1e-9,
        "expected ~0.31, got {}",
        out.trace[1]
    );
}

// Leftover fractional frames are dropped, never accumulated into the next
// step: two TRs at a non-integral ratio move the ball by exactly twice one
// TR's worth.
#[test]
fn fractional_frames_do_not_accumulate() {
    let cfg = SimulationConfig {
        frame_rate_hz: 60.4,
        ..SimulationConfig::default()
    };
    // 1.2 * 60.4 = 72.48 -> 72 sub-frames per TR.
    assert_eq!(cfg.frames_per_step(), 72);

    let one = simulate(&[sample(0, 1.0, 0.0)], &cfg).unwrap();
    let two = simulate(&[sample(0, 1.0, 0.0), sample(1, 1.0, 0.0)], &cfg).unwrap();
    assert!((two.trace[1] - 2.0 * one.trace[0]).abs() < 1e-9);
}
