//! Diagnostic figure for one replay run: virtual trajectory, raw channel
//! activity, and PDA, stacked the way the experimenters eyeball them.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;

use crate::config::SimulationConfig;
use crate::sample::{Channel, Sample};
use crate::sim::RunOutcome;

const FIG_SIZE: (u32, u32) = (1400, 1000);

fn volume_bounds(samples: &[Sample]) -> (f64, f64) {
    let first = samples.first().map(|s| s.volume as f64).unwrap_or(0.0);
    let last = samples.last().map(|s| s.volume as f64).unwrap_or(1.0);
    if last > first { (first, last) } else { (first, first + 1.0) }
}

fn padded_range(values: impl Iterator<Item = f64>, at_least: f64) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min > max {
        min = -at_least;
        max = at_least;
    }
    min = min.min(-at_least);
    max = max.max(at_least);
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn guide_line(x0: f64, x1: f64, y: f64) -> PathElement<(f64, f64)> {
    PathElement::new(vec![(x0, y), (x1, y)], BLACK.mix(0.25))
}

/// Render the three-panel diagnosis figure.
pub fn render_diagnosis(
    out_path: &Path,
    label: &str,
    samples: &[Sample],
    outcome: &RunOutcome,
    cfg: &SimulationConfig,
) -> Result<(), Box<dyn Error>> {
    let (x0, x1) = volume_bounds(samples);

    let root = BitMapBackend::new(out_path, FIG_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((3, 1));

    // Panel 1: virtual trajectory with targets and hit markers.
    let (y0, y1) = padded_range(
        outcome.trace.iter().copied(),
        cfg.upper_target.max(-cfg.lower_target) * 1.1,
    );
    let mut chart = ChartBuilder::on(&panels[0])
        .caption(
            format!("{label}: simulated virtual ball movement"),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("volume")
        .y_desc("virtual ball y")
        .draw()?;

    chart.draw_series(std::iter::once(guide_line(x0, x1, 0.0)))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x0, cfg.upper_target), (x1, cfg.upper_target)],
        RED.mix(0.6),
    )))?;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(x0, cfg.lower_target), (x1, cfg.lower_target)],
        BLUE.mix(0.6),
    )))?;

    let trace_points = samples
        .iter()
        .zip(outcome.trace.iter())
        .map(|(s, &p)| (s.volume as f64, p));
    chart.draw_series(LineSeries::new(trace_points, &BLACK))?;

    chart.draw_series(outcome.hits.iter().map(|hit| {
        let color = match hit.channel {
            Channel::Cen => RED.filled(),
            Channel::Dmn => BLUE.filled(),
        };
        Circle::new((hit.volume as f64, hit.position), 5, color)
    }))?;

    // Panel 2: raw channel activity with the outlier threshold guides.
    let (y0, y1) = padded_range(
        samples
            .iter()
            .flat_map(|s| [s.cen, s.dmn])
            .flatten(),
        cfg.outlier_threshold * 1.1,
    );
    let mut chart = ChartBuilder::on(&panels[1])
        .caption("Brain activity (CEN vs DMN)", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("volume")
        .y_desc("activation (z-score)")
        .draw()?;

    chart.draw_series(std::iter::once(guide_line(x0, x1, 0.0)))?;
    for y in [cfg.outlier_threshold, -cfg.outlier_threshold] {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x0, y), (x1, y)],
            RED.mix(0.35),
        )))?;
    }

    let cen_points: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| s.cen.map(|v| (s.volume as f64, v)))
        .collect();
    let dmn_points: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| s.dmn.map(|v| (s.volume as f64, v)))
        .collect();
    chart
        .draw_series(LineSeries::new(cen_points, &RED))?
        .label("CEN")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
    chart
        .draw_series(LineSeries::new(dmn_points, &BLUE))?
        .label("DMN")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    // Panel 3: PDA with dominance shading.
    let pda_points: Vec<(f64, f64)> = samples
        .iter()
        .filter_map(|s| s.pda().map(|v| (s.volume as f64, v)))
        .collect();
    let (y0, y1) = padded_range(pda_points.iter().map(|&(_, v)| v), 0.5);
    let mut chart = ChartBuilder::on(&panels[2])
        .caption(
            "Preferential differential activation (CEN - DMN)",
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;
    chart
        .configure_mesh()
        .x_desc("volume")
        .y_desc("PDA")
        .draw()?;

    chart.draw_series(std::iter::once(guide_line(x0, x1, 0.0)))?;
    let above = pda_points.iter().map(|&(x, v)| (x, v.max(0.0)));
    let below = pda_points.iter().map(|&(x, v)| (x, v.min(0.0)));
    chart.draw_series(AreaSeries::new(above, 0.0, RED.mix(0.2)))?;
    chart.draw_series(AreaSeries::new(below, 0.0, BLUE.mix(0.2)))?;
    chart.draw_series(LineSeries::new(pda_points, &BLACK))?;

    root.present()?;
    Ok(())
}
