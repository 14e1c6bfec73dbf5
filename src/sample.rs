//! Input and output records of the trajectory simulator.

/// The two competing ROI channels. `Cen` drives the ball toward the upper
/// target, `Dmn` toward the lower one. The mapping is fixed and CEN wins
/// ties, matching the live control loop's channel ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Cen,
    Dmn,
}

impl Channel {
    pub fn direction(self) -> f64 {
        match self {
            Channel::Cen => 1.0,
            Channel::Dmn => -1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Cen => "CEN",
            Channel::Dmn => "DMN",
        }
    }
}

/// One recorded TR of ROI activity. `cen`/`dmn` are z-scores; `None` marks
/// a missing value (blank or non-finite cell in the recording).
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub volume: u64,
    pub time_s: f64,
    pub cen: Option<f64>,
    pub dmn: Option<f64>,
}

impl Sample {
    /// Both channel values, if this sample carries usable numbers.
    pub fn values(&self) -> Option<(f64, f64)> {
        match (self.cen, self.dmn) {
            (Some(c), Some(d)) if c.is_finite() && d.is_finite() => Some((c, d)),
            _ => None,
        }
    }

    /// Preferential differential activation, `cen - dmn`. Reporting only,
    /// the simulator never consumes it.
    pub fn pda(&self) -> Option<f64> {
        self.values().map(|(c, d)| c - d)
    }
}

/// A boundary crossing. `position` is the ball position at the moment of
/// the crossing, before the reset to zero; `frame_index` is the sub-frame
/// within the sample's TR on which the crossing happened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitEvent {
    pub volume: u64,
    pub channel: Channel,
    pub position: f64,
    pub frame_index: u32,
}

#[cfg(test)]
mod tests {
    use super::{Channel, Sample};

    #[test]
    fn channel_directions_oppose() {
        assert_eq!(Channel::Cen.direction(), 1.0);
        assert_eq!(Channel::Dmn.direction(), -1.0);
    }

    #[test]
    fn non_finite_values_count_as_missing() {
        let s = Sample {
            volume: 3,
            time_s: 3.6,
            cen: Some(f64::NAN),
            dmn: Some(0.2),
        };
        assert!(s.values().is_none());
        assert!(s.pda().is_none());

        let s = Sample {
            volume: 4,
            time_s: 4.8,
            cen: Some(0.5),
            dmn: Some(-0.25),
        };
        assert_eq!(s.values(), Some((0.5, -0.25)));
        assert_eq!(s.pda(), Some(0.75));
    }
}
