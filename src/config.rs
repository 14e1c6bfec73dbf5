use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of the live control loop, fixed for one replay run. Defaults
/// are the constants the experiment ran with; a config file only needs the
/// fields it wants to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "SimulationConfig::default_scale_factor")]
    pub scale_factor: f64,
    #[serde(default = "SimulationConfig::default_internal_scaler")]
    pub internal_scaler: f64,
    #[serde(default = "SimulationConfig::default_tr_seconds")]
    pub tr_seconds: f64,
    #[serde(default = "SimulationConfig::default_frame_rate_hz")]
    pub frame_rate_hz: f64,
    #[serde(default = "SimulationConfig::default_outlier_threshold")]
    pub outlier_threshold: f64,
    #[serde(default = "SimulationConfig::default_upper_target")]
    pub upper_target: f64,
    #[serde(default = "SimulationConfig::default_lower_target")]
    pub lower_target: f64,
}

impl SimulationConfig {
    fn default_scale_factor() -> f64 {
        10.0
    }
    fn default_internal_scaler() -> f64 {
        10.0
    }
    fn default_tr_seconds() -> f64 {
        1.2
    }
    fn default_frame_rate_hz() -> f64 {
        60.0
    }
    fn default_outlier_threshold() -> f64 {
        2.0
    }
    fn default_upper_target() -> f64 {
        0.33
    }
    fn default_lower_target() -> f64 {
        -0.33
    }

    /// Display frames rendered per TR. The live loop truncates the ratio;
    /// leftover fractional frames are dropped, never carried over.
    pub fn frames_per_step(&self) -> u32 {
        (self.tr_seconds * self.frame_rate_hz).floor() as u32
    }

    /// Unfloored `tr_seconds * frame_rate_hz`; the per-frame delta divides
    /// by this, not by the truncated frame count.
    pub fn tr_frame_ratio(&self) -> f64 {
        self.tr_seconds * self.frame_rate_hz
    }

    /// Reject malformed parameters before a run starts. The simulator
    /// itself never fails mid-run.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("scale_factor", self.scale_factor),
            ("internal_scaler", self.internal_scaler),
            ("tr_seconds", self.tr_seconds),
            ("frame_rate_hz", self.frame_rate_hz),
            ("outlier_threshold", self.outlier_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be finite and > 0, got {value}"));
            }
        }
        if !self.upper_target.is_finite() || self.upper_target <= 0.0 {
            return Err(format!(
                "upper_target must be finite and > 0, got {}",
                self.upper_target
            ));
        }
        if !self.lower_target.is_finite() || self.lower_target >= 0.0 {
            return Err(format!(
                "lower_target must be finite and < 0, got {}",
                self.lower_target
            ));
        }
        if self.frames_per_step() < 1 {
            return Err(format!(
                "tr_seconds * frame_rate_hz = {} yields zero sub-frames per TR",
                self.tr_frame_ratio()
            ));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scale_factor: Self::default_scale_factor(),
            internal_scaler: Self::default_internal_scaler(),
            tr_seconds: Self::default_tr_seconds(),
            frame_rate_hz: Self::default_frame_rate_hz(),
            outlier_threshold: Self::default_outlier_threshold(),
            upper_target: Self::default_upper_target(),
            lower_target: Self::default_lower_target(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_out_dir")]
    pub out_dir: String,
}

impl OutputConfig {
    fn default_out_dir() -> String {
        "target/replay".to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: Self::default_out_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReplayConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ReplayConfig {
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write commented defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let mut commented = String::new();
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || (trimmed.starts_with('[') && trimmed.ends_with(']')) {
                        commented.push_str(line);
                    } else {
                        commented.push_str("# ");
                        commented.push_str(line);
                    }
                    commented.push('\n');
                }
                if let Err(err) = fs::write(path_obj, commented) {
                    eprintln!("Failed to write default config to {path}: {err}");
                }
            }
            Err(_) => {
                eprintln!("Failed to serialize default config; continuing with defaults");
            }
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "balltask_replay_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn defaults_are_valid_and_match_the_live_loop() {
        let cfg = SimulationConfig::default();
        cfg.validate().expect("defaults must validate");
        assert_eq!(cfg.scale_factor, 10.0);
        assert_eq!(cfg.internal_scaler, 10.0);
        assert_eq!(cfg.tr_seconds, 1.2);
        assert_eq!(cfg.frame_rate_hz, 60.0);
        assert_eq!(cfg.outlier_threshold, 2.0);
        assert_eq!(cfg.upper_target, 0.33);
        assert_eq!(cfg.lower_target, -0.33);
        assert_eq!(cfg.frames_per_step(), 72);
    }

    #[test]
    fn frames_per_step_truncates() {
        let cfg = SimulationConfig {
            tr_seconds: 1.25,
            frame_rate_hz: 59.9,
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.frames_per_step(), 74);
    }

    #[test]
    fn malformed_parameters_are_rejected() {
        let base = SimulationConfig::default();

        let cfg = SimulationConfig {
            tr_seconds: 0.0,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = SimulationConfig {
            frame_rate_hz: -60.0,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = SimulationConfig {
            outlier_threshold: f64::NAN,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = SimulationConfig {
            upper_target: -0.33,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        let cfg = SimulationConfig {
            lower_target: 0.33,
            ..base.clone()
        };
        assert!(cfg.validate().is_err());

        // Positive but so short that not a single sub-frame fits.
        let cfg = SimulationConfig {
            tr_seconds: 0.005,
            ..base
        };
        assert_eq!(cfg.frames_per_step(), 0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_or_default_writes_commented_defaults() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = ReplayConfig::load_or_default(&path_str);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.simulation.tr_seconds, 1.2);
        assert_eq!(cfg.output.out_dir, "target/replay");

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[simulation]"));
        assert!(contents.contains("# tr_seconds"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("custom.toml");
        let path_str = path.to_string_lossy().to_string();
        let custom = ReplayConfig {
            simulation: SimulationConfig {
                outlier_threshold: 2.5,
                upper_target: 0.4,
                lower_target: -0.4,
                ..SimulationConfig::default()
            },
            output: OutputConfig {
                out_dir: "out/replay".to_string(),
            },
        };
        fs::write(&path, toml::to_string_pretty(&custom).unwrap()).unwrap();

        let cfg = ReplayConfig::load_or_default(&path_str);
        assert_eq!(cfg.simulation.outlier_threshold, 2.5);
        assert_eq!(cfg.simulation.upper_target, 0.4);
        assert_eq!(cfg.simulation.lower_target, -0.4);
        assert_eq!(cfg.simulation.scale_factor, 10.0);
        assert_eq!(cfg.output.out_dir, "out/replay");

        let _ = fs::remove_file(&path);
    }
}
