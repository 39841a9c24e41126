//! Configuration bundle for the detection pipeline. Every field has a
//! default, so an empty JSON object is a valid configuration; unrecognized
//! keys are ignored. Loading and validation happen once at startup; the
//! pipeline never re-reads configuration per frame.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_AREA_THRESHOLD: f64 = 1000.0;
const DEFAULT_DETECT_DURATION: f64 = 3.0;
const DEFAULT_LAST_BEEP_TIME_THRESHOLD: f64 = 5.0;
const DEFAULT_GAUSSIAN_BLUR_KERNEL_SIZE: u32 = 1;
const DEFAULT_GAUSSIAN_BLUR_SIGMA: f64 = 10.0;

/// Tunable behavior for the sentry pipeline and its collaborators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    /// Minimum blob area (in pixels) that counts as motion.
    pub area_threshold: f64,
    /// Seconds of continuous motion before an alert escalates to sustained.
    pub detect_duration: f64,
    /// Minimum seconds between fired alerts, regardless of severity.
    #[serde(alias = "last_beep_time")]
    pub last_beep_time_threshold: f64,
    /// Side length of the Gaussian blur kernel; must be odd, 1 disables the
    /// blur.
    pub gaussian_blur_kernel_size: u32,
    /// Standard deviation of the Gaussian blur; non-positive derives it from
    /// the kernel size.
    pub gaussian_blur_sigma: f64,
    /// Whether alert sinks should also request window minimization.
    pub minimize_windows: bool,
    /// Hard expiry date for the program; checked once at startup.
    pub expires: Option<NaiveDate>,
    /// Initial region of interest as [x0, y0, x1, y1] in frame coordinates.
    pub region: Option<[i32; 4]>,
    /// Where the demo runner writes its annotated detection snapshot.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            area_threshold: DEFAULT_AREA_THRESHOLD,
            detect_duration: DEFAULT_DETECT_DURATION,
            last_beep_time_threshold: DEFAULT_LAST_BEEP_TIME_THRESHOLD,
            gaussian_blur_kernel_size: DEFAULT_GAUSSIAN_BLUR_KERNEL_SIZE,
            gaussian_blur_sigma: DEFAULT_GAUSSIAN_BLUR_SIGMA,
            minimize_windows: false,
            expires: None,
            region: None,
            snapshot_path: None,
        }
    }
}

impl SentryConfig {
    /// Loads and validates a configuration file. A missing file is its own
    /// error so the caller can tell the operator exactly what to create.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path)?;
        let config: SentryConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gaussian_blur_kernel_size == 0 || self.gaussian_blur_kernel_size % 2 == 0 {
            return Err(ConfigError::InvalidBlurKernel(
                self.gaussian_blur_kernel_size,
            ));
        }
        if !(self.area_threshold >= 0.0) {
            return Err(ConfigError::NegativeValue("area_threshold"));
        }
        if !(self.detect_duration >= 0.0) {
            return Err(ConfigError::NegativeValue("detect_duration"));
        }
        if !(self.last_beep_time_threshold >= 0.0) {
            return Err(ConfigError::NegativeValue("last_beep_time_threshold"));
        }
        if !self.gaussian_blur_sigma.is_finite() {
            return Err(ConfigError::NonFinite("gaussian_blur_sigma"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    Missing(PathBuf),
    #[error("gaussian_blur_kernel_size must be a positive odd integer, got {0}")]
    InvalidBlurKernel(u32),
    #[error("{0} must be a non-negative number")]
    NegativeValue(&'static str),
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_takes_all_defaults() {
        let config: SentryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.area_threshold, 1000.0);
        assert_eq!(config.detect_duration, 3.0);
        assert_eq!(config.last_beep_time_threshold, 5.0);
        assert_eq!(config.gaussian_blur_kernel_size, 1);
        assert_eq!(config.gaussian_blur_sigma, 10.0);
        assert!(!config.minimize_windows);
        assert!(config.expires.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn partial_bundle_keeps_remaining_defaults() {
        let config: SentryConfig =
            serde_json::from_str(r#"{"area_threshold": 250.0, "detect_duration": 1.5}"#).unwrap();
        assert_eq!(config.area_threshold, 250.0);
        assert_eq!(config.detect_duration, 1.5);
        assert_eq!(config.last_beep_time_threshold, 5.0);
    }

    #[test]
    fn legacy_beep_key_is_accepted() {
        let config: SentryConfig = serde_json::from_str(r#"{"last_beep_time": 8.0}"#).unwrap();
        assert_eq!(config.last_beep_time_threshold, 8.0);
    }

    #[test]
    fn even_or_zero_blur_kernel_is_rejected() {
        let config: SentryConfig =
            serde_json::from_str(r#"{"gaussian_blur_kernel_size": 4}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBlurKernel(4))
        ));

        let config: SentryConfig =
            serde_json::from_str(r#"{"gaussian_blur_kernel_size": 0}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_thresholds_are_rejected() {
        let config: SentryConfig = serde_json::from_str(r#"{"detect_duration": -1.0}"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeValue("detect_duration"))
        ));
    }

    #[test]
    fn expiry_date_parses() {
        let config: SentryConfig = serde_json::from_str(r#"{"expires": "2024-01-31"}"#).unwrap();
        assert_eq!(
            config.expires,
            Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
    }

    #[test]
    fn missing_file_is_its_own_error() {
        let result = SentryConfig::load(Path::new("/definitely/not/here/config.json"));
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }
}
