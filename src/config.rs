/// Viewer configuration
///
/// Read once at startup from the JSON file named by `RAW_VIEWER_CONFIG`.
/// Every field has a default, so a partial file (or none at all) is fine.
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use iced_wgpu::wgpu;

/// Environment variable holding the config file path
pub const CONFIG_ENV: &str = "RAW_VIEWER_CONFIG";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GpuPower {
    Low,
    #[default]
    High,
}

impl From<GpuPower> for wgpu::PowerPreference {
    fn from(power: GpuPower) -> Self {
        match power {
            GpuPower::Low => wgpu::PowerPreference::LowPower,
            GpuPower::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Sensor defaults used when rendering a mosaic
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    /// Sample value of pure black
    pub black_level: u32,
    /// Sample value of clipped white
    pub white_level: u32,
    /// Offset of the red photosite within the 2x2 pattern
    pub cfa_phase: (u32, u32),
    /// Sensor samples are stored little-endian
    pub little_endian: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            black_level: 1024,
            white_level: 16383,
            cfa_phase: (0, 0),
            little_endian: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub gpu_power: GpuPower,
    pub sensor: SensorConfig,
    /// Compute a histogram for each displayed image
    pub histogram: bool,
    /// Completed GPU results kept per cache
    pub result_cache_size: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            gpu_power: GpuPower::default(),
            sensor: SensorConfig::default(),
            histogram: true,
            result_cache_size: 32,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from a JSON file
    pub fn load_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&text)?)
    }

    /// Load from `RAW_VIEWER_CONFIG`, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        let path = Path::new(&path);
        match Self::load_file(path) {
            Ok(config) => {
                info!("⚙️  Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ViewerConfig::from_json(r#"{"gpu_power": "low", "sensor": {"black_level": 512}}"#)
            .unwrap();
        assert_eq!(config.gpu_power, GpuPower::Low);
        assert_eq!(config.sensor.black_level, 512);
        assert_eq!(config.sensor.white_level, 16383);
        assert!(config.histogram);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{"histogram": false}"#).unwrap();

        let config = ViewerConfig::load_file(&path).unwrap();
        assert!(!config.histogram);
        assert_eq!(config.result_cache_size, 32);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(ViewerConfig::load_file(Path::new("/nonexistent/viewer.json")).is_err());
    }
}
