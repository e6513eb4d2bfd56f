use std::path::Path;

use serde::{Deserialize, Serialize};

/// Application settings, read from an optional JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Track loaded on startup.
    pub track: Option<String>,
    /// Gain applied to the main track (effects bypass it).
    pub master_gain: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    pub load_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            track: None,
            master_gain: 0.8,
            pitch_min: 0.8,
            pitch_max: 1.2,
            load_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: Config =
            serde_json::from_str(text).map_err(|e| format!("Invalid config: {e}"))?;
        if config.pitch_min > config.pitch_max {
            return Err(format!(
                "Invalid config: pitch_min {} exceeds pitch_max {}",
                config.pitch_min, config.pitch_max
            ));
        }
        Ok(config)
    }

    /// Clamp a slider value into the configured pitch range.
    pub fn clamp_pitch(&self, pitch: f32) -> f32 {
        pitch.clamp(self.pitch_min, self.pitch_max)
    }
}
