use anyhow::{Context, Result};
use moodcam_vision::AnalyzerOptions;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("MOODCAM_CONFIG_PATH").unwrap_or("/usr/local/etc/moodcam/config.toml"))
});

pub static MODEL_DIR: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("MOODCAM_MODEL_DIR").unwrap_or("/usr/local/share/moodcam"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: String,
    pub bind: String,
    pub detector_model: PathBuf,
    pub emotion_model: PathBuf,
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub enforce_detection: bool,
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: "/dev/video0".to_string(),
            bind: "0.0.0.0:8080".to_string(),
            detector_model: MODEL_DIR.join("face_detection_yunet_2023mar.onnx"),
            emotion_model: MODEL_DIR.join("emotion_fer7.onnx"),
            score_threshold: 0.6,
            nms_threshold: 0.3,
            enforce_detection: false,
            jpeg_quality: 80,
        }
    }
}

impl Config {
    pub fn analyzer_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            detector_model: self.detector_model.clone(),
            emotion_model: self.emotion_model.clone(),
            score_threshold: self.score_threshold,
            nms_threshold: self.nms_threshold,
            enforce_detection: self.enforce_detection,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
