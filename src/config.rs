use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::detect::objects::{default_prohibited_classes, is_known_class};
use crate::error::ClassifierError;

/// Documented sensitivity range. Primarily scales the audio threshold.
pub const SENSITIVITY_MIN: u8 = 10;
pub const SENSITIVITY_MAX: u8 = 50;

const DEFAULT_SENSITIVITY: u8 = 30;
const DEFAULT_HEAD_TURN_MARGIN_PX: u32 = 60;
const DEFAULT_HEAD_GRACE_FRAMES: u32 = 3;
const DEFAULT_HAND_GRACE_FRAMES: u32 = 3;

const DEFAULT_DB_PATH: &str = "proctor.db";
const DEFAULT_SCREENSHOT_DIR: &str = "screenshots";
const DEFAULT_SESSION_ID: &str = "session:demo";
const DEFAULT_SOURCE_URL: &str = "stub://webcam";
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_INTERVAL_SECS: u64 = 2;

/// Which sub-detectors run. All on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorSet {
    pub head: bool,
    pub hands: bool,
    pub objects: bool,
    pub audio: bool,
}

impl Default for DetectorSet {
    fn default() -> Self {
        Self {
            head: true,
            hands: true,
            objects: true,
            audio: true,
        }
    }
}

/// Per-call detection configuration. Validated on construction, immutable
/// during a classify call.
#[derive(Clone, Debug)]
pub struct DetectionConfig {
    sensitivity: u8,
    pub enabled: DetectorSet,
    prohibited_classes: Vec<String>,
    /// Head-turn margin in pixels at a 640-wide reference frame.
    pub head_turn_margin_px: u32,
    /// Consecutive non-forward frames tolerated before a head warning.
    pub head_grace_frames: u32,
    /// Consecutive sub-two-hand frames tolerated before a hand warning.
    pub hand_grace_frames: u32,
}

impl DetectionConfig {
    pub fn new(sensitivity: u8) -> Result<Self, ClassifierError> {
        if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&sensitivity) {
            return Err(ClassifierError::configuration(format!(
                "sensitivity {} outside allowed range {}..={}",
                sensitivity, SENSITIVITY_MIN, SENSITIVITY_MAX
            )));
        }
        Ok(Self {
            sensitivity,
            enabled: DetectorSet::default(),
            prohibited_classes: default_prohibited_classes(),
            head_turn_margin_px: DEFAULT_HEAD_TURN_MARGIN_PX,
            head_grace_frames: DEFAULT_HEAD_GRACE_FRAMES,
            hand_grace_frames: DEFAULT_HAND_GRACE_FRAMES,
        })
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    /// Replace the prohibited-class deny list. Every entry must be a known
    /// model class key; an empty list disables object warnings entirely.
    pub fn with_prohibited_classes(
        mut self,
        classes: Vec<String>,
    ) -> Result<Self, ClassifierError> {
        let mut normalized = Vec::with_capacity(classes.len());
        for class in classes {
            let key = class.trim().to_lowercase();
            if !is_known_class(&key) {
                return Err(ClassifierError::configuration(format!(
                    "unknown prohibited class '{}'",
                    class
                )));
            }
            if !normalized.contains(&key) {
                normalized.push(key);
            }
        }
        self.prohibited_classes = normalized;
        Ok(self)
    }

    pub fn with_detectors(mut self, enabled: DetectorSet) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn prohibited_classes(&self) -> &[String] {
        &self.prohibited_classes
    }

    /// Speech-energy threshold. Higher sensitivity lowers the bar.
    pub fn audio_energy_threshold(&self) -> f32 {
        0.5 / self.sensitivity as f32
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            enabled: DetectorSet::default(),
            prohibited_classes: default_prohibited_classes(),
            head_turn_margin_px: DEFAULT_HEAD_TURN_MARGIN_PX,
            head_grace_frames: DEFAULT_HEAD_GRACE_FRAMES,
            hand_grace_frames: DEFAULT_HAND_GRACE_FRAMES,
        }
    }
}

// ---------------------------------------------------------------------------
// Daemon configuration: JSON file + PROCTOR_* env overrides
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct ProctordConfigFile {
    db_path: Option<String>,
    screenshot_dir: Option<String>,
    session_id: Option<String>,
    source: Option<SourceConfigFile>,
    detection: Option<DetectionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    sensitivity: Option<u8>,
    prohibited: Option<Vec<String>>,
    head_grace_frames: Option<u32>,
    hand_grace_frames: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ProctordConfig {
    pub db_path: String,
    pub screenshot_dir: String,
    pub session_id: String,
    pub source: SourceSettings,
    pub sensitivity: u8,
    pub prohibited: Vec<String>,
    pub head_grace_frames: u32,
    pub hand_grace_frames: u32,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Polling cadence; documented at one call every two seconds.
    pub interval_secs: u64,
}

impl ProctordConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PROCTOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ProctordConfigFile) -> Self {
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|source| source.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(DEFAULT_SOURCE_HEIGHT),
            interval_secs: file
                .source
                .as_ref()
                .and_then(|source| source.interval_secs)
                .unwrap_or(DEFAULT_INTERVAL_SECS),
        };
        Self {
            db_path: file.db_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            screenshot_dir: file
                .screenshot_dir
                .unwrap_or_else(|| DEFAULT_SCREENSHOT_DIR.to_string()),
            session_id: file
                .session_id
                .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string()),
            source,
            sensitivity: file
                .detection
                .as_ref()
                .and_then(|detection| detection.sensitivity)
                .unwrap_or(DEFAULT_SENSITIVITY),
            prohibited: file
                .detection
                .as_ref()
                .and_then(|detection| detection.prohibited.clone())
                .unwrap_or_else(default_prohibited_classes),
            head_grace_frames: file
                .detection
                .as_ref()
                .and_then(|detection| detection.head_grace_frames)
                .unwrap_or(DEFAULT_HEAD_GRACE_FRAMES),
            hand_grace_frames: file
                .detection
                .and_then(|detection| detection.hand_grace_frames)
                .unwrap_or(DEFAULT_HAND_GRACE_FRAMES),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("PROCTOR_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
        if let Ok(dir) = std::env::var("PROCTOR_SCREENSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.screenshot_dir = dir;
            }
        }
        if let Ok(session_id) = std::env::var("PROCTOR_SESSION_ID") {
            if !session_id.trim().is_empty() {
                self.session_id = session_id;
            }
        }
        if let Ok(url) = std::env::var("PROCTOR_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(sensitivity) = std::env::var("PROCTOR_SENSITIVITY") {
            self.sensitivity = sensitivity
                .parse()
                .map_err(|_| anyhow!("PROCTOR_SENSITIVITY must be an integer"))?;
        }
        if let Ok(interval) = std::env::var("PROCTOR_INTERVAL_SECS") {
            self.source.interval_secs = interval
                .parse()
                .map_err(|_| anyhow!("PROCTOR_INTERVAL_SECS must be an integer number of seconds"))?;
        }
        if let Ok(prohibited) = std::env::var("PROCTOR_PROHIBITED") {
            let parsed = split_csv(&prohibited);
            if !parsed.is_empty() {
                self.prohibited = parsed;
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        crate::validate_session_id(&self.session_id)?;
        self.session_id = self.session_id.to_lowercase();

        if self.source.interval_secs == 0 {
            return Err(anyhow!("source interval must be greater than zero"));
        }
        if self.screenshot_dir.trim().is_empty() {
            return Err(anyhow!("screenshot_dir must not be empty"));
        }

        // Reject out-of-range sensitivity and unknown classes at load time.
        self.detection_config()?;
        Ok(())
    }

    /// Build the per-call detection configuration.
    pub fn detection_config(&self) -> Result<DetectionConfig> {
        let mut cfg = DetectionConfig::new(self.sensitivity)?
            .with_prohibited_classes(self.prohibited.clone())?;
        cfg.head_grace_frames = self.head_grace_frames;
        cfg.hand_grace_frames = self.hand_grace_frames;
        Ok(cfg)
    }
}

fn read_config_file(path: &Path) -> Result<ProctordConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
