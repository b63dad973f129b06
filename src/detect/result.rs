use serde::{Deserialize, Serialize};

/// Head orientation classified from facial landmarks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadStatus {
    #[default]
    Forward,
    Left,
    Right,
    NotVisible,
}

/// Violation categories. Stored as TEXT in the violation log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    FaceNotVisible,
    HeadTurned,
    HandsMissing,
    ProhibitedObject,
    BackgroundSpeech,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::FaceNotVisible => "face_not_visible",
            ViolationKind::HeadTurned => "head_turned",
            ViolationKind::HandsMissing => "hands_missing",
            ViolationKind::ProhibitedObject => "prohibited_object",
            ViolationKind::BackgroundSpeech => "background_speech",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViolationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face_not_visible" => Ok(ViolationKind::FaceNotVisible),
            "head_turned" => Ok(ViolationKind::HeadTurned),
            "hands_missing" => Ok(ViolationKind::HandsMissing),
            "prohibited_object" => Ok(ViolationKind::ProhibitedObject),
            "background_speech" => Ok(ViolationKind::BackgroundSpeech),
            other => Err(anyhow::anyhow!("unknown violation kind '{}'", other)),
        }
    }
}

/// One violation warning emitted by a sub-detector.
///
/// `evidence` marks warnings that qualify the frame for screenshot capture.
/// The classifier itself performs no I/O; the caller persists the frame when
/// `DetectionResult::screenshot_qualified` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Warning {
    pub kind: ViolationKind,
    pub message: String,
    pub evidence: bool,
}

impl Warning {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            evidence: false,
        }
    }

    pub fn with_evidence(mut self) -> Self {
        self.evidence = true;
        self
    }
}

/// Result of classifying one frame. Produced fresh per call; the caller owns
/// persistence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    /// Warnings in emission order: head, hands, objects, audio.
    pub warnings: Vec<Warning>,
    pub head_status: HeadStatus,
    /// Visible hands, 0..=2.
    pub hand_count: u8,
    /// Display names of detected prohibited classes, deduplicated.
    pub gadgets: Vec<String>,
    /// True when any warning qualifies the frame as evidence.
    pub screenshot_qualified: bool,
}

impl DetectionResult {
    /// Wire form for the service layer. Field names are part of the boundary
    /// contract with the frontend polling endpoint.
    pub fn to_report(&self) -> DetectionReport {
        DetectionReport {
            warnings: self.warnings.iter().map(|w| w.message.clone()).collect(),
            head_status: self.head_status,
            hand_count: self.hand_count,
            gadgets: self.gadgets.clone(),
            screenshot_qualified: self.screenshot_qualified,
        }
    }
}

/// JSON-facing detection report.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DetectionReport {
    pub warnings: Vec<String>,
    pub head_status: HeadStatus,
    pub hand_count: u8,
    pub gadgets: Vec<String>,
    pub screenshot_qualified: bool,
}
