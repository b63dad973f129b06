use anyhow::Result;

/// Capabilities a vision backend may provide.
///
/// Each sub-detector requests one capability; a backend that lacks it is
/// skipped when selecting a backend for that detector.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisionCapability {
    FaceLandmarks,
    HandPresence,
    ObjectDetection,
}

/// Facial landmarks relevant to head-orientation classification.
///
/// Coordinates are normalized to 0..1 of the frame, landmark-model style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceLandmarks {
    pub nose_x: f32,
    pub nose_y: f32,
}

/// One detected hand. Position is the palm center, normalized 0..1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandMark {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// One detected object with its model label and normalized bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDetection {
    pub label: String,
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Everything a backend observed in one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisionObservations {
    pub face: Option<FaceLandmarks>,
    pub hands: Vec<HandMark>,
    pub objects: Vec<ObjectDetection>,
}

impl VisionObservations {
    /// A compliant scene: face centered and forward, both hands visible,
    /// nothing on the desk. Used by tests and the stub backend fallback.
    pub fn clean_scene() -> Self {
        Self {
            face: Some(FaceLandmarks {
                nose_x: 0.5,
                nose_y: 0.4,
            }),
            hands: vec![
                HandMark {
                    x: 0.25,
                    y: 0.85,
                    confidence: 0.9,
                },
                HandMark {
                    x: 0.75,
                    y: 0.85,
                    confidence: 0.9,
                },
            ],
            objects: vec![],
        }
    }
}

/// Vision model backend.
///
/// Backends are explicit, injected handles: the classifier receives a
/// registry of them rather than reaching for module-level singletons.
/// Implementations must treat the pixel slice as read-only and ephemeral
/// and must not perform I/O during `observe`.
pub trait VisionBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the backend supports a capability.
    fn supports(&self, capability: VisionCapability) -> bool;

    /// Run inference on one frame.
    fn observe(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<VisionObservations>;

    /// Optional warm-up hook (model load, first-inference cost).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
