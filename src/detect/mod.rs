pub(crate) mod audio;
mod backend;
mod backends;
mod classifier;
pub(crate) mod hands;
pub(crate) mod head;
pub(crate) mod objects;
mod registry;
mod result;

pub use audio::speech_band_energy;
pub use backend::{
    FaceLandmarks, HandMark, ObjectDetection, VisionBackend, VisionCapability, VisionObservations,
};
pub use backends::{CpuBackend, StubBackend};
pub use classifier::FrameClassifier;
pub use hands::count_hands;
pub use head::classify_head;
pub use objects::{default_prohibited_classes, detect_prohibited};
pub use registry::BackendRegistry;
pub use result::{DetectionReport, DetectionResult, HeadStatus, ViolationKind, Warning};
