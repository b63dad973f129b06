//! The frame classifier.
//!
//! One call ingests one frame (plus optional audio) and produces a
//! `DetectionResult`. Sub-detectors are independent and merged with OR
//! semantics: any detector firing appends to the warnings list, and none
//! suppresses another. A failing sub-detector contributes nothing and never
//! aborts the call.

use std::collections::HashMap;

use crate::config::DetectionConfig;
use crate::detect::backend::{VisionCapability, VisionObservations};
use crate::detect::registry::BackendRegistry;
use crate::detect::result::DetectionResult;
use crate::detect::{audio, hands, head, objects};
use crate::error::ClassifierError;
use crate::frame::{AudioChunk, FrameInput};
use crate::session::SessionState;

pub struct FrameClassifier {
    config: DetectionConfig,
    registry: BackendRegistry,
}

impl FrameClassifier {
    pub fn new(config: DetectionConfig, registry: BackendRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Decode encoded image bytes and classify. Undecodable bytes yield
    /// `ClassifierError::InvalidInput` without touching the session state.
    pub fn classify_encoded(
        &self,
        bytes: &[u8],
        captured_at: u64,
        audio: Option<&AudioChunk>,
        session: &mut SessionState,
    ) -> Result<DetectionResult, ClassifierError> {
        let frame = FrameInput::from_encoded(bytes, captured_at)?;
        self.classify(&frame, audio, session)
    }

    /// Classify one decoded frame.
    ///
    /// The result is a pure function of frame + audio + config + session
    /// state; the classifier itself holds nothing across calls.
    pub fn classify(
        &self,
        frame: &FrameInput,
        audio_chunk: Option<&AudioChunk>,
        session: &mut SessionState,
    ) -> Result<DetectionResult, ClassifierError> {
        let mut result = DetectionResult::default();
        let enabled = self.config.enabled;

        // One observe call per distinct backend, shared across the vision
        // sub-detectors that selected it.
        let mut observed: HashMap<&'static str, VisionObservations> = HashMap::new();

        if enabled.head {
            match self.observe_cached(VisionCapability::FaceLandmarks, frame, &mut observed) {
                Ok(obs) => {
                    result.head_status = head::classify_head(
                        obs.face.as_ref(),
                        frame.width,
                        self.config.head_turn_margin_px,
                    );
                    if let Some(warning) =
                        head::evaluate(result.head_status, session, self.config.head_grace_frames)
                    {
                        result.warnings.push(warning);
                    }
                }
                Err(err) => log::warn!("{}", err),
            }
        }

        if enabled.hands {
            match self.observe_cached(VisionCapability::HandPresence, frame, &mut observed) {
                Ok(obs) => {
                    result.hand_count = hands::count_hands(&obs.hands);
                    if let Some(warning) = hands::evaluate(
                        result.hand_count,
                        session,
                        self.config.hand_grace_frames,
                    ) {
                        result.warnings.push(warning);
                    }
                }
                Err(err) => {
                    // A hand count of 0 means observed zero hands; a failed
                    // detector reports the compliant count instead.
                    result.hand_count = 2;
                    log::warn!("{}", err);
                }
            }
        }

        if enabled.objects {
            match self.observe_cached(VisionCapability::ObjectDetection, frame, &mut observed) {
                Ok(obs) => {
                    result.gadgets =
                        objects::detect_prohibited(&obs.objects, self.config.prohibited_classes());
                    result.warnings.extend(objects::warnings_for(&result.gadgets));
                }
                Err(err) => log::warn!("{}", err),
            }
        }

        if enabled.audio {
            if let Some(chunk) = audio_chunk {
                if let Some(warning) =
                    audio::evaluate(chunk, self.config.audio_energy_threshold())
                {
                    result.warnings.push(warning);
                }
            }
        }

        result.screenshot_qualified = result.warnings.iter().any(|warning| warning.evidence);
        session.note_violations(&result.warnings);
        Ok(result)
    }

    /// Resolve a backend for the capability and run it, caching observations
    /// by backend name so one frame is inspected at most once per backend.
    fn observe_cached(
        &self,
        capability: VisionCapability,
        frame: &FrameInput,
        observed: &mut HashMap<&'static str, VisionObservations>,
    ) -> Result<VisionObservations, ClassifierError> {
        let detector = detector_name(capability);
        let backend = self
            .registry
            .backend_for_capability(capability)
            .map_err(|e| ClassifierError::detector_unavailable(detector, e.to_string()))?;
        let mut guard = backend
            .lock()
            .map_err(|_| ClassifierError::detector_unavailable(detector, "backend lock poisoned"))?;

        let name = guard.name();
        if let Some(cached) = observed.get(name) {
            return Ok(cached.clone());
        }

        let observations = guard
            .observe(frame.pixels(), frame.width, frame.height)
            .map_err(|e| ClassifierError::detector_unavailable(detector, e.to_string()))?;
        observed.insert(name, observations.clone());
        Ok(observations)
    }
}

fn detector_name(capability: VisionCapability) -> &'static str {
    match capability {
        VisionCapability::FaceLandmarks => "head",
        VisionCapability::HandPresence => "hands",
        VisionCapability::ObjectDetection => "objects",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backend::{FaceLandmarks, ObjectDetection};
    use crate::detect::backends::StubBackend;
    use crate::detect::result::{HeadStatus, ViolationKind};

    fn classifier_with(scene: VisionObservations, config: DetectionConfig) -> FrameClassifier {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new().with_fallback(scene));
        FrameClassifier::new(config, registry)
    }

    fn frame() -> FrameInput {
        FrameInput::from_rgb(vec![0u8; 640 * 480 * 3], 640, 480, 1_000).unwrap()
    }

    fn object(label: &str) -> ObjectDetection {
        ObjectDetection {
            label: label.to_string(),
            confidence: 0.9,
            x: 0.1,
            y: 0.1,
            w: 0.2,
            h: 0.2,
        }
    }

    fn zero_grace() -> DetectionConfig {
        let mut config = DetectionConfig::default();
        config.head_grace_frames = 0;
        config.hand_grace_frames = 0;
        config
    }

    #[test]
    fn clean_scene_yields_empty_warnings() {
        let classifier =
            classifier_with(VisionObservations::clean_scene(), DetectionConfig::default());
        let mut session = SessionState::new();

        let result = classifier.classify(&frame(), None, &mut session).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(result.head_status, HeadStatus::Forward);
        assert_eq!(result.hand_count, 2);
        assert!(result.gadgets.is_empty());
        assert!(!result.screenshot_qualified);
    }

    #[test]
    fn identical_inputs_produce_identical_results() {
        let config = zero_grace();
        let mut scene = VisionObservations::clean_scene();
        scene.objects.push(object("cell phone"));

        let classifier_a = classifier_with(scene.clone(), config.clone());
        let classifier_b = classifier_with(scene, config);
        let mut session_a = SessionState::new();
        let mut session_b = SessionState::new();

        let a = classifier_a.classify(&frame(), None, &mut session_a).unwrap();
        let b = classifier_b.classify(&frame(), None, &mut session_b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn prohibited_objects_qualify_the_screenshot() {
        let mut scene = VisionObservations::clean_scene();
        scene.objects.push(object("cell phone"));
        scene.objects.push(object("cell phone"));
        scene.objects.push(object("book"));

        let classifier = classifier_with(scene, DetectionConfig::default());
        let mut session = SessionState::new();

        let result = classifier.classify(&frame(), None, &mut session).unwrap();

        assert_eq!(result.gadgets, vec!["Mobile Phone", "Book/Notes"]);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings.iter().all(|w| w.evidence));
        assert!(result.screenshot_qualified);
    }

    #[test]
    fn empty_prohibited_set_never_warns_on_objects() {
        let mut scene = VisionObservations::clean_scene();
        scene.objects.push(object("cell phone"));

        let config = DetectionConfig::default()
            .with_prohibited_classes(vec![])
            .unwrap();
        let classifier = classifier_with(scene, config);
        let mut session = SessionState::new();

        let result = classifier.classify(&frame(), None, &mut session).unwrap();
        assert!(result.warnings.is_empty());
        assert!(result.gadgets.is_empty());
    }

    #[test]
    fn failing_backend_is_isolated_and_audio_still_runs() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::failing());
        let classifier = FrameClassifier::new(zero_grace(), registry);
        let mut session = SessionState::new();

        let loud: Vec<f32> = (0..1024)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 1_000.0 * i as f32 / 16_000.0).sin())
            .collect();
        let chunk = AudioChunk::new(loud, 16_000).unwrap();

        let result = classifier
            .classify(&frame(), Some(&chunk), &mut session)
            .unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, ViolationKind::BackgroundSpeech);
    }

    #[test]
    fn failing_hands_backend_does_not_read_as_an_empty_desk() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::failing());
        let classifier = FrameClassifier::new(zero_grace(), registry);
        let mut session = SessionState::new();

        let result = classifier.classify(&frame(), None, &mut session).unwrap();

        assert_eq!(result.hand_count, 2);
        assert!(result
            .warnings
            .iter()
            .all(|w| w.kind != ViolationKind::HandsMissing));
    }

    #[test]
    fn missing_audio_skips_the_audio_detector() {
        let classifier =
            classifier_with(VisionObservations::clean_scene(), DetectionConfig::default());
        let mut session = SessionState::new();

        let result = classifier.classify(&frame(), None, &mut session).unwrap();
        assert!(result
            .warnings
            .iter()
            .all(|w| w.kind != ViolationKind::BackgroundSpeech));
    }

    #[test]
    fn quiet_audio_stays_silent() {
        let classifier =
            classifier_with(VisionObservations::clean_scene(), DetectionConfig::default());
        let mut session = SessionState::new();

        let chunk = AudioChunk::new(vec![0.001; 1024], 16_000).unwrap();
        let result = classifier
            .classify(&frame(), Some(&chunk), &mut session)
            .unwrap();
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn head_turn_debounces_then_warns() {
        let mut scene = VisionObservations::clean_scene();
        scene.face = Some(FaceLandmarks {
            nose_x: 0.1,
            nose_y: 0.4,
        });
        let mut config = DetectionConfig::default();
        config.head_grace_frames = 1;
        config.hand_grace_frames = 10;

        let classifier = classifier_with(scene, config);
        let mut session = SessionState::new();

        let first = classifier.classify(&frame(), None, &mut session).unwrap();
        assert_eq!(first.head_status, HeadStatus::Left);
        assert!(first.warnings.is_empty());

        let second = classifier.classify(&frame(), None, &mut session).unwrap();
        assert_eq!(second.warnings.len(), 1);
        assert_eq!(second.warnings[0].kind, ViolationKind::HeadTurned);
    }

    #[test]
    fn undecodable_bytes_are_invalid_input() {
        let classifier =
            classifier_with(VisionObservations::clean_scene(), DetectionConfig::default());
        let mut session = SessionState::new();

        let err = classifier
            .classify_encoded(b"garbage", 0, None, &mut session)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidInput(_)));
    }

    #[test]
    fn no_face_sets_not_visible_and_warns() {
        let mut scene = VisionObservations::clean_scene();
        scene.face = None;

        let classifier = classifier_with(scene, DetectionConfig::default());
        let mut session = SessionState::new();

        let result = classifier.classify(&frame(), None, &mut session).unwrap();
        assert_eq!(result.head_status, HeadStatus::NotVisible);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, ViolationKind::FaceNotVisible);
    }
}
