use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::{VisionBackend, VisionCapability, VisionObservations};

/// Stub backend for testing. Plays back scripted observations.
///
/// Scripted frames are consumed in order; once the script is exhausted, the
/// fallback observation (a clean scene unless overridden) repeats forever.
pub struct StubBackend {
    script: VecDeque<VisionObservations>,
    fallback: VisionObservations,
    fail: bool,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: VisionObservations::clean_scene(),
            fail: false,
        }
    }

    pub fn with_fallback(mut self, fallback: VisionObservations) -> Self {
        self.fallback = fallback;
        self
    }

    /// Queue one scripted frame.
    pub fn push_frame(&mut self, observations: VisionObservations) {
        self.script.push_back(observations);
    }

    /// Make every `observe` call fail, to exercise detector isolation.
    pub fn failing() -> Self {
        Self {
            script: VecDeque::new(),
            fallback: VisionObservations::default(),
            fail: true,
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VisionBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, _capability: VisionCapability) -> bool {
        true
    }

    fn observe(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<VisionObservations> {
        if self.fail {
            anyhow::bail!("stub backend scripted failure");
        }
        Ok(self.script.pop_front().unwrap_or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_then_fallback() {
        let mut backend = StubBackend::new().with_fallback(VisionObservations::default());
        backend.push_frame(VisionObservations::clean_scene());

        let first = backend.observe(&[], 0, 0).unwrap();
        assert!(first.face.is_some());

        let second = backend.observe(&[], 0, 0).unwrap();
        assert!(second.face.is_none());
    }

    #[test]
    fn failing_stub_errors() {
        let mut backend = StubBackend::failing();
        assert!(backend.observe(&[], 0, 0).is_err());
    }
}
