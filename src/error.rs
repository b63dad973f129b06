//! Classifier error taxonomy.
//!
//! Errors here never terminate the calling service. `InvalidInput` and
//! `Configuration` are surfaced to the caller; `DetectorUnavailable` is
//! handled inside the classifier by disabling the affected sub-detector
//! for that call.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifierError {
    /// Frame or audio data could not be decoded.
    InvalidInput(String),
    /// A sub-detector's backend failed or is not registered.
    DetectorUnavailable {
        detector: &'static str,
        reason: String,
    },
    /// Configuration value out of the allowed range. Rejected at load, not per call.
    Configuration(String),
}

impl ClassifierError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn detector_unavailable(detector: &'static str, reason: impl Into<String>) -> Self {
        Self::DetectorUnavailable {
            detector,
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl std::fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            ClassifierError::DetectorUnavailable { detector, reason } => {
                write!(f, "detector '{}' unavailable: {}", detector, reason)
            }
            ClassifierError::Configuration(msg) => write!(f, "configuration: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detector_name() {
        let err = ClassifierError::detector_unavailable("objects", "backend not registered");
        assert_eq!(
            err.to_string(),
            "detector 'objects' unavailable: backend not registered"
        );
    }
}
