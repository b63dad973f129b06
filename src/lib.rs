//! proctor-kernel: exam-proctoring detection pipeline.
//!
//! The crate ingests webcam frames (plus optional microphone audio), runs a
//! set of independent detectors over each frame, and merges their findings
//! into a per-frame `DetectionResult`: a warnings list, head status, hand
//! count, the prohibited objects seen, and whether the frame qualifies for
//! an evidence screenshot.
//!
//! Layering:
//! - `frame` / `ingest`: frame and audio inputs, frame sources
//! - `detect`: vision backends, the sub-detectors, and the classifier
//! - `session`: caller-owned cross-frame state (debounce, escalation)
//! - `storage` / `evidence`: violation rows and screenshot files
//! - `config`: tunables, config file, env overrides

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use rand::RngCore;

pub mod config;
pub mod detect;
pub mod error;
pub mod evidence;
pub mod frame;
pub mod ingest;
pub mod session;
pub mod storage;

pub use config::{DetectionConfig, DetectorSet, ProctordConfig};
pub use detect::{
    BackendRegistry, CpuBackend, DetectionReport, DetectionResult, FrameClassifier, HeadStatus,
    StubBackend, ViolationKind, VisionBackend, VisionCapability, VisionObservations, Warning,
};
pub use error::ClassifierError;
pub use evidence::{EvidenceFile, EvidenceWriter};
pub use frame::{AudioChunk, FrameInput};
pub use ingest::{open_source, FrameSource, SourceStats, SyntheticSource};
pub use session::{SessionState, Severity};
pub use storage::{
    InMemoryViolationStore, SqliteViolationStore, ViolationRecord, ViolationStore,
};

/// A fresh shared in-memory SQLite URI, for tests and the no-persistence path.
pub fn shared_memory_uri() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!(
        "file:proctor_kernel_{:x}?mode=memory&cache=shared",
        u64::from_le_bytes(bytes)
    )
}

/// Seconds since epoch.
pub fn now_s() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Session ids are local identifiers, enforced against a positive allowlist.
///
/// Allowed: "session:demo", "session:final_exam_2", "session:seat-14"
/// Disallowed: anything with whitespace, slashes, uppercase, or punctuation
/// outside [_-].
pub fn validate_session_id(session_id: &str) -> Result<()> {
    // Compile once for hot paths.
    static SESSION_ID_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re =
        SESSION_ID_RE.get_or_init(|| regex::Regex::new(r"^session:[a-z0-9_-]{1,64}$").unwrap());

    if !re.is_match(session_id) {
        return Err(anyhow!(
            "session_id must match ^session:[a-z0-9_-]{{1,64}}$"
        ));
    }
    Ok(())
}
