//! proctord - exam proctoring daemon
//!
//! The daemon:
//! 1. Loads configuration (JSON file via PROCTOR_CONFIG plus PROCTOR_* env)
//! 2. Opens the violation store and the evidence directory
//! 3. Polls the configured frame source on the capture interval
//! 4. Classifies each frame and records every warning as a violation row
//! 5. Saves an evidence screenshot when a frame qualifies

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use proctor_kernel::{
    open_source, BackendRegistry, CpuBackend, DetectorSet, EvidenceWriter, FrameClassifier,
    ProctordConfig, SessionState, SqliteViolationStore, ViolationRecord, ViolationStore,
    VisionCapability,
};

#[derive(Parser, Debug)]
#[command(name = "proctord", about = "Exam proctoring daemon", version)]
struct Args {
    /// Session identifier (session:<name>), overriding config and env.
    #[arg(long)]
    session_id: Option<String>,

    /// Frame source URL, overriding config and env.
    #[arg(long)]
    source: Option<String>,

    /// SQLite database path, overriding config and env.
    #[arg(long)]
    db: Option<String>,

    /// Stop after this many frames (for smoke runs). Runs forever by default.
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = ProctordConfig::load()?;
    if let Some(session_id) = args.session_id {
        proctor_kernel::validate_session_id(&session_id)?;
        cfg.session_id = session_id;
    }
    if let Some(source) = args.source {
        cfg.source.url = source;
    }
    if let Some(db) = args.db {
        cfg.db_path = db;
    }

    let mut store = SqliteViolationStore::open(&cfg.db_path)?;
    store.start_session(&cfg.session_id, proctor_kernel::now_s()?)?;

    let mut evidence = EvidenceWriter::new(&cfg.screenshot_dir)?;

    let mut registry = BackendRegistry::new();
    registry.register(CpuBackend::new());

    let mut detection = cfg.detection_config()?;
    if registry
        .backend_for_capability(VisionCapability::ObjectDetection)
        .is_err()
    {
        log::warn!("no object-detection backend registered; objects detector disabled");
        let enabled = detection.enabled;
        detection = detection.with_detectors(DetectorSet {
            objects: false,
            ..enabled
        });
    }
    let classifier = FrameClassifier::new(detection, registry);

    let mut source = open_source(&cfg.source.url, cfg.source.width, cfg.source.height)?;
    source.connect()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })?;
    }

    let mut session = SessionState::new();
    let mut frame_count = 0u64;
    let mut violation_count = 0u64;
    let mut last_health_log = Instant::now();

    log::info!(
        "proctord running: session={} source={} db={} sensitivity={}",
        cfg.session_id,
        cfg.source.url,
        cfg.db_path,
        cfg.sensitivity
    );

    while running.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("frame capture failed: {}", e);
                std::thread::sleep(Duration::from_secs(cfg.source.interval_secs));
                continue;
            }
        };
        frame_count += 1;

        let result = match classifier.classify(&frame, None, &mut session) {
            Ok(result) => result,
            Err(e) => {
                log::warn!("frame {} rejected: {}", frame_count, e);
                continue;
            }
        };

        let screenshot = if result.screenshot_qualified {
            match evidence.save(&frame) {
                Ok(file) => Some(file),
                Err(e) => {
                    log::error!("evidence save failed: {}", e);
                    None
                }
            }
        } else {
            None
        };

        for warning in &result.warnings {
            let severity = session.severity_for(warning.kind);
            let shot = screenshot.as_ref().filter(|_| warning.evidence);
            let record = ViolationRecord {
                session_id: cfg.session_id.clone(),
                kind: warning.kind,
                description: warning.message.clone(),
                screenshot_path: shot.map(|file| file.path.display().to_string()),
                screenshot_sha256: shot.map(|file| file.sha256),
                detected_at: frame.captured_at,
            };
            let row_id = store.record_violation(&record)?;
            violation_count += 1;
            log::warn!(
                "violation #{} [{}] {}: {}",
                row_id,
                severity,
                warning.kind,
                warning.message
            );
        }

        if last_health_log.elapsed() >= Duration::from_secs(30) {
            let stats = source.stats();
            log::info!(
                "source health={} frames={} violations={} url={}",
                source.is_healthy(),
                stats.frames_captured,
                violation_count,
                stats.url
            );
            last_health_log = Instant::now();
        }

        if let Some(max) = args.max_frames {
            if frame_count >= max {
                break;
            }
        }
        std::thread::sleep(Duration::from_secs(cfg.source.interval_secs));
    }

    log::info!(
        "proctord stopping: {} frames processed, {} violations recorded",
        frame_count,
        violation_count
    );
    Ok(())
}
