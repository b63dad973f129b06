//! Head-orientation detector.
//!
//! Orientation comes from the nose landmark's horizontal position relative
//! to frame center: outside a margin band the head reads as turned. The
//! margin is expressed in pixels at a 640-wide reference frame and scaled
//! proportionally to the actual width.
//!
//! A turned head only becomes a warning after it persists for the configured
//! number of consecutive frames; momentary glances are suppressed. Face
//! absence warns immediately.

use crate::detect::backend::FaceLandmarks;
use crate::detect::result::{HeadStatus, ViolationKind, Warning};
use crate::session::SessionState;

/// Width the head-turn margin is calibrated against.
pub(crate) const REFERENCE_WIDTH: f32 = 640.0;

/// Classify head orientation from the (optional) face landmarks.
pub fn classify_head(
    face: Option<&FaceLandmarks>,
    frame_width: u32,
    margin_px: u32,
) -> HeadStatus {
    let Some(face) = face else {
        return HeadStatus::NotVisible;
    };

    let width = frame_width as f32;
    let nose_x = face.nose_x * width;
    let center = width / 2.0;
    let margin = margin_px as f32 * width / REFERENCE_WIDTH;

    if nose_x < center - margin {
        HeadStatus::Left
    } else if nose_x > center + margin {
        HeadStatus::Right
    } else {
        HeadStatus::Forward
    }
}

/// Turn an orientation into at most one warning, applying the debounce
/// counter owned by the session.
pub(crate) fn evaluate(
    status: HeadStatus,
    session: &mut SessionState,
    grace_frames: u32,
) -> Option<Warning> {
    match status {
        HeadStatus::NotVisible => {
            session.reset_head_away();
            Some(Warning::new(
                ViolationKind::FaceNotVisible,
                "face not visible - position yourself in the camera view",
            ))
        }
        HeadStatus::Forward => {
            session.reset_head_away();
            None
        }
        HeadStatus::Left | HeadStatus::Right => {
            let streak = session.bump_head_away();
            if streak <= grace_frames {
                return None;
            }
            let direction = if status == HeadStatus::Left {
                "left"
            } else {
                "right"
            };
            Some(Warning::new(
                ViolationKind::HeadTurned,
                format!("head turned {} - look straight at the camera", direction),
            ))
        }
    }
}
