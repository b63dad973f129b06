//! Hand-presence detector.
//!
//! Exam rules require both hands visible on the desk. Fewer than two hands
//! becomes a warning only after the shortfall persists past the grace
//! period, so natural hand movement does not flag.

use crate::detect::backend::HandMark;
use crate::detect::result::{ViolationKind, Warning};
use crate::session::SessionState;

/// Count visible hands, clamped to the 0..=2 contract range.
pub fn count_hands(hands: &[HandMark]) -> u8 {
    hands.len().min(2) as u8
}

/// At most one warning per call, after the grace period.
pub(crate) fn evaluate(
    hand_count: u8,
    session: &mut SessionState,
    grace_frames: u32,
) -> Option<Warning> {
    if hand_count >= 2 {
        session.reset_hands_missing();
        return None;
    }

    let streak = session.bump_hands_missing();
    if streak <= grace_frames {
        return None;
    }

    let message = if hand_count == 0 {
        "no hands visible - keep both hands on the desk"
    } else {
        "only one hand visible - show both hands on the desk"
    };
    Some(Warning::new(ViolationKind::HandsMissing, message))
}
