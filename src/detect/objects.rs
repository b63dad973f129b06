//! Prohibited-object detector.
//!
//! A fixed-class object detector runs over the frame; its labels are matched
//! against the configured prohibited set by case-insensitive substring, the
//! way the deployed class table is keyed. One warning per distinct class,
//! deduplicated within the call.

use crate::detect::backend::ObjectDetection;
use crate::detect::result::{ViolationKind, Warning};

/// Model class key -> operator-facing display name.
pub(crate) const PROHIBITED_CLASSES: &[(&str, &str)] = &[
    ("cell phone", "Mobile Phone"),
    ("laptop", "Laptop Computer"),
    ("keyboard", "External Keyboard"),
    ("tv", "TV/Monitor"),
    ("remote", "Remote Control"),
    ("mouse", "Computer Mouse"),
    ("tablet", "Tablet Device"),
    ("book", "Book/Notes"),
    ("bottle", "Water Bottle"),
    ("cup", "Cup/Mug"),
    ("smartphone", "Smartphone"),
    ("calculator", "Calculator"),
    ("headphones", "Headphones/Earphones"),
    ("microphone", "Microphone"),
    ("camera", "Camera Device"),
    ("watch", "Smart Watch"),
    ("glasses", "Smart Glasses"),
];

/// Every class key the detector understands. The default deny list.
pub fn default_prohibited_classes() -> Vec<String> {
    PROHIBITED_CLASSES
        .iter()
        .map(|(key, _)| key.to_string())
        .collect()
}

pub(crate) fn is_known_class(key: &str) -> bool {
    PROHIBITED_CLASSES.iter().any(|(k, _)| *k == key)
}

/// Match one detected label against the configured deny list.
fn match_prohibited(label: &str, prohibited: &[String]) -> Option<&'static str> {
    let lower = label.to_lowercase();
    for (key, display) in PROHIBITED_CLASSES {
        if lower.contains(key) && prohibited.iter().any(|p| p == key) {
            return Some(display);
        }
    }
    None
}

/// Distinct prohibited display names, in order of first detection.
pub fn detect_prohibited(objects: &[ObjectDetection], prohibited: &[String]) -> Vec<String> {
    let mut gadgets: Vec<String> = Vec::new();
    for object in objects {
        if let Some(display) = match_prohibited(&object.label, prohibited) {
            if !gadgets.iter().any(|g| g == display) {
                gadgets.push(display.to_string());
            }
        }
    }
    gadgets
}

/// One evidence-qualifying warning per distinct detected class.
pub(crate) fn warnings_for(gadgets: &[String]) -> Vec<Warning> {
    gadgets
        .iter()
        .map(|gadget| {
            Warning::new(
                ViolationKind::ProhibitedObject,
                format!("prohibited device: {} - remove immediately", gadget),
            )
            .with_evidence()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn matches_are_case_insensitive_substrings() {
        let prohibited = default_prohibited_classes();
        let gadgets = detect_prohibited(&[object("Cell Phone")], &prohibited);
        assert_eq!(gadgets, vec!["Mobile Phone"]);
    }

    #[test]
    fn duplicates_collapse_to_one_entry() {
        let prohibited = default_prohibited_classes();
        let gadgets = detect_prohibited(
            &[object("cell phone"), object("cell phone"), object("book")],
            &prohibited,
        );
        assert_eq!(gadgets, vec!["Mobile Phone", "Book/Notes"]);
    }

    #[test]
    fn empty_deny_list_never_matches() {
        let gadgets = detect_prohibited(&[object("cell phone"), object("laptop")], &[]);
        assert!(gadgets.is_empty());
    }

    #[test]
    fn allowed_classes_pass_through() {
        let prohibited = vec!["book".to_string()];
        let gadgets = detect_prohibited(&[object("cell phone"), object("book")], &prohibited);
        assert_eq!(gadgets, vec!["Book/Notes"]);
    }

    #[test]
    fn warnings_carry_the_evidence_flag() {
        let warnings = warnings_for(&["Mobile Phone".to_string()]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].evidence);
        assert_eq!(warnings[0].kind, ViolationKind::ProhibitedObject);
        assert!(warnings[0].message.contains("Mobile Phone"));
    }

    #[test]
    fn known_class_lookup() {
        assert!(is_known_class("cell phone"));
        assert!(!is_known_class("banana"));
    }
}
