use anyhow::{anyhow, Result};

use crate::detect::backend::{
    FaceLandmarks, HandMark, VisionBackend, VisionCapability, VisionObservations,
};

/// Luma level below which a region is considered empty.
const PRESENCE_LUMA: f32 = 60.0;

/// CPU backend: deterministic luma-region heuristics.
///
/// No model files, no external runtime. A bright region in the upper center
/// of the frame reads as a face (nose at the luma centroid); bright regions
/// in the lower left/right quadrants read as hands. Object detection is not
/// supported; that capability needs a real model backend.
///
/// Good enough for the synthetic source and smoke tests; not a substitute
/// for a landmark model on real webcam frames.
#[derive(Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisionBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn supports(&self, capability: VisionCapability) -> bool {
        matches!(
            capability,
            VisionCapability::FaceLandmarks | VisionCapability::HandPresence
        )
    }

    fn observe(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<VisionObservations> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                pixels.len()
            ));
        }

        let w = width as usize;
        let h = height as usize;

        let face = region_centroid(pixels, w, w / 4, (w * 3) / 4, 0, h / 2).map(|(cx, cy)| {
            FaceLandmarks {
                nose_x: cx / width as f32,
                nose_y: cy / height as f32,
            }
        });

        let mut hands = Vec::new();
        for (x0, x1) in [(0, w / 2), (w / 2, w)] {
            if let Some((cx, cy)) = region_centroid(pixels, w, x0, x1, (h * 2) / 3, h) {
                hands.push(HandMark {
                    x: cx / width as f32,
                    y: cy / height as f32,
                    confidence: 0.8,
                });
            }
        }

        Ok(VisionObservations {
            face,
            hands,
            objects: vec![],
        })
    }
}

/// Luma-weighted centroid of a pixel region, or None when the region's mean
/// luma is below the presence threshold.
fn region_centroid(
    pixels: &[u8],
    row_width: usize,
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
) -> Option<(f32, f32)> {
    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let mut total = 0.0f64;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    for y in y0..y1 {
        for x in x0..x1 {
            let offset = (y * row_width + x) * 3;
            let r = pixels[offset] as f32;
            let g = pixels[offset + 1] as f32;
            let b = pixels[offset + 2] as f32;
            let luma = (0.299 * r + 0.587 * g + 0.114 * b) as f64;
            total += luma;
            sum_x += luma * x as f64;
            sum_y += luma * y as f64;
        }
    }

    let area = ((x1 - x0) * (y1 - y0)) as f64;
    let mean = total / area;
    if mean < PRESENCE_LUMA as f64 {
        return None;
    }
    Some(((sum_x / total) as f32, (sum_y / total) as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dark_frame(w: u32, h: u32) -> Vec<u8> {
        vec![10u8; (w * h * 3) as usize]
    }

    fn fill_region(pixels: &mut [u8], row_width: usize, x0: usize, x1: usize, y0: usize, y1: usize) {
        for y in y0..y1 {
            for x in x0..x1 {
                let offset = (y * row_width + x) * 3;
                pixels[offset] = 220;
                pixels[offset + 1] = 220;
                pixels[offset + 2] = 220;
            }
        }
    }

    #[test]
    fn dark_frame_has_no_face_or_hands() {
        let mut backend = CpuBackend::new();
        let obs = backend.observe(&dark_frame(60, 60), 60, 60).unwrap();
        assert!(obs.face.is_none());
        assert!(obs.hands.is_empty());
    }

    #[test]
    fn bright_regions_read_as_face_and_hands() {
        let (w, h) = (60usize, 60usize);
        let mut pixels = dark_frame(w as u32, h as u32);
        // Face blob upper center, hand blobs in both lower quadrants.
        fill_region(&mut pixels, w, 20, 40, 5, 25);
        fill_region(&mut pixels, w, 2, 28, 42, 58);
        fill_region(&mut pixels, w, 32, 58, 42, 58);

        let mut backend = CpuBackend::new();
        let obs = backend.observe(&pixels, w as u32, h as u32).unwrap();

        let face = obs.face.expect("face present");
        assert!((face.nose_x - 0.5).abs() < 0.1);
        assert_eq!(obs.hands.len(), 2);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let mut backend = CpuBackend::new();
        assert!(backend.observe(&[0u8; 10], 60, 60).is_err());
    }

    #[test]
    fn does_not_claim_object_detection() {
        let backend = CpuBackend::new();
        assert!(backend.supports(VisionCapability::FaceLandmarks));
        assert!(!backend.supports(VisionCapability::ObjectDetection));
    }
}
