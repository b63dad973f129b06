//! Frame and audio inputs.
//!
//! `FrameInput` is one decoded RGB frame with its capture timestamp.
//! `AudioChunk` is the optional microphone buffer captured alongside it.
//! Both are plain values: the classifier never retains them across calls.

use image::ImageReader;
use std::io::Cursor;

use crate::error::ClassifierError;

/// One decoded video frame, RGB24.
#[derive(Clone, Debug)]
pub struct FrameInput {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture time, seconds since epoch.
    pub captured_at: u64,
}

impl FrameInput {
    /// Decode an encoded image (JPEG/PNG) into a frame.
    ///
    /// Undecodable bytes yield `ClassifierError::InvalidInput`, never a panic.
    pub fn from_encoded(bytes: &[u8], captured_at: u64) -> Result<Self, ClassifierError> {
        let decoded = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ClassifierError::invalid_input(format!("unreadable image: {}", e)))?
            .decode()
            .map_err(|e| ClassifierError::invalid_input(format!("undecodable image: {}", e)))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self {
            pixels: rgb.into_raw(),
            width,
            height,
            captured_at,
        })
    }

    /// Wrap raw RGB24 pixels. Length must match the dimensions.
    pub fn from_rgb(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        captured_at: u64,
    ) -> Result<Self, ClassifierError> {
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| ClassifierError::invalid_input("frame dimensions overflow"))?
            as usize;
        if pixels.len() != expected {
            return Err(ClassifierError::invalid_input(format!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                pixels.len()
            )));
        }
        if width == 0 || height == 0 {
            return Err(ClassifierError::invalid_input("empty frame"));
        }
        Ok(Self {
            pixels,
            width,
            height,
            captured_at,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Mono PCM audio captured alongside a frame. Samples are in [-1, 1].
#[derive(Clone, Debug)]
pub struct AudioChunk {
    samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, ClassifierError> {
        if samples.is_empty() {
            return Err(ClassifierError::invalid_input("empty audio buffer"));
        }
        if sample_rate == 0 {
            return Err(ClassifierError::invalid_input("audio sample rate is zero"));
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(ClassifierError::invalid_input(
                "audio buffer contains non-finite samples",
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}
