//! Frame sources.
//!
//! `FrameSource` abstracts where frames come from. The only built-in source
//! is the synthetic one behind `stub://` URLs, which paints scenes the CPU
//! backend can read. Real capture devices plug in behind the same trait.

use anyhow::{bail, Result};

use crate::frame::FrameInput;

/// Per-source counters, surfaced in the daemon's health log line.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

pub trait FrameSource {
    fn connect(&mut self) -> Result<()>;
    fn next_frame(&mut self) -> Result<FrameInput>;
    fn is_healthy(&self) -> bool;
    fn stats(&self) -> SourceStats;
}

/// Build a source from a URL. Only `stub://` is supported in this build.
pub fn open_source(url: &str, width: u32, height: u32) -> Result<Box<dyn FrameSource>> {
    if url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(url, width, height)));
    }
    bail!("unsupported frame source url: {} (expected stub://...)", url)
}

/// How often the synthetic scene cycles between its states.
const SCENE_PERIOD: u64 = 10;

/// Synthetic webcam.
///
/// Paints a dark background with a bright face blob in the upper center and
/// bright hand blobs in the lower quadrants. The scene cycles so downstream
/// detectors see something other than a permanently clean desk: one phase
/// drops the hands, another drops the face.
pub struct SyntheticSource {
    url: String,
    width: u32,
    height: u32,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticSource {
    pub fn new(url: &str, width: u32, height: u32) -> Self {
        Self {
            url: url.to_string(),
            width,
            height,
            frame_count: 0,
            scene_state: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("frame source connected to {} (synthetic)", self.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<FrameInput> {
        self.frame_count += 1;
        if self.frame_count % SCENE_PERIOD == 0 {
            self.scene_state = (self.scene_state + 1) % 3;
        }

        let pixels = self.paint_scene();
        let captured_at = crate::now_s()?;
        Ok(FrameInput::from_rgb(
            pixels,
            self.width,
            self.height,
            captured_at,
        )?)
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.url.clone(),
        }
    }
}

impl SyntheticSource {
    fn paint_scene(&self) -> Vec<u8> {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut pixels = vec![12u8; w * h * 3];

        // state 0: face + both hands; state 1: hands gone; state 2: face gone
        if self.scene_state != 2 {
            fill(&mut pixels, w, w / 3, (w * 2) / 3, 0, (h * 3) / 8);
        }
        if self.scene_state != 1 {
            fill(&mut pixels, w, w / 8, w * 3 / 8, (h * 3) / 4, h - h / 16);
            fill(&mut pixels, w, (w * 5) / 8, (w * 7) / 8, (h * 3) / 4, h - h / 16);
        }
        pixels
    }
}

fn fill(pixels: &mut [u8], row_width: usize, x0: usize, x1: usize, y0: usize, y1: usize) {
    for y in y0..y1 {
        for x in x0..x1 {
            let offset = (y * row_width + x) * 3;
            pixels[offset] = 210;
            pixels[offset + 1] = 200;
            pixels[offset + 2] = 190;
        }
    }
}
