//! Evidence capture.
//!
//! When a result is screenshot-qualified the caller hands the frame here.
//! The writer encodes it as JPEG under the screenshots directory and returns
//! the path together with a SHA-256 digest of the written bytes, so the
//! violation row can pin the exact file contents.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use sha2::{Digest, Sha256};

use crate::frame::FrameInput;

const JPEG_QUALITY: u8 = 85;

#[derive(Clone, Debug)]
pub struct EvidenceFile {
    pub path: PathBuf,
    pub sha256: [u8; 32],
}

pub struct EvidenceWriter {
    dir: PathBuf,
    /// Distinguishes multiple captures within the same second.
    seq: u64,
}

impl EvidenceWriter {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create screenshot dir {}", dir.display()))?;
        Ok(Self { dir, seq: 0 })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encode and persist one frame. Returns the written path and digest.
    pub fn save(&mut self, frame: &FrameInput) -> Result<EvidenceFile> {
        self.seq += 1;
        let filename = format!("violation_{}_{:04}.jpg", frame.captured_at, self.seq);
        let path = self.dir.join(filename);

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY)
            .encode(
                frame.pixels(),
                frame.width,
                frame.height,
                ExtendedColorType::Rgb8,
            )
            .context("encode evidence JPEG")?;

        std::fs::write(&path, &encoded)
            .with_context(|| format!("write evidence file {}", path.display()))?;

        let sha256: [u8; 32] = Sha256::digest(&encoded).into();
        log::info!("evidence saved at {}", path.display());
        Ok(EvidenceFile { path, sha256 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FrameInput {
        FrameInput::from_rgb(vec![100u8; 16 * 8 * 3], 16, 8, 1_700_000_000).unwrap()
    }

    #[test]
    fn saves_decodable_jpeg_with_matching_digest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = EvidenceWriter::new(dir.path())?;

        let evidence = writer.save(&frame())?;
        let bytes = std::fs::read(&evidence.path)?;
        let digest: [u8; 32] = Sha256::digest(&bytes).into();
        assert_eq!(digest, evidence.sha256);

        let decoded = image::load_from_memory(&bytes)?;
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 8);
        Ok(())
    }

    #[test]
    fn sequential_saves_get_distinct_paths() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut writer = EvidenceWriter::new(dir.path())?;

        let first = writer.save(&frame())?;
        let second = writer.save(&frame())?;
        assert_ne!(first.path, second.path);
        Ok(())
    }
}
