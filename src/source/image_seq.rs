use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::frame::RgbFrame;
use crate::video::VideoSource;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Frame source over a directory of image files, read in name order.
///
/// Stands in for a container-format decoder: each file is one frame. A
/// file that fails to decode is a transient read error; the cursor still
/// advances, so the next read attempts the next file.
pub struct ImageSequenceSource {
    name: String,
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceSource {
    /// Scan `dir` for image files. Fails when the directory cannot be
    /// read or holds no images.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to open image directory {}", dir.display()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(anyhow!("no image files in {}", dir.display()));
        }

        log::info!(
            "image sequence source: {} frames under {}",
            files.len(),
            dir.display()
        );
        Ok(Self {
            name: dir.display().to_string(),
            files,
            cursor: 0,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.files.len()
    }
}

impl VideoSource for ImageSequenceSource {
    fn describe(&self) -> &str {
        &self.name
    }

    fn read_frame(&mut self) -> Result<Option<RgbFrame>> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        Ok(Some(RgbFrame::from_image(image.to_rgb8())))
    }
}

impl Drop for ImageSequenceSource {
    fn drop(&mut self) {
        log::debug!("image sequence source {} released", self.name);
    }
}
