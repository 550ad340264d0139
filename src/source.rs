use crate::error::Result;
use image::RgbImage;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// A color frame, three 8-bit channels per pixel.
pub type Frame = RgbImage;

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "bmp", "jpg", "jpeg", "gif", "tga", "pnm", "ppm"];

/// Supplies frames in time order.
pub trait FrameSource {
    /// `None` once the sequence is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Frames per second if the source knows it.
    fn frame_rate(&self) -> Option<u32> {
        None
    }
}

/// Frames already held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<Frame>,
    frame_rate: Option<u32>,
}

impl MemorySource {
    pub fn new<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        MemorySource {
            frames: frames.into_iter().collect(),
            frame_rate: None,
        }
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn frame_rate(&self) -> Option<u32> {
        self.frame_rate
    }
}

/// Still images on disk, one file per frame.
#[derive(Debug)]
pub struct ImageSequence {
    paths: VecDeque<PathBuf>,
}

impl ImageSequence {
    pub fn new<I: IntoIterator<Item = PathBuf>>(paths: I) -> Self {
        ImageSequence {
            paths: paths.into_iter().collect(),
        }
    }

    /// Every image file in `dir`, ordered by file name.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let mut paths = vec![];
        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_image && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        debug!("found {} frames in {}", paths.len(), dir.as_ref().display());
        Ok(ImageSequence::new(paths))
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.paths.pop_front() {
            Some(path) => {
                trace!("load {}", path.display());
                Ok(Some(image::open(&path)?.to_rgb8()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, FrameSource, ImageSequence, MemorySource};
    use image::Rgb;

    #[test]
    fn test_memory_source_order() {
        let frames = (0..3u8).map(|i| Frame::from_pixel(1, 8, Rgb([i, i, i])));
        let mut source = MemorySource::new(frames).with_frame_rate(12);
        assert_eq!(source.frame_rate(), Some(12));
        for i in 0..3u8 {
            let frame = source.next_frame().unwrap().unwrap();
            assert_eq!(frame.get_pixel(0, 0), &Rgb([i, i, i]));
        }
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_image_sequence_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for (name, level) in [("b.png", 200u8), ("a.png", 10), ("c.bmp", 90)] {
            Frame::from_pixel(2, 8, Rgb([level, level, level]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequence::from_dir(dir.path()).unwrap();
        assert_eq!(source.remaining(), 3);
        let levels: Vec<u8> = std::iter::from_fn(|| source.next_frame().unwrap())
            .map(|frame| frame.get_pixel(1, 7).0[0])
            .collect();
        assert_eq!(levels, [10, 200, 90]);
    }
}
