use crate::source::Frame;
use crate::DEFAULT_THRESHOLD;
use image::{GrayImage, Luma, Rgb};

const LIT: Luma<u8> = Luma([0xFF]);
const DARK: Luma<u8> = Luma([0x00]);

/// Maps a color pixel to a single lit/dark bit by mean intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binarizer {
    threshold: u8,
}

impl Default for Binarizer {
    fn default() -> Self {
        Binarizer::new(DEFAULT_THRESHOLD)
    }
}

impl Binarizer {
    pub fn new(threshold: u8) -> Self {
        Binarizer { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Truncating mean of the three channels.
    #[inline(always)]
    pub fn grey(pixel: &Rgb<u8>) -> u8 {
        let [c0, c1, c2] = pixel.0;
        ((c0 as u16 + c1 as u16 + c2 as u16) / 3) as u8
    }

    #[inline(always)]
    pub fn is_lit(&self, pixel: &Rgb<u8>) -> bool {
        Self::grey(pixel) > self.threshold
    }

    pub fn binarize(&self, frame: &Frame) -> BinaryFrame {
        let image = GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            if self.is_lit(frame.get_pixel(x, y)) {
                LIT
            } else {
                DARK
            }
        });
        BinaryFrame { image }
    }
}

/// A frame of single bits. Stored as a grey image holding only 0x00 and 0xFF
/// so it can be saved and inspected like any other image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFrame {
    image: GrayImage,
}

impl BinaryFrame {
    /// All dark.
    pub fn new(width: u32, height: u32) -> Self {
        BinaryFrame {
            image: GrayImage::new(width, height),
        }
    }

    pub fn from_fn<F: FnMut(u32, u32) -> bool>(width: u32, height: u32, mut f: F) -> Self {
        let image = GrayImage::from_fn(width, height, |x, y| if f(x, y) { LIT } else { DARK });
        BinaryFrame { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline(always)]
    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, lit: bool) {
        self.image.put_pixel(x, y, if lit { LIT } else { DARK });
    }

    pub fn lit_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] != 0).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}
