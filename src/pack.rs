use crate::binarize::{BinaryFrame, Binarizer};
use crate::error::{FormatError, Result};
use crate::source::Frame;
use crate::PAGE_HEIGHT;
use std::fmt::{self, Debug};

/// Packs frames into page-ordered bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagePacker {
    binarizer: Binarizer,
}

impl PagePacker {
    pub fn new(binarizer: Binarizer) -> Self {
        PagePacker { binarizer }
    }

    pub fn binarizer(&self) -> &Binarizer {
        &self.binarizer
    }

    /// Binarize and pack a color frame.
    pub fn pack(&self, frame: &Frame) -> Result<PackedFrame> {
        check_height(frame.height())?;
        self.pack_bits(&self.binarizer.binarize(frame))
    }

    pub fn pack_bits(&self, bits: &BinaryFrame) -> Result<PackedFrame> {
        check_height(bits.height())?;
        let width = bits.width();
        let pages = bits.height() / PAGE_HEIGHT;
        let mut bytes = Vec::with_capacity(width as usize * pages as usize);
        for page in 0..pages {
            let top = page * PAGE_HEIGHT;
            for x in 0..width {
                let byte = (0..PAGE_HEIGHT).fold(0u8, |byte, row| {
                    byte | ((bits.is_lit(x, top + row) as u8) << row)
                });
                bytes.push(byte);
            }
        }
        debug!(
            "packed {}x{} frame into {} bytes",
            width,
            bits.height(),
            bytes.len()
        );
        Ok(PackedFrame {
            width,
            pages,
            bytes,
        })
    }
}

#[inline(always)]
fn check_height(height: u32) -> Result<()> {
    if height % PAGE_HEIGHT != 0 {
        return Err(FormatError::HeightNotPageAligned { height }.into());
    }
    Ok(())
}

/// `width * pages` bytes, one per (page, column), page-major.
#[derive(Clone, PartialEq, Eq)]
pub struct PackedFrame {
    width: u32,
    pages: u32,
    bytes: Vec<u8>,
}

impl PackedFrame {
    /// Rebuild a frame from a display buffer of `width * height / 8` bytes.
    pub fn from_bytes(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        check_height(height)?;
        let pages = height / PAGE_HEIGHT;
        let expected = width as usize * pages as usize;
        if bytes.len() != expected {
            return Err(FormatError::BufferSize {
                expected,
                found: bytes.len(),
            }
            .into());
        }
        Ok(PackedFrame {
            width,
            pages,
            bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.pages * PAGE_HEIGHT
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Column bytes of one page.
    ///
    /// # Panics
    ///
    /// Panics if `page >= self.pages()`.
    pub fn page(&self, page: u32) -> &[u8] {
        assert!(page < self.pages, "page {page} out of {} pages", self.pages);
        let start = (page * self.width) as usize;
        &self.bytes[start..start + self.width as usize]
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the frame.
    #[inline(always)]
    pub fn is_lit(&self, x: u32, y: u32) -> bool {
        assert!(
            x < self.width && y < self.height(),
            "pixel ({x}, {y}) outside {}x{}",
            self.width,
            self.height()
        );
        let byte = self.bytes[((y / PAGE_HEIGHT) * self.width + x) as usize];
        (byte >> (y % PAGE_HEIGHT)) & 1 == 1
    }

    pub fn unpack(&self) -> BinaryFrame {
        BinaryFrame::from_fn(self.width, self.height(), |x, y| self.is_lit(x, y))
    }
}

impl Debug for PackedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes: String = self.bytes.iter().map(|b| format!("{b:02X}")).collect();
        f.debug_struct("PackedFrame")
            .field("width", &self.width)
            .field("pages", &self.pages)
            .field("bytes", &bytes)
            .finish()
    }
}
