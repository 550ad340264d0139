use std::io;
use thiserror::Error;

/// Frame geometry errors, raised before any byte is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("frame height {height} is not a multiple of 8")]
    HeightNotPageAligned { height: u32 },

    #[error("frame {index} is {}x{}, expected {}x{}", found.0, found.1, expected.0, expected.1)]
    SizeMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("packed buffer holds {found} bytes, expected {expected}")]
    BufferSize { expected: usize, found: usize },
}

/// Codec and pipeline parameter errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window_bits must be within 4..=15, got {0}")]
    WindowBits(u8),

    #[error("lookahead_bits must be at least 3, got {0}")]
    LookaheadBits(u8),

    #[error("lookahead_bits ({lookahead_bits}) must be less than window_bits ({window_bits})")]
    LookaheadNotBelowWindow { window_bits: u8, lookahead_bits: u8 },

    #[error("frame rate must be positive")]
    FrameRate,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("frame source produced no frames")]
    SourceExhausted,

    #[error("back-reference {offset} bytes behind, only {produced} bytes produced")]
    StreamCorruption { offset: u16, produced: u64 },

    #[error("compressed stream ends inside a token")]
    TruncatedStream,

    #[error("decoder stopped after an earlier error")]
    DecoderFailed,

    #[error("stream holds {0} bytes past the last frame")]
    TrailingData(usize),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
