//! # Page Packing
//!
//! A monochrome frame is split into bands of 8 rows ("pages"). Every column of
//! a page becomes one byte, row `8p + i` landing in bit `i`:
//!
//! ```text
//!            column c
//!               │
//!   row 8p+0 ── ● ──▶ bit 0 (LSB)
//!   row 8p+1 ── ○ ──▶ bit 1
//!      ...
//!   row 8p+7 ── ● ──▶ bit 7 (MSB)
//! ```
//!
//! Bytes are ordered page-major, column-minor, which is exactly the GDDRAM
//! layout of an SSD1306 in horizontal addressing mode. A `W×H` frame packs to
//! `W·H/8` bytes; frames are concatenated in time order.
//!
//! # Compressed Stream
//!
//! The concatenated payload may be compressed with a heatshrink-compatible
//! LZSS scheme. Bits are written MSB first:
//!
//! ```text
//!   literal:        1 XXXXXXXX
//!                   ▲ └─ byte ─┘
//!                   tag
//!
//!   back-reference: 0 OOOO…O LLL…L
//!                   ▲ └ W_b ┘└ L_b ┘
//!                   tag  offset-1  length-1
//! ```
//!
//! A back-reference copies `length` bytes starting `offset` bytes behind the
//! current output position, byte by byte, so the source may overlap the
//! destination. The stream is zero padded to a byte boundary. A
//! back-reference is never shorter than 8 bits, thus padding never decodes to
//! a complete token.
//!
//! The encoding does not carry the payload size. The player MUST know the
//! frame geometry and frame count, see [`StreamMetadata`].

#[macro_use]
extern crate log;

mod binarize;
mod config;
mod emit;
mod error;
pub mod lzss;
mod pack;
mod pipeline;
mod source;

pub use binarize::{BinaryFrame, Binarizer};
pub use config::{EncoderConfig, EncodingMode};
pub use emit::{BinaryEmitter, BitstreamEmitter, CHeaderEmitter};
pub use error::{ConfigError, Error, FormatError, Result};
pub use lzss::{Compressor, Decompressor, Lzss, Passthrough};
pub use pack::{PackedFrame, PagePacker};
pub use pipeline::{EncodedStream, Player, Progress, StreamMetadata, Transcoder};
pub use source::{Frame, FrameSource, ImageSequence, MemorySource};

/// rows per display page
pub const PAGE_HEIGHT: u32 = 8;
/// pixels with a grey level above this are lit
pub const DEFAULT_THRESHOLD: u8 = 0xF;
pub const DEFAULT_FRAME_RATE: u32 = 30;

const MIN_WINDOW_BITS: u8 = 4;
const MAX_WINDOW_BITS: u8 = 15;
const MIN_LOOKAHEAD_BITS: u8 = 3;
/// bits of a literal token: tag + byte
const LITERAL_TOKEN_BITS: u32 = 1 + 8;
