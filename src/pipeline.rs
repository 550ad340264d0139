use crate::config::{EncoderConfig, EncodingMode};
use crate::error::{ConfigError, Error, FormatError, Result};
use crate::lzss::{Compressor, Decoder, Lzss};
use crate::pack::{PackedFrame, PagePacker};
use crate::source::{Frame, FrameSource};
use crate::PAGE_HEIGHT;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// compressed bytes handed to the decoder per refill, as on the device
const PLAYER_INPUT_CHUNK: usize = 32;

/// Everything a player needs besides the payload itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub frame_count: usize,
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub encoding: EncodingMode,
}

impl StreamMetadata {
    /// packed bytes per frame
    pub fn frame_len(&self) -> usize {
        self.width as usize * (self.height / PAGE_HEIGHT) as usize
    }

    /// packed bytes of the whole sequence
    pub fn raw_len(&self) -> usize {
        self.frame_len() * self.frame_count
    }
}

pub struct EncodedStream {
    pub metadata: StreamMetadata,
    pub payload: Vec<u8>,
}

impl EncodedStream {
    pub fn player(&self) -> Result<Player<'_>> {
        Player::new(self)
    }

    /// payload size relative to the packed size
    pub fn ratio(&self) -> f64 {
        match self.metadata.raw_len() {
            0 => 1.0,
            raw => self.payload.len() as f64 / raw as f64,
        }
    }
}

impl Debug for EncodedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedStream")
            .field("metadata", &self.metadata)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    FramesCollected { count: usize },
    FramePacked { index: usize, total: usize },
    Compressed { input: usize, output: usize },
    Finished { bytes: usize },
}

/// Frames in, payload plus metadata out.
pub struct Transcoder<'a> {
    packer: PagePacker,
    compressor: Box<dyn Compressor + Send + Sync>,
    frame_rate: u32,
    progress: Option<Box<dyn FnMut(&Progress) + 'a>>,
}

impl<'a> Transcoder<'a> {
    /// Validates the whole configuration before anything is read.
    pub fn new(config: &EncoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Transcoder {
            packer: PagePacker::new(config.binarizer()),
            compressor: config.encoding.compressor()?,
            frame_rate: config.frame_rate,
            progress: None,
        })
    }

    /// Replace the compressor picked from the configuration.
    pub fn with_compressor(mut self, compressor: Box<dyn Compressor + Send + Sync>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn on_progress<F: FnMut(&Progress) + 'a>(mut self, callback: F) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    fn report(&mut self, progress: Progress) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&progress);
        }
    }

    /// Run the whole pipeline. Fails before producing any byte if the source
    /// is empty or the frames do not share one page aligned size.
    pub fn transcode<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<EncodedStream> {
        let frame_rate = match source.frame_rate() {
            Some(0) => return Err(ConfigError::FrameRate.into()),
            Some(rate) => rate,
            None => self.frame_rate,
        };
        let mut frames = vec![];
        while let Some(frame) = source.next_frame()? {
            frames.push(frame);
        }
        info!("collected {} frames", frames.len());
        self.report(Progress::FramesCollected {
            count: frames.len(),
        });

        let (width, height) = check_frames(&frames)?;
        let payload = self.pack_frames(&frames)?;

        info!("compressing {} bytes", payload.len());
        let compressed = self.compressor.compress(&payload)?;
        self.report(Progress::Compressed {
            input: payload.len(),
            output: compressed.len(),
        });

        let stream = EncodedStream {
            metadata: StreamMetadata {
                frame_count: frames.len(),
                frame_rate,
                width,
                height,
                encoding: self.compressor.encoding(),
            },
            payload: compressed,
        };
        info!("done: {:?}", stream);
        self.report(Progress::Finished {
            bytes: stream.payload.len(),
        });
        Ok(stream)
    }

    /// Pack every frame, in parallel, and join them in time order.
    pub fn pack_frames(&mut self, frames: &[Frame]) -> Result<Vec<u8>> {
        check_frames(frames)?;
        let packer = self.packer;
        let packed = frames
            .par_iter()
            .map(|frame| packer.pack(frame))
            .collect::<Result<Vec<_>>>()?;

        let total = packed.len();
        let mut payload = Vec::with_capacity(packed.iter().map(PackedFrame::len).sum());
        for (index, frame) in packed.into_iter().enumerate() {
            payload.extend_from_slice(frame.as_bytes());
            self.report(Progress::FramePacked { index, total });
        }
        Ok(payload)
    }
}

/// Common size of all frames.
fn check_frames(frames: &[Frame]) -> Result<(u32, u32)> {
    let first = frames.first().ok_or(Error::SourceExhausted)?;
    let expected = first.dimensions();
    if expected.1 % PAGE_HEIGHT != 0 {
        return Err(FormatError::HeightNotPageAligned { height: expected.1 }.into());
    }
    for (index, frame) in frames.iter().enumerate().skip(1) {
        if frame.dimensions() != expected {
            return Err(FormatError::SizeMismatch {
                index,
                expected,
                found: frame.dimensions(),
            }
            .into());
        }
    }
    Ok(expected)
}

enum Inner {
    Raw,
    Compressed(Option<Decoder<Vec<u8>>>),
    Failed,
}

/// Yields the packed frames of a stream one at a time, decoding only as much
/// of the payload as the next frame needs. After the first error nothing more
/// is played.
pub struct Player<'a> {
    metadata: &'a StreamMetadata,
    input: &'a [u8],
    read: usize,
    played: usize,
    inner: Inner,
}

impl<'a> Player<'a> {
    pub fn new(stream: &'a EncodedStream) -> Result<Self> {
        let metadata = &stream.metadata;
        let inner = match metadata.encoding {
            EncodingMode::Raw => {
                if stream.payload.len() != metadata.raw_len() {
                    return Err(FormatError::BufferSize {
                        expected: metadata.raw_len(),
                        found: stream.payload.len(),
                    }
                    .into());
                }
                Inner::Raw
            }
            EncodingMode::Compressed {
                window_bits,
                lookahead_bits,
            } => {
                let lzss = Lzss::new(window_bits, lookahead_bits)?;
                let decoder = Decoder::new(lzss, Vec::with_capacity(metadata.frame_len() * 2));
                Inner::Compressed(Some(decoder))
            }
        };
        Ok(Player {
            metadata,
            input: &stream.payload,
            read: 0,
            played: 0,
            inner,
        })
    }

    pub fn next_frame(&mut self) -> Result<Option<PackedFrame>> {
        let frame = self.decode_frame();
        if frame.is_err() {
            self.inner = Inner::Failed;
        }
        frame
    }

    fn decode_frame(&mut self) -> Result<Option<PackedFrame>> {
        let frame_len = self.metadata.frame_len();
        let bytes = match &mut self.inner {
            Inner::Failed => return Ok(None),
            Inner::Raw => {
                if self.played == self.metadata.frame_count {
                    return Ok(None);
                }
                let bytes = self.input[self.read..self.read + frame_len].to_vec();
                self.read += frame_len;
                bytes
            }
            Inner::Compressed(slot) => {
                let Some(decoder) = slot.as_mut() else {
                    return Ok(None);
                };
                if self.played == self.metadata.frame_count {
                    decoder.feed(&self.input[self.read..])?;
                    self.read = self.input.len();
                    let surplus = slot.take().map(Decoder::finish).transpose()?;
                    return match surplus {
                        Some(rest) if !rest.is_empty() => Err(Error::TrailingData(rest.len())),
                        _ => Ok(None),
                    };
                }
                while decoder.get_ref().len() < frame_len {
                    if self.read == self.input.len() {
                        return Err(Error::TruncatedStream);
                    }
                    let end = (self.read + PLAYER_INPUT_CHUNK).min(self.input.len());
                    decoder.feed(&self.input[self.read..end])?;
                    self.read = end;
                }
                let rest = decoder.get_mut().split_off(frame_len);
                std::mem::replace(decoder.get_mut(), rest)
            }
        };
        self.played += 1;
        trace!("play frame {}/{}", self.played, self.metadata.frame_count);
        PackedFrame::from_bytes(self.metadata.width, self.metadata.height, bytes).map(Some)
    }
}

impl Iterator for Player<'_> {
    type Item = Result<PackedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
