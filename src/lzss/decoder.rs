use super::bits::BitReader;
use super::Lzss;
use crate::error::{Error, Result};
use std::io;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Tag,
    Literal,
    Offset,
    Length { offset: u16 },
}

/// Streaming decompressor.
///
/// History lives in a fixed ring of `2^window_bits` bytes indexed by the
/// output position modulo its size. Once an error is returned the decoder is
/// dead: every later call fails with [`Error::DecoderFailed`].
pub struct Decoder<W> {
    lzss: Lzss,
    failed: bool,
    window: Box<[u8]>,
    produced: u64,
    state: State,
    bits: BitReader,
    scratch: Vec<u8>,
    writer: W,
}

impl<W: io::Write> Decoder<W> {
    pub fn new(lzss: Lzss, writer: W) -> Decoder<W> {
        Decoder {
            lzss,
            failed: false,
            window: vec![0; lzss.window_size()].into_boxed_slice(),
            produced: 0,
            state: State::Tag,
            bits: BitReader::default(),
            scratch: Vec::with_capacity(lzss.max_match()),
            writer,
        }
    }

    /// bytes written out so far
    pub fn produced(&self) -> u64 {
        self.produced
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn feed(&mut self, buf: &[u8]) -> Result<()> {
        for byte in buf.iter() {
            self.update(*byte)?;
        }
        Ok(())
    }

    #[inline(always)]
    pub fn update(&mut self, byte: u8) -> Result<()> {
        if self.failed {
            return Err(Error::DecoderFailed);
        }
        self.bits.feed(byte);
        while let Some(value) = self.bits.take(self.field_width()) {
            if let Err(err) = self.advance(value) {
                debug!("decoder failed after {} bytes: {err}", self.produced);
                self.failed = true;
                return Err(err);
            }
        }
        Ok(())
    }

    #[inline(always)]
    fn field_width(&self) -> u8 {
        match self.state {
            State::Tag => 1,
            State::Literal => 8,
            State::Offset => self.lzss.window_bits(),
            State::Length { .. } => self.lzss.lookahead_bits(),
        }
    }

    fn advance(&mut self, value: u16) -> Result<()> {
        self.state = match self.state {
            State::Tag if value == 1 => State::Literal,
            State::Tag => State::Offset,
            State::Literal => {
                trace!("literal: 0x{value:02X}");
                self.scratch.push(value as u8);
                self.commit()?;
                State::Tag
            }
            State::Offset => State::Length { offset: value + 1 },
            State::Length { offset } => {
                let length = value as usize + 1;
                trace!("reference: offset={offset}, length={length}");
                if offset as u64 > self.produced {
                    return Err(Error::StreamCorruption {
                        offset,
                        produced: self.produced,
                    });
                }
                let mask = self.window.len() - 1;
                let mut src = (self.produced - offset as u64) as usize & mask;
                let mut dst = self.produced as usize & mask;
                for _ in 0..length {
                    // source may overlap what this copy just wrote
                    let byte = self.window[src];
                    self.window[dst] = byte;
                    self.scratch.push(byte);
                    src = (src + 1) & mask;
                    dst = (dst + 1) & mask;
                }
                self.produced += length as u64;
                self.writer.write_all(&self.scratch)?;
                self.scratch.clear();
                State::Tag
            }
        };
        Ok(())
    }

    /// Write out a literal held in `scratch`.
    fn commit(&mut self) -> Result<()> {
        let mask = self.window.len() - 1;
        for byte in self.scratch.iter() {
            self.window[self.produced as usize & mask] = *byte;
            self.produced += 1;
        }
        self.writer.write_all(&self.scratch)?;
        self.scratch.clear();
        Ok(())
    }

    /// Check that only zero padding is left and hand back the writer.
    pub fn finish(mut self) -> Result<W> {
        if self.failed {
            return Err(Error::DecoderFailed);
        }
        let (partial, clean) = match self.state {
            State::Tag => (0, true),
            State::Literal => (1, false),
            State::Offset => (1, true),
            State::Length { offset } => (1 + self.lzss.window_bits(), offset == 1),
        };
        let partial = partial + self.bits.bit_len();
        trace!("finish: state={:?}, trailing bits={partial}", self.state);
        if partial >= 8 || !clean || !self.bits.is_zero() {
            return Err(Error::TruncatedStream);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: io::Write> io::Write for Decoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.feed(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::Decoder;
    use crate::error::Error;
    use crate::lzss::Lzss;
    use std::io::{self, Write};

    /// (window_bits, lookahead_bits, decoded, compressed)
    const TEST_VECTOR: [(u8, u8, &str, &str); 5] = [
        (8, 4, "41", "a080"),
        (8, 4, "41414141", "a08008"),
        (8, 4, "414241424142", "a0d08026"),
        (4, 3, "00000000", "800100"),
        // reference wrapping around a 16 byte ring: 17 literals then offset 16
        (
            4,
            3,
            "000102030405060708090a0b0c0d0e0f100102",
            "804060503824160d0784426150b864361d0f883c80",
        ),
    ];

    #[test]
    fn test_decode_vector() {
        for (window_bits, lookahead_bits, expected, input) in TEST_VECTOR.into_iter() {
            let lzss = Lzss::new(window_bits, lookahead_bits).unwrap();
            let input = hex::decode(input).unwrap();
            let expected = hex::decode(expected).unwrap();
            let mut decoder = Decoder::new(lzss, vec![]);
            decoder.write_all(&input).unwrap();
            assert_eq!(expected, decoder.finish().unwrap());
        }
    }

    #[test]
    fn test_truncated_literal() {
        let lzss = Lzss::new(8, 4).unwrap();
        // a single literal cut after its first byte
        let mut decoder = Decoder::new(lzss, vec![]);
        decoder.feed(&[0xA0]).unwrap();
        assert!(matches!(decoder.finish(), Err(Error::TruncatedStream)));
    }

    #[test]
    fn test_trailing_garbage() {
        let lzss = Lzss::new(8, 4).unwrap();
        let mut decoder = Decoder::new(lzss, vec![]);
        decoder.feed(&[0xA0, 0x81]).unwrap();
        assert!(matches!(decoder.finish(), Err(Error::TruncatedStream)));
    }

    #[test]
    fn test_no_recovery_after_corruption() {
        let lzss = Lzss::new(8, 4).unwrap();
        let mut decoder = Decoder::new(lzss, vec![]);
        assert!(matches!(
            decoder.feed(&[0x00, 0x00]),
            Err(Error::StreamCorruption {
                offset: 1,
                produced: 0
            })
        ));
        // a valid literal afterwards must not be decoded
        assert!(matches!(decoder.feed(&[0xA0, 0x80]), Err(Error::DecoderFailed)));
        assert_eq!(decoder.produced(), 0);
        assert!(decoder.get_ref().is_empty());
        assert!(matches!(decoder.finish(), Err(Error::DecoderFailed)));
    }

    #[test]
    fn test_corruption_through_io_write() {
        let lzss = Lzss::new(8, 4).unwrap();
        let mut decoder = Decoder::new(lzss, vec![]);
        let err = decoder.write_all(&[0x00, 0x00]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
