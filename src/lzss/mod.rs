//! Sliding window compression for the packed payload.
//!
//! [`Encoder`] and [`Decoder`] are streaming [`std::io::Write`] adapters, [`Lzss`]
//! holds validated parameters and does whole-buffer conversions.

mod bits;
mod decoder;
mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::config::EncodingMode;
use crate::error::{ConfigError, Result};
use crate::{LITERAL_TOKEN_BITS, MAX_WINDOW_BITS, MIN_LOOKAHEAD_BITS, MIN_WINDOW_BITS};
use std::io::Write;

/// Turns the packed payload into the bytes handed to the emitter.
pub trait Compressor {
    fn encoding(&self) -> EncodingMode;

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;
}

pub trait Decompressor {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// Validated window/lookahead parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lzss {
    window_bits: u8,
    lookahead_bits: u8,
}

impl Lzss {
    pub fn new(window_bits: u8, lookahead_bits: u8) -> std::result::Result<Self, ConfigError> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&window_bits) {
            return Err(ConfigError::WindowBits(window_bits));
        }
        if lookahead_bits < MIN_LOOKAHEAD_BITS {
            return Err(ConfigError::LookaheadBits(lookahead_bits));
        }
        if lookahead_bits >= window_bits {
            return Err(ConfigError::LookaheadNotBelowWindow {
                window_bits,
                lookahead_bits,
            });
        }
        Ok(Lzss {
            window_bits,
            lookahead_bits,
        })
    }

    pub fn window_bits(&self) -> u8 {
        self.window_bits
    }

    pub fn lookahead_bits(&self) -> u8 {
        self.lookahead_bits
    }

    /// history size in bytes
    #[inline(always)]
    pub fn window_size(&self) -> usize {
        1 << self.window_bits
    }

    /// longest match a single back-reference can carry
    #[inline(always)]
    pub fn max_match(&self) -> usize {
        1 << self.lookahead_bits
    }

    #[inline(always)]
    pub fn reference_bits(&self) -> u32 {
        1 + self.window_bits as u32 + self.lookahead_bits as u32
    }

    /// Shortest match whose back-reference is strictly cheaper than literals.
    #[inline(always)]
    pub fn min_match(&self) -> usize {
        (self.reference_bits() / LITERAL_TOKEN_BITS + 1) as usize
    }
}

impl Compressor for Lzss {
    fn encoding(&self) -> EncodingMode {
        EncodingMode::Compressed {
            window_bits: self.window_bits,
            lookahead_bits: self.lookahead_bits,
        }
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = Encoder::new(*self, Vec::with_capacity(input.len()));
        encoder.write_all(input)?;
        let out = encoder.finish()?;
        debug!("compressed {} bytes into {} bytes", input.len(), out.len());
        Ok(out)
    }
}

impl Decompressor for Lzss {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = Decoder::new(*self, Vec::with_capacity(input.len() * 2));
        decoder.feed(input)?;
        decoder.finish()
    }
}

/// RAW mode: the payload is emitted as packed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Compressor for Passthrough {
    fn encoding(&self) -> EncodingMode {
        EncodingMode::Raw
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

impl Decompressor for Passthrough {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::{Compressor, Decompressor, Lzss, Passthrough};
    use crate::error::{ConfigError, Error};
    use proptest::prelude::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Setup function that is only run once, even if called multiple times.
    fn setup() {
        INIT.call_once(|| {
            pretty_env_logger::init();
        });
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            Lzss::new(4, 4),
            Err(ConfigError::LookaheadNotBelowWindow {
                window_bits: 4,
                lookahead_bits: 4
            })
        );
        assert_eq!(Lzss::new(0, 3), Err(ConfigError::WindowBits(0)));
        assert_eq!(Lzss::new(16, 3), Err(ConfigError::WindowBits(16)));
        assert_eq!(Lzss::new(8, 0), Err(ConfigError::LookaheadBits(0)));
        assert!(Lzss::new(4, 3).is_ok());
        assert!(Lzss::new(15, 14).is_ok());
    }

    #[test]
    fn test_min_match() {
        // 1 + 8 + 4 = 13 bits, two literals cost 18
        assert_eq!(Lzss::new(8, 4).unwrap().min_match(), 2);
        // 1 + 4 + 3 = 8 bits, one literal costs 9
        assert_eq!(Lzss::new(4, 3).unwrap().min_match(), 1);
        // 1 + 15 + 14 = 30 bits, four literals cost 36
        assert_eq!(Lzss::new(15, 14).unwrap().min_match(), 4);
        // 1 + 10 + 7 = 18 bits, two literals cost 18, not cheaper
        assert_eq!(Lzss::new(10, 7).unwrap().min_match(), 3);
    }

    #[test]
    fn test_zero_run() {
        setup();
        let lzss = Lzss::new(8, 4).unwrap();
        let input = vec![0u8; 300];
        let compressed = lzss.compress(&input).unwrap();
        // one literal then 19 back-references of 13 bits
        assert_eq!(compressed.len(), 32);
        assert_eq!(lzss.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_wide_window() {
        setup();
        let lzss = Lzss::new(15, 8).unwrap();
        let input: Vec<u8> = (0..6_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8 & 0x0F)
            .collect();
        let compressed = lzss.compress(&input).unwrap();
        assert_eq!(lzss.decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn test_empty_input() {
        let lzss = Lzss::new(8, 4).unwrap();
        let compressed = lzss.compress(&[]).unwrap();
        assert!(compressed.is_empty());
        assert!(lzss.decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_reference() {
        let lzss = Lzss::new(8, 4).unwrap();
        // tag 0, offset-1 = 4, length-1 = 0 with nothing produced yet
        match lzss.decompress(&[0x02, 0x00]) {
            Err(Error::StreamCorruption {
                offset: 5,
                produced: 0,
            }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_passthrough() {
        let input = [1, 2, 3];
        assert_eq!(Passthrough.compress(&input).unwrap(), input);
        assert_eq!(Passthrough.decompress(&input).unwrap(), input);
    }

    fn params() -> impl Strategy<Value = Lzss> {
        (4u8..=10)
            .prop_flat_map(|w| (Just(w), 3u8..w))
            .prop_map(|(w, l)| Lzss::new(w, l).unwrap())
    }

    proptest! {
        #[test]
        fn prop_round_trip(lzss in params(), input in prop::collection::vec(any::<u8>(), 0..2048)) {
            let compressed = lzss.compress(&input).unwrap();
            prop_assert_eq!(lzss.decompress(&compressed).unwrap(), input);
        }

        #[test]
        fn prop_round_trip_low_entropy(
            lzss in params(),
            input in prop::collection::vec(prop::sample::select(vec![0x00u8, 0xFF, 0x0F]), 0..4096),
        ) {
            let compressed = lzss.compress(&input).unwrap();
            prop_assert_eq!(lzss.decompress(&compressed).unwrap(), input);
        }

        #[test]
        fn prop_cost_bound(lzss in params(), input in prop::collection::vec(any::<u8>(), 0..2048)) {
            let compressed = lzss.compress(&input).unwrap();
            prop_assert!(compressed.len() <= (9 * input.len() + 7) / 8);
        }
    }
}
