use crate::binarize::Binarizer;
use crate::error::ConfigError;
use crate::lzss::{Compressor, Lzss, Passthrough};
use crate::{DEFAULT_FRAME_RATE, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};

/// How the packed payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EncodingMode {
    Raw,
    Compressed { window_bits: u8, lookahead_bits: u8 },
}

impl Default for EncodingMode {
    /// The firmware decoder is built with a static 8/4 window.
    fn default() -> Self {
        EncodingMode::Compressed {
            window_bits: 8,
            lookahead_bits: 4,
        }
    }
}

impl EncodingMode {
    pub fn is_compressed(&self) -> bool {
        matches!(self, EncodingMode::Compressed { .. })
    }

    /// Build the compressor for this mode, rejecting bad parameters.
    pub fn compressor(&self) -> Result<Box<dyn Compressor + Send + Sync>, ConfigError> {
        match *self {
            EncodingMode::Raw => Ok(Box::new(Passthrough)),
            EncodingMode::Compressed {
                window_bits,
                lookahead_bits,
            } => Ok(Box::new(Lzss::new(window_bits, lookahead_bits)?)),
        }
    }
}

/// Transcoder settings, usually loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub frame_rate: u32,
    /// grey level above which a pixel is lit
    pub threshold: u8,
    pub encoding: EncodingMode,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            frame_rate: DEFAULT_FRAME_RATE,
            threshold: DEFAULT_THRESHOLD,
            encoding: EncodingMode::default(),
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::FrameRate);
        }
        if let EncodingMode::Compressed {
            window_bits,
            lookahead_bits,
        } = self.encoding
        {
            Lzss::new(window_bits, lookahead_bits)?;
        }
        Ok(())
    }

    pub fn binarizer(&self) -> Binarizer {
        Binarizer::new(self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::{EncoderConfig, EncodingMode};
    use crate::error::ConfigError;

    #[test]
    fn test_defaults() {
        let config = EncoderConfig::default();
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.threshold, 15);
        assert!(config.encoding.is_compressed());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_json() {
        let config: EncoderConfig = serde_json::from_str(
            r#"{
                "frame_rate": 24,
                "encoding": { "mode": "compressed", "window_bits": 10, "lookahead_bits": 5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.frame_rate, 24);
        assert_eq!(config.threshold, 15);
        assert_eq!(
            config.encoding,
            EncodingMode::Compressed {
                window_bits: 10,
                lookahead_bits: 5
            }
        );

        let config: EncoderConfig =
            serde_json::from_str(r#"{ "encoding": { "mode": "raw" } }"#).unwrap();
        assert_eq!(config.encoding, EncodingMode::Raw);
        assert_eq!(config.encoding.compressor().unwrap().encoding(), EncodingMode::Raw);
    }

    #[test]
    fn test_validate() {
        let config = EncoderConfig {
            encoding: EncodingMode::Compressed {
                window_bits: 4,
                lookahead_bits: 4,
            },
            ..EncoderConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::LookaheadNotBelowWindow {
                window_bits: 4,
                lookahead_bits: 4
            })
        );
        let config = EncoderConfig {
            frame_rate: 0,
            ..EncoderConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::FrameRate));
    }
}
