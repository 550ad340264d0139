use crate::config::EncodingMode;
use crate::error::Result;
use crate::pipeline::EncodedStream;
use std::io::{self, Write};

const BYTES_PER_LINE: usize = 16;

/// Serializes an encoded stream into a deployable artifact.
pub trait BitstreamEmitter {
    fn emit(&mut self, stream: &EncodedStream) -> Result<()>;
}

/// Writes the payload bytes as they are.
pub struct BinaryEmitter<W> {
    writer: W,
}

impl<W: io::Write> BinaryEmitter<W> {
    pub fn new(writer: W) -> Self {
        BinaryEmitter { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> BitstreamEmitter for BinaryEmitter<W> {
    fn emit(&mut self, stream: &EncodedStream) -> Result<()> {
        self.writer.write_all(&stream.payload)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes a C header to be compiled into the player firmware.
///
/// A compressed stream becomes one flat `<name>_compressed_video[]` array, a
/// raw stream a `<name>_video_frames[frame][byte]` table with one line per
/// page.
pub struct CHeaderEmitter<W> {
    name: String,
    writer: W,
}

impl<W: io::Write> CHeaderEmitter<W> {
    /// `name` is turned into a C identifier.
    pub fn new(name: &str, writer: W) -> Self {
        CHeaderEmitter {
            name: c_identifier(name),
            writer,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_prologue(&mut self, stream: &EncodedStream) -> io::Result<()> {
        let guard = format!("{}_H", self.name.to_ascii_uppercase());
        let metadata = &stream.metadata;
        writeln!(self.writer, "#ifndef {guard}")?;
        writeln!(self.writer, "#define {guard}")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "#include <stdint.h>")?;
        writeln!(self.writer, "#include <pico/platform.h>")?;
        writeln!(self.writer, "#include \"ssd1306_driver.h\"")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "#define VIDEO_FRAME_COUNT {}", metadata.frame_count)?;
        writeln!(self.writer, "#define VIDEO_FRAME_RATE {}", metadata.frame_rate)?;
        writeln!(self.writer, "#define VIDEO_WIDTH {}", metadata.width)?;
        writeln!(self.writer, "#define VIDEO_HEIGHT {}", metadata.height)?;
        if let EncodingMode::Compressed {
            window_bits,
            lookahead_bits,
        } = metadata.encoding
        {
            writeln!(self.writer, "#define VIDEO_WINDOW_BITS {window_bits}")?;
            writeln!(self.writer, "#define VIDEO_LOOKAHEAD_BITS {lookahead_bits}")?;
        }
        writeln!(self.writer)
    }

    fn write_bytes(&mut self, indent: &str, bytes: &[u8]) -> io::Result<()> {
        write!(self.writer, "{indent}")?;
        for (i, byte) in bytes.iter().enumerate() {
            if i != 0 {
                write!(self.writer, " ")?;
            }
            write!(self.writer, "0x{byte:02x},")?;
        }
        writeln!(self.writer)
    }
}

impl<W: io::Write> BitstreamEmitter for CHeaderEmitter<W> {
    fn emit(&mut self, stream: &EncodedStream) -> Result<()> {
        self.write_prologue(stream)?;
        let name = self.name.clone();
        match stream.metadata.encoding {
            EncodingMode::Compressed { .. } => {
                writeln!(
                    self.writer,
                    "uint8_t __in_flash() {name}_compressed_video[] = {{"
                )?;
                for line in stream.payload.chunks(BYTES_PER_LINE) {
                    self.write_bytes("    ", line)?;
                }
            }
            EncodingMode::Raw => {
                writeln!(
                    self.writer,
                    "uint8_t __in_flash() {name}_video_frames[VIDEO_FRAME_COUNT][SSD1306_RAM_BUFF_SIZE] = {{"
                )?;
                let width = stream.metadata.width as usize;
                for frame in stream.payload.chunks(stream.metadata.frame_len().max(1)) {
                    writeln!(self.writer, "    {{")?;
                    for page in frame.chunks(width.max(1)) {
                        self.write_bytes("        ", page)?;
                    }
                    writeln!(self.writer, "    }},")?;
                }
            }
        }
        writeln!(self.writer, "}};")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "#endif // {}_H", self.name.to_ascii_uppercase())?;
        self.writer.flush()?;
        debug!("emitted header {}", self.name);
        Ok(())
    }
}

fn c_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !ident.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        ident.insert(0, '_');
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::{c_identifier, BinaryEmitter, BitstreamEmitter, CHeaderEmitter};
    use crate::config::EncodingMode;
    use crate::pipeline::{EncodedStream, StreamMetadata};

    fn stream(encoding: EncodingMode, payload: Vec<u8>) -> EncodedStream {
        EncodedStream {
            metadata: StreamMetadata {
                frame_count: 2,
                frame_rate: 30,
                width: 2,
                height: 16,
                encoding,
            },
            payload,
        }
    }

    #[test]
    fn test_identifier() {
        assert_eq!(c_identifier("bad_apple"), "bad_apple");
        assert_eq!(c_identifier("bad-apple.v2"), "bad_apple_v2");
        assert_eq!(c_identifier("2video"), "_2video");
        assert_eq!(c_identifier(""), "_");
    }

    #[test]
    fn test_raw_header() {
        let stream = stream(EncodingMode::Raw, (0..8).collect());
        let mut emitter = CHeaderEmitter::new("clip", vec![]);
        emitter.emit(&stream).unwrap();
        let header = String::from_utf8(emitter.into_inner()).unwrap();
        assert!(header.starts_with("#ifndef CLIP_H\n#define CLIP_H\n"));
        assert!(header.contains("#define VIDEO_FRAME_COUNT 2\n"));
        assert!(header.contains("#define VIDEO_FRAME_RATE 30\n"));
        assert!(!header.contains("VIDEO_WINDOW_BITS"));
        assert!(header.contains(
            "clip_video_frames[VIDEO_FRAME_COUNT][SSD1306_RAM_BUFF_SIZE] = {\n    {\n        0x00, 0x01,\n        0x02, 0x03,\n    },\n    {\n        0x04, 0x05,\n        0x06, 0x07,\n    },\n};\n"
        ));
        assert!(header.ends_with("#endif // CLIP_H\n"));
    }

    #[test]
    fn test_compressed_header() {
        let encoding = EncodingMode::Compressed {
            window_bits: 8,
            lookahead_bits: 4,
        };
        let stream = stream(encoding, vec![0xAB; 17]);
        let mut emitter = CHeaderEmitter::new("clip", vec![]);
        emitter.emit(&stream).unwrap();
        let header = String::from_utf8(emitter.into_inner()).unwrap();
        assert!(header.contains("#define VIDEO_WINDOW_BITS 8\n#define VIDEO_LOOKAHEAD_BITS 4\n"));
        let body = header
            .split("clip_compressed_video[] = {\n")
            .nth(1)
            .unwrap();
        let lines: Vec<&str> = body.lines().take(3).collect();
        assert_eq!(lines[0].matches("0xab,").count(), 16);
        assert_eq!(lines[1], "    0xab,");
        assert_eq!(lines[2], "};");
    }

    #[test]
    fn test_binary() {
        let stream = stream(EncodingMode::Raw, vec![1, 2, 3]);
        let mut emitter = BinaryEmitter::new(vec![]);
        emitter.emit(&stream).unwrap();
        assert_eq!(emitter.into_inner(), [1, 2, 3]);
    }
}
