use super::bits::BitWriter;
use super::Lzss;
use std::io;

/// Streaming greedy longest-match compressor.
///
/// Input is staged in a fixed buffer of `2 * window + lookahead` bytes:
///
/// ```text
///   0        pos-window      pos          end
///   │  stale   │   history    │ lookahead  │   free   │
/// ```
///
/// A token is emitted whenever a full lookahead is buffered. When the free
/// region runs out the history is slid down to the front of the buffer.
///
/// Unlike the decoder's ring, history and lookahead stay contiguous here so a
/// candidate match is a plain slice comparison. The buffer never grows: it
/// slides at most once per `window` bytes of input.
pub struct Encoder<W> {
    lzss: Lzss,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
    bits: BitWriter<W>,
}

impl<W: io::Write> Encoder<W> {
    pub fn new(lzss: Lzss, writer: W) -> Encoder<W> {
        let capacity = 2 * lzss.window_size() + lzss.max_match();
        Encoder {
            lzss,
            buf: vec![0; capacity].into_boxed_slice(),
            pos: 0,
            end: 0,
            bits: BitWriter::new(writer),
        }
    }

    #[inline(always)]
    pub fn update(&mut self, byte: u8) -> io::Result<()> {
        if self.end == self.buf.len() {
            self.slide();
        }
        self.buf[self.end] = byte;
        self.end += 1;
        while self.end - self.pos >= self.lzss.max_match() {
            self.step()?;
        }
        Ok(())
    }

    fn slide(&mut self) {
        let keep_from = self.pos.saturating_sub(self.lzss.window_size());
        trace!("slide window by {keep_from}");
        self.buf.copy_within(keep_from..self.end, 0);
        self.pos -= keep_from;
        self.end -= keep_from;
    }

    /// Emit one token for the bytes at `pos`.
    fn step(&mut self) -> io::Result<()> {
        let (offset, length) = self.find_match();
        if length >= self.lzss.min_match() {
            trace!("reference: offset={offset}, length={length}");
            self.bits.push(0, 1)?;
            self.bits.push((offset - 1) as u16, self.lzss.window_bits())?;
            self.bits.push((length - 1) as u16, self.lzss.lookahead_bits())?;
            self.pos += length;
        } else {
            let byte = self.buf[self.pos];
            trace!("literal: 0x{byte:02X}");
            self.bits.push(1, 1)?;
            self.bits.push(byte as u16, 8)?;
            self.pos += 1;
        }
        Ok(())
    }

    /// Longest run in the history matching the upcoming bytes, nearest first.
    /// The candidate run may extend past `pos` into the lookahead itself.
    fn find_match(&self) -> (usize, usize) {
        let max_len = (self.end - self.pos).min(self.lzss.max_match());
        let lookahead = &self.buf[self.pos..self.pos + max_len];
        let lo = self.pos.saturating_sub(self.lzss.window_size());
        let mut best = (0, 0);
        for start in (lo..self.pos).rev() {
            let length = self.buf[start..]
                .iter()
                .zip(lookahead)
                .take_while(|(a, b)| a == b)
                .count();
            if length > best.1 {
                best = (self.pos - start, length);
                if length == max_len {
                    break;
                }
            }
        }
        best
    }

    /// Drain the lookahead, pad to a byte boundary and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        while self.pos < self.end {
            self.step()?;
        }
        self.bits.finish()
    }
}

impl<W: io::Write> io::Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for byte in buf.iter() {
            self.update(*byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
