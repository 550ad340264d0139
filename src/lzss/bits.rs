use std::io;

/// MSB-first bit sink.
pub(crate) struct BitWriter<W> {
    buf: u8,
    bit_len: u8,
    writer: W,
}

impl<W: io::Write> BitWriter<W> {
    pub fn new(writer: W) -> Self {
        BitWriter {
            buf: 0,
            bit_len: 0,
            writer,
        }
    }

    /// Push the low `count` bits of `value`, most significant first.
    #[inline(always)]
    pub fn push(&mut self, value: u16, count: u8) -> io::Result<()> {
        debug_assert!(count <= 16);
        for shift in (0..count).rev() {
            self.buf = (self.buf << 1) | ((value >> shift) & 1) as u8;
            self.bit_len += 1;
            if self.bit_len == 8 {
                self.writer.write_all(&[self.buf])?;
                self.buf = 0;
                self.bit_len = 0;
            }
        }
        Ok(())
    }

    /// Zero pad to the byte boundary and flush.
    pub fn finish(mut self) -> io::Result<W> {
        if self.bit_len != 0 {
            let pad = 8 - self.bit_len;
            trace!("pad {pad} bits");
            self.writer.write_all(&[self.buf << pad])?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// MSB-first bit accumulator, fed a byte at a time.
#[derive(Debug, Default)]
pub(crate) struct BitReader {
    acc: u32,
    bit_len: u8,
}

impl BitReader {
    #[inline(always)]
    pub fn feed(&mut self, byte: u8) {
        debug_assert!(self.bit_len <= 24);
        self.acc = (self.acc << 8) | byte as u32;
        self.bit_len += 8;
    }

    /// Take `count` bits if that many are buffered.
    #[inline(always)]
    pub fn take(&mut self, count: u8) -> Option<u16> {
        if self.bit_len < count {
            return None;
        }
        self.bit_len -= count;
        let value = (self.acc >> self.bit_len) & ((1 << count) - 1);
        self.acc &= (1 << self.bit_len) - 1;
        Some(value as u16)
    }

    pub fn bit_len(&self) -> u8 {
        self.bit_len
    }

    /// Whether every buffered bit is zero.
    pub fn is_zero(&self) -> bool {
        self.acc == 0
    }
}
