//! Test support: writes a bitstream MSB first so tests can assemble (and deliberately break) the
//! header fields of a compressed stream bit by bit.

/// Accumulates bits into bytes.
pub struct BitWriter {
    /// Output buffer used to write the bitstream.
    output: Vec<u8>,
    /// Private queue to hold bits that are waiting to be put as bytes into the output buffer.
    queue: u64,
    /// Count of valid bits in the queue.
    q_bits: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            queue: 0,
            q_bits: 0,
        }
    }

    /// Move all full bytes from the queue to the output buffer.
    fn push_queue(&mut self) {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.output.push(byte);
            self.q_bits -= 8;
        }
    }

    /// Put the low `n` (0-32) bits of `data` on the stream.
    pub fn out(&mut self, n: u8, data: u32) -> &mut Self {
        self.push_queue();
        if n > 0 {
            self.queue = self.queue << n | (data as u64 & ((1_u64 << n) - 1));
            self.q_bits += n;
        }
        self
    }

    /// Put one bit on the stream.
    pub fn bit(&mut self, bit: bool) -> &mut Self {
        self.out(1, bit as u32)
    }

    /// Put a byte on the stream.
    pub fn out8(&mut self, data: u8) -> &mut Self {
        self.out(8, data as u32)
    }

    /// Put a 48-bit signature on the stream.
    pub fn out48(&mut self, data: u64) -> &mut Self {
        self.out(24, (data >> 24) as u32).out(24, data as u32)
    }

    /// Flushes the remaining bits (1-7), padding with 0s in the least significant bits, and
    /// returns the finished stream.
    pub fn finish(mut self) -> Vec<u8> {
        self.push_queue();
        if self.q_bits > 0 {
            let byte = (self.queue << (8 - self.q_bits)) as u8;
            self.output.push(byte);
            self.q_bits = 0;
        }
        self.output
    }
}

#[cfg(test)]
mod test {
    use super::BitWriter;

    #[test]
    fn out8_test() {
        let mut bw = BitWriter::new();
        bw.out8(b'x');
        assert_eq!(bw.finish(), "x".as_bytes());
    }

    #[test]
    fn last_bits_test() {
        let mut bw = BitWriter::new();
        bw.out8(255).out8(1).out8(128).out8(255).out(3, 7);
        assert_eq!(bw.finish(), vec![255, 1, 128, 255, 224]);
    }

    #[test]
    fn mixed_widths() {
        let mut bw = BitWriter::new();
        bw.bit(true).out(3, 0b010).out(32, 0xdead_beef).out(4, 0xf);
        assert_eq!(bw.finish(), vec![0xad, 0xea, 0xdb, 0xee, 0xff]);
    }
}
