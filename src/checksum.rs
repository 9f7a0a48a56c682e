//! The PE image checksum.
//!
//! This is the algorithm behind `CheckSumMappedFile` in `imagehlp`, which the loader uses to
//! verify drivers and boot-critical images. It is not a CRC: the image is summed as little-endian
//! 32-bit words with an end-around carry, the 4-byte `CheckSum` field itself counting as zero, the
//! sum is folded to 16 bits and finally the file length is added.

use std::{io, io::Read, ops::Range};

const WORD: usize = size_of::<u32>();

/// A streaming PE checksum, fed with the image bytes in order.
#[derive(Clone, Debug)]
pub struct PeChecksum {
    checksum_field: Range<u64>,
    accumulator: u64,
    offset: u64,
    length: u64,
    pending: [u8; WORD],
    pending_len: usize,
}

impl PeChecksum {
    /// Creates a checksum for an image whose `CheckSum` field starts at `checksum_offset`.
    pub const fn new(checksum_offset: u64) -> Self {
        Self {
            checksum_field: checksum_offset..checksum_offset + WORD as u64,
            accumulator: 0,
            offset: 0,
            length: 0,
            pending: [0; WORD],
            pending_len: 0,
        }
    }

    /// Feeds the next run of image bytes.
    pub fn update(&mut self, mut bytes: &[u8]) {
        self.length += bytes.len() as u64;

        if self.pending_len != 0 {
            let take = (WORD - self.pending_len).min(bytes.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&bytes[..take]);
            self.pending_len += take;
            bytes = &bytes[take..];

            if self.pending_len < WORD {
                return;
            }

            self.pending_len = 0;
            self.add_word(self.pending);
        }

        let mut words = bytes.chunks_exact(WORD);
        for word in &mut words {
            self.add_word([word[0], word[1], word[2], word[3]]);
        }

        let remainder = words.remainder();
        self.pending[..remainder.len()].copy_from_slice(remainder);
        self.pending_len = remainder.len();
    }

    fn add_word(&mut self, mut word: [u8; WORD]) {
        let offset = self.offset;
        self.offset += WORD as u64;

        if offset < self.checksum_field.end && offset + WORD as u64 > self.checksum_field.start {
            for (byte_offset, byte) in (offset..).zip(&mut word) {
                if self.checksum_field.contains(&byte_offset) {
                    *byte = 0;
                }
            }
        }

        self.accumulator = (self.accumulator & 0xFFFF_FFFF)
            + u64::from(u32::from_le_bytes(word))
            + (self.accumulator >> 32);

        if self.accumulator > 1 << 32 {
            self.accumulator = (self.accumulator & 0xFFFF_FFFF) + (self.accumulator >> 32);
        }
    }

    /// Completes the checksum. Trailing bytes that do not fill a whole word are zero-padded.
    pub fn finalize(mut self) -> u32 {
        if self.pending_len != 0 {
            self.pending[self.pending_len..].fill(0);
            self.pending_len = 0;
            self.add_word(self.pending);
        }

        let mut checksum = self.accumulator;
        checksum = (checksum & 0xFFFF) + (checksum >> 16);
        checksum += checksum >> 16;
        checksum &= 0xFFFF;
        checksum += self.length;

        checksum as u32
    }
}

/// Computes the checksum of a complete in-memory image.
pub fn calculate(data: &[u8], checksum_offset: u64) -> u32 {
    let mut checksum = PeChecksum::new(checksum_offset);
    checksum.update(data);
    checksum.finalize()
}

/// Computes the checksum of an image by reading `reader` to its end.
pub fn calculate_from_reader<R: Read>(mut reader: R, checksum_offset: u64) -> io::Result<u32> {
    let mut checksum = PeChecksum::new(checksum_offset);
    let mut buf = vec![0; 1 << 16];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(read) => checksum.update(&buf[..read]),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }

    Ok(checksum.finalize())
}
