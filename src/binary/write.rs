use std::io::{Result, Write};

use zerocopy::{ByteOrder, Immutable, IntoBytes, LE, U16, U32};

/// Extends [`Write`] with the inverse of each method in [`ReadBytesExt`](super::ReadBytesExt).
pub trait WriteBytesExt: Write {
    /// Writes the exact byte representation of a fixed-layout record.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Write::write_all`].
    #[inline]
    fn write_t<T: IntoBytes + Immutable>(&mut self, value: &T) -> Result<()> {
        self.write_all(value.as_bytes())
    }

    #[inline]
    fn write_u16<T: ByteOrder>(&mut self, value: u16) -> Result<()> {
        self.write_t(&U16::<T>::new(value))
    }

    #[inline]
    fn write_u32<T: ByteOrder>(&mut self, value: u32) -> Result<()> {
        self.write_t(&U32::<T>::new(value))
    }

    /// Writes a string as UTF-16LE code units followed by a zero code unit. An empty string still
    /// emits its terminator.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Write::write_all`].
    fn write_utf16_nul(&mut self, value: &str) -> Result<()> {
        for unit in value.encode_utf16() {
            self.write_u16::<LE>(unit)?;
        }
        self.write_u16::<LE>(0)
    }
}

impl<W: Write + ?Sized> WriteBytesExt for W {}
