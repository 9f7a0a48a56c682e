use std::io::{Read, Result};

use zerocopy::{ByteOrder, FromBytes, Immutable, KnownLayout, LE, TryFromBytes, U16, U32};

/// Extends [`Read`] with methods for reading fixed-layout records and numbers.
///
/// Most of the numeric methods have an unconstrained byte order parameter that must be explicitly
/// instantiated, typically with [`LittleEndian`](zerocopy::LittleEndian).
pub trait ReadBytesExt: Read {
    /// Reads a type that implements [`FromBytes`] from the underlying reader.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Read::read_exact`].
    #[inline]
    fn read_t<T: FromBytes>(&mut self) -> Result<T> {
        T::read_from_io(self)
    }

    /// Reads a type whose bytes may not all be valid bit patterns, such as a record that embeds a
    /// signature enum.
    ///
    /// Returns `Ok(None)` if the bytes were read but do not form a valid `T`.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Read::read_exact`].
    fn try_read_t<T>(&mut self) -> Result<Option<T>>
    where
        T: TryFromBytes + KnownLayout + Immutable,
    {
        let mut buf = vec![0; size_of::<T>()];
        self.read_exact(&mut buf)?;
        Ok(T::try_read_from_bytes(&buf).ok())
    }

    /// Reads an unsigned 16-bit integer from the underlying reader.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Read::read_exact`].
    #[inline]
    fn read_u16<T: ByteOrder>(&mut self) -> Result<u16> {
        U16::<T>::read_from_io(self).map(U16::get)
    }

    /// Reads an unsigned 32-bit integer from the underlying reader.
    ///
    /// # Errors
    ///
    /// This method returns the same errors as [`Read::read_exact`].
    #[inline]
    fn read_u32<T: ByteOrder>(&mut self) -> Result<u32> {
        U32::<T>::read_from_io(self).map(U32::get)
    }

    /// Reads UTF-16LE code units up to and including a zero code unit, returning the units before
    /// the terminator as a string. Unpaired surrogates are replaced with
    /// [`char::REPLACEMENT_CHARACTER`].
    ///
    /// # Errors
    ///
    /// Returns [`UnexpectedEof`](std::io::ErrorKind::UnexpectedEof) if the reader ends before a
    /// terminator is found.
    fn read_utf16_nul(&mut self) -> Result<String> {
        let mut units = Vec::new();
        loop {
            match self.read_u16::<LE>()? {
                0 => break,
                unit => units.push(unit),
            }
        }

        Ok(char::decode_utf16(units)
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect())
    }
}

/// All types that implement `Read` get methods defined in `ReadBytesExt` for free.
impl<R: Read + ?Sized> ReadBytesExt for R {}
