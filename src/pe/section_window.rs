use std::{
    cmp, fmt,
    io::{self, Read, Seek, SeekFrom, Write},
};

/// A read/write view over `[start, start + length)` of an underlying stream.
///
/// Positions are relative to `start` and tracked independently of the inner stream, which is
/// repositioned before every read and write, so several windows may take turns over one parent.
/// Seeking past `length` is allowed, but reads there return EOF and writes there write nothing:
/// the window never grows its parent.
///
/// Whether dropping the window closes the parent depends on what it wraps. A window over
/// `&mut File` leaves the file open, a window over an owned `File` closes it, and
/// [`into_inner`](Self::into_inner) hands the parent back either way.
pub struct SectionWindow<S> {
    inner: S,
    start: u64,
    length: u64,
    position: u64, // Position within the window (0-based)
}

impl<S: Seek> SectionWindow<S> {
    pub fn new(mut inner: S, start: u64, length: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;

        Ok(Self {
            inner,
            start,
            length,
            position: 0,
        })
    }

    /// Returns the current position within the window (0-based).
    #[inline]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Returns the remaining bytes in the window.
    #[inline]
    pub const fn remaining(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    #[inline]
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn sync_inner(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(self.start + self.position))?;
        Ok(())
    }
}

impl<S: Read + Seek> Read for SectionWindow<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0); // EOF
        }

        self.sync_inner()?;

        // Limit read to remaining bytes in window
        let to_read = cmp::min(buf.len() as u64, remaining) as usize;
        let bytes_read = self.inner.read(&mut buf[..to_read])?;

        self.position += bytes_read as u64;
        Ok(bytes_read)
    }
}

impl<S: Write + Seek> Write for SectionWindow<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        self.sync_inner()?;

        let to_write = cmp::min(buf.len() as u64, remaining) as usize;
        let bytes_written = self.inner.write(&buf[..to_write])?;

        self.position += bytes_written as u64;
        Ok(bytes_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<S: Seek> Seek for SectionWindow<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let new_position = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(offset) => self.length.checked_add_signed(offset),
            SeekFrom::Current(offset) => self.position.checked_add_signed(offset),
        };

        self.position = new_position.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        Ok(self.position)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

impl<S> fmt::Debug for SectionWindow<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionWindow")
            .field("start", &self.start)
            .field("length", &self.length)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
