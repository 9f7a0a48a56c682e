use std::io::{Result, Seek, SeekFrom, Write};

/// Every node of a version resource starts on a 32-bit boundary.
pub const DWORD: u64 = size_of::<u32>() as u64;

/// Advances a reader to the next multiple of [`DWORD`], returning the new position.
pub fn skip_padding<S: Seek + ?Sized>(stream: &mut S) -> Result<u64> {
    let position = stream.stream_position()?;
    let aligned = position.next_multiple_of(DWORD);

    if aligned != position {
        stream.seek(SeekFrom::Start(aligned))?;
    }

    Ok(aligned)
}

/// Writes zero bytes until the writer is at the next multiple of [`DWORD`], returning the new
/// position.
pub fn write_padding<W: Write + Seek + ?Sized>(writer: &mut W) -> Result<u64> {
    const ZEROES: [u8; DWORD as usize] = [0; DWORD as usize];

    let position = writer.stream_position()?;
    let aligned = position.next_multiple_of(DWORD);

    writer.write_all(&ZEROES[..(aligned - position) as usize])?;

    Ok(aligned)
}
