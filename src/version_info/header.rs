use std::io::{self, Read, Seek, SeekFrom, Write};

use zerocopy::{Immutable, IntoBytes, KnownLayout, LittleEndian, TryFromBytes, U16};

use crate::{
    binary::{ReadBytesExt, WriteBytesExt, skip_padding, write_padding},
    error::VersionResourceError,
};

/// `wType` of a version node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(u16)]
pub enum VersionDataType {
    Binary = 0_u16.to_le(),
    Text = 1_u16.to_le(),
}

#[derive(Copy, Clone, TryFromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct RawHeader {
    length: U16<LittleEndian>,
    value_length: U16<LittleEndian>,
    value_type: VersionDataType,
}

/// The header shared by every node of a `VS_VERSIONINFO` tree: `wLength`, `wValueLength`,
/// `wType` and the null-terminated `szKey`, padded to a 32-bit boundary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionHeader {
    /// Offset of the node from the start of the resource.
    pub offset: u64,
    pub length: u16,
    pub value_length: u16,
    pub value_type: VersionDataType,
    pub key: String,
}

impl VersionHeader {
    /// Reads a node header and leaves `reader` at the 32-bit boundary after the key.
    ///
    /// The node must end at or before `parent_end` and must be long enough to hold its own header.
    pub fn read_from<R>(mut reader: R, parent_end: u64) -> Result<Self, VersionResourceError>
    where
        R: Read + Seek,
    {
        let offset = reader.stream_position()?;

        let raw = reader.try_read_t::<RawHeader>().map_err(|error| eof(error, offset))?;
        let raw = raw.ok_or_else(|| {
            VersionResourceError::format(offset, "node type is neither binary nor text")
        })?;

        let key = reader.read_utf16_nul().map_err(|error| eof(error, offset))?;
        let key_end = reader.stream_position()?;
        skip_padding(&mut reader)?;

        let header = Self {
            offset,
            length: raw.length.get(),
            value_length: raw.value_length.get(),
            value_type: raw.value_type,
            key,
        };

        if header.end() > parent_end {
            return Err(VersionResourceError::format(
                offset,
                format!(
                    "{} ends at {:#X}, past the end of its parent at {parent_end:#X}",
                    header.key,
                    header.end()
                ),
            ));
        }

        if key_end > header.end() {
            return Err(VersionResourceError::format(
                offset,
                format!(
                    "{} declares {} bytes which does not cover its own header",
                    header.key, header.length
                ),
            ));
        }

        Ok(header)
    }

    /// The offset one past the last byte of the node.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.length)
    }

    pub fn expect_key(&self, key: &str) -> Result<(), VersionResourceError> {
        if self.key == key {
            Ok(())
        } else {
            Err(VersionResourceError::format(
                self.offset,
                format!("expected {key} but found {:?}", self.key),
            ))
        }
    }

    pub fn expect_type(&self, value_type: VersionDataType) -> Result<(), VersionResourceError> {
        if self.value_type == value_type {
            Ok(())
        } else {
            Err(VersionResourceError::format(
                self.offset,
                format!("{} should be {value_type:?} but is {:?}", self.key, self.value_type),
            ))
        }
    }

    /// Moves `reader` to the 32-bit boundary after the end of this node.
    pub fn skip_to_end<R: Seek>(&self, mut reader: R) -> io::Result<()> {
        reader.seek(SeekFrom::Start(self.end()))?;
        skip_padding(&mut reader)?;
        Ok(())
    }

    /// The size of a header with `key`, including the padding after the key.
    pub fn size(key: &str) -> usize {
        (size_of::<RawHeader>() + (key.encode_utf16().count() + 1) * size_of::<u16>())
            .next_multiple_of(4)
    }

    pub fn write<W>(
        mut writer: W,
        length: usize,
        value_length: usize,
        value_type: VersionDataType,
        key: &str,
    ) -> Result<(), VersionResourceError>
    where
        W: Write + Seek,
    {
        let raw = RawHeader {
            length: U16::new(to_u16(length, key)?),
            value_length: U16::new(to_u16(value_length, key)?),
            value_type,
        };

        writer.write_t(&raw)?;
        writer.write_utf16_nul(key)?;
        write_padding(&mut writer)?;
        Ok(())
    }
}

fn to_u16(size: usize, node: &str) -> Result<u16, VersionResourceError> {
    u16::try_from(size).map_err(|_| VersionResourceError::TooLarge {
        node: node.to_owned(),
        size,
    })
}

fn eof(error: io::Error, offset: u64) -> VersionResourceError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        VersionResourceError::format(offset, "the resource ends inside a node header")
    } else {
        error.into()
    }
}
