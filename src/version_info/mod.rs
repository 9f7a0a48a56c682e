//! The `VS_VERSIONINFO` resource.
//!
//! Every node is a [`VersionHeader`] followed by an optional value and child nodes, each field
//! padded to a 32-bit boundary relative to the start of the resource. Lengths are always derived
//! from the tree when encoding, so editing a string is enough to produce a consistent resource.

mod file_flags;
mod fixed_file_info;
mod header;
mod string_file_info;
mod string_table;
mod translation;
mod var_file_info;

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

pub use file_flags::FileFlags;
pub use fixed_file_info::FixedFileInfo;
pub use header::{VersionDataType, VersionHeader};
pub use string_file_info::StringFileInfo;
pub use string_table::StringTable;
use tracing::warn;
pub use translation::Translation;
pub use var_file_info::VarFileInfo;

use crate::{
    binary::{ReadBytesExt, WriteBytesExt, skip_padding, write_padding},
    error::VersionResourceError,
};

/// A child of the root node, kept in the order it was read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum VersionChild {
    VarFileInfo(VarFileInfo),
    StringFileInfo(StringFileInfo),
}

impl VersionChild {
    pub const fn key(&self) -> &'static str {
        match self {
            Self::VarFileInfo(_) => VarFileInfo::KEY,
            Self::StringFileInfo(_) => StringFileInfo::KEY,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::VarFileInfo(var_file_info) => var_file_info.size(),
            Self::StringFileInfo(string_file_info) => string_file_info.size(),
        }
    }

    fn write<W>(&self, writer: W) -> Result<(), VersionResourceError>
    where
        W: Write + Seek,
    {
        match self {
            Self::VarFileInfo(var_file_info) => var_file_info.write(writer),
            Self::StringFileInfo(string_file_info) => string_file_info.write(writer),
        }
    }
}

/// A decoded `VS_VERSIONINFO` tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VersionInfo {
    fixed_file_info: Option<FixedFileInfo>,
    children: Vec<VersionChild>,
}

impl VersionInfo {
    pub const KEY: &'static str = "VS_VERSION_INFO";

    pub const fn new(fixed_file_info: Option<FixedFileInfo>, children: Vec<VersionChild>) -> Self {
        Self {
            fixed_file_info,
            children,
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, VersionResourceError> {
        Self::read_from(Cursor::new(data))
    }

    /// Decodes the tree starting at the current position of `reader`. The resource may not extend
    /// past the end of the stream.
    pub fn read_from<R>(mut reader: R) -> Result<Self, VersionResourceError>
    where
        R: Read + Seek,
    {
        let start = reader.stream_position()?;
        let limit = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        let header = VersionHeader::read_from(&mut reader, limit)?;
        header.expect_key(Self::KEY)?;
        header.expect_type(VersionDataType::Binary)?;

        let fixed_file_info = if header.value_length == 0 {
            None
        } else {
            let value_start = reader.stream_position()?;
            if usize::from(header.value_length) != size_of::<FixedFileInfo>()
                || value_start + u64::from(header.value_length) > header.end()
            {
                return Err(VersionResourceError::format(
                    value_start,
                    format!(
                        "VS_FIXEDFILEINFO should be {} bytes but is {}",
                        size_of::<FixedFileInfo>(),
                        header.value_length
                    ),
                ));
            }

            let fixed_file_info = reader.read_t::<FixedFileInfo>()?;
            skip_padding(&mut reader)?;
            Some(fixed_file_info)
        };

        let mut children = Vec::<VersionChild>::new();
        while reader.stream_position()? < header.end() {
            let child_header = VersionHeader::read_from(&mut reader, header.end())?;

            let child = match child_header.key.as_str() {
                VarFileInfo::KEY => {
                    VersionChild::VarFileInfo(VarFileInfo::read_body(&mut reader, &child_header)?)
                }
                StringFileInfo::KEY => VersionChild::StringFileInfo(StringFileInfo::read_body(
                    &mut reader,
                    &child_header,
                )?),
                other => {
                    return Err(VersionResourceError::format(
                        child_header.offset,
                        format!("unexpected {other:?} node in {}", Self::KEY),
                    ));
                }
            };

            if children.iter().any(|existing| existing.key() == child.key()) {
                return Err(VersionResourceError::format(
                    child_header.offset,
                    format!("{} appears more than once", child.key()),
                ));
            }

            children.push(child);
            child_header.skip_to_end(&mut reader)?;
        }

        let info = Self {
            fixed_file_info,
            children,
        };

        if let Some(fixed_file_info) = info.fixed_file_info.filter(|info| !info.is_valid()) {
            warn!(
                "Ignoring VS_FIXEDFILEINFO with signature {:#010X}",
                fixed_file_info.signature()
            );
        }

        Ok(info)
    }

    /// The fixed file info, if present and valid.
    pub fn fixed_file_info(&self) -> Option<&FixedFileInfo> {
        self.fixed_file_info.as_ref().filter(|info| info.is_valid())
    }

    pub fn fixed_file_info_mut(&mut self) -> Option<&mut FixedFileInfo> {
        self.fixed_file_info.as_mut().filter(|info| info.is_valid())
    }

    #[inline]
    pub fn children(&self) -> &[VersionChild] {
        &self.children
    }

    pub fn var_file_info(&self) -> Option<&VarFileInfo> {
        self.children.iter().find_map(|child| match child {
            VersionChild::VarFileInfo(var_file_info) => Some(var_file_info),
            VersionChild::StringFileInfo(_) => None,
        })
    }

    pub fn string_file_info(&self) -> Option<&StringFileInfo> {
        self.children.iter().find_map(|child| match child {
            VersionChild::StringFileInfo(string_file_info) => Some(string_file_info),
            VersionChild::VarFileInfo(_) => None,
        })
    }

    pub fn string_file_info_mut(&mut self) -> Option<&mut StringFileInfo> {
        self.children.iter_mut().find_map(|child| match child {
            VersionChild::StringFileInfo(string_file_info) => Some(string_file_info),
            VersionChild::VarFileInfo(_) => None,
        })
    }

    pub fn translations(&self) -> &[Translation] {
        self.var_file_info()
            .map(|var_file_info| var_file_info.translations.as_slice())
            .unwrap_or_default()
    }

    pub fn string_tables(&self) -> impl Iterator<Item = &StringTable> {
        self.string_file_info()
            .into_iter()
            .flat_map(|string_file_info| &string_file_info.tables)
    }

    /// Returns `key` from the first string table that has it.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.string_tables().find_map(|table| table.get(key))
    }

    /// Replaces `key` in every string table that already has it. Returns the translation and
    /// previous value of each table that changed.
    pub fn replace_string(&mut self, key: &str, value: &str) -> Vec<(Translation, String)> {
        self.string_file_info_mut()
            .into_iter()
            .flat_map(|string_file_info| &mut string_file_info.tables)
            .filter_map(|table| {
                table
                    .replace(key, value)
                    .filter(|previous| previous != value)
                    .map(|previous| (table.translation, previous))
            })
            .collect()
    }

    /// The size of the encoded tree, which is also the `wLength` of the root node.
    pub fn total_size(&self) -> usize {
        let fixed_file_info_size = if self.fixed_file_info.is_some() {
            size_of::<FixedFileInfo>()
        } else {
            0
        };

        (VersionHeader::size(Self::KEY) + fixed_file_info_size).next_multiple_of(4)
            + self.children.iter().map(VersionChild::size).sum::<usize>()
    }

    pub fn encode(&self) -> Result<Vec<u8>, VersionResourceError> {
        let mut cursor = Cursor::new(Vec::with_capacity(self.total_size()));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    pub fn write<W>(&self, mut writer: W) -> Result<(), VersionResourceError>
    where
        W: Write + Seek,
    {
        let fixed_file_info_size = if self.fixed_file_info.is_some() {
            size_of::<FixedFileInfo>()
        } else {
            0
        };

        VersionHeader::write(
            &mut writer,
            self.total_size(),
            fixed_file_info_size,
            VersionDataType::Binary,
            Self::KEY,
        )?;

        if let Some(fixed_file_info) = &self.fixed_file_info {
            writer.write_t(fixed_file_info)?;
            write_padding(&mut writer)?;
        }

        for child in &self.children {
            child.write(&mut writer)?;
        }

        Ok(())
    }
}
