use std::io::{Read, Seek, Write};

use tracing::trace;

use super::{Translation, VersionDataType, VersionHeader};
use crate::{
    binary::{ReadBytesExt, WriteBytesExt, write_padding},
    error::VersionResourceError,
};

/// `VarFileInfo` with its single `Translation` value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VarFileInfo {
    pub translations: Vec<Translation>,
}

impl VarFileInfo {
    pub const KEY: &'static str = "VarFileInfo";
    const TRANSLATION: &'static str = "Translation";

    /// Reads the children of a `VarFileInfo` node whose header has already been consumed.
    pub fn read_body<R>(mut reader: R, header: &VersionHeader) -> Result<Self, VersionResourceError>
    where
        R: Read + Seek,
    {
        header.expect_type(VersionDataType::Text)?;

        let mut translations = None;
        while reader.stream_position()? < header.end() {
            let var = VersionHeader::read_from(&mut reader, header.end())?;
            var.expect_key(Self::TRANSLATION)?;
            var.expect_type(VersionDataType::Binary)?;

            if translations.is_some() {
                return Err(VersionResourceError::format(
                    var.offset,
                    "VarFileInfo has more than one Translation",
                ));
            }

            let value_length = u64::from(var.value_length);
            let value_start = reader.stream_position()?;
            if value_length % size_of::<Translation>() as u64 != 0
                || value_start + value_length > var.end()
            {
                return Err(VersionResourceError::format(
                    var.offset,
                    format!("invalid Translation value of {value_length} bytes"),
                ));
            }

            let pairs = (0..value_length / size_of::<Translation>() as u64)
                .map(|_| reader.read_t::<Translation>())
                .collect::<Result<Vec<_>, _>>()?;
            trace!(?pairs, "Read translations");

            translations = Some(pairs);
            var.skip_to_end(&mut reader)?;
        }

        translations
            .map(|translations| Self { translations })
            .ok_or_else(|| {
                VersionResourceError::format(header.offset, "VarFileInfo has no Translation")
            })
    }

    fn var_size(&self) -> usize {
        VersionHeader::size(Self::TRANSLATION) + self.translations.len() * size_of::<Translation>()
    }

    pub fn size(&self) -> usize {
        VersionHeader::size(Self::KEY) + self.var_size()
    }

    pub fn write<W>(&self, mut writer: W) -> Result<(), VersionResourceError>
    where
        W: Write + Seek,
    {
        VersionHeader::write(&mut writer, self.size(), 0, VersionDataType::Text, Self::KEY)?;
        VersionHeader::write(
            &mut writer,
            self.var_size(),
            self.translations.len() * size_of::<Translation>(),
            VersionDataType::Binary,
            Self::TRANSLATION,
        )?;

        for translation in &self.translations {
            writer.write_t(translation)?;
        }
        write_padding(&mut writer)?;

        Ok(())
    }
}
