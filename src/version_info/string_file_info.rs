use std::io::{Read, Seek, Write};

use tracing::trace;

use super::{StringTable, VersionDataType, VersionHeader};
use crate::error::VersionResourceError;

/// `StringFileInfo`: one [`StringTable`] per language.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StringFileInfo {
    pub tables: Vec<StringTable>,
}

impl StringFileInfo {
    pub const KEY: &'static str = "StringFileInfo";

    pub fn read_body<R>(mut reader: R, header: &VersionHeader) -> Result<Self, VersionResourceError>
    where
        R: Read + Seek,
    {
        header.expect_type(VersionDataType::Text)?;

        let mut tables = Vec::new();
        while reader.stream_position()? < header.end() {
            let table_header = VersionHeader::read_from(&mut reader, header.end())?;
            let table = StringTable::read_body(&mut reader, &table_header)?;
            trace!(
                translation = %table.translation,
                strings = table.strings.len(),
                "Read string table"
            );
            tables.push(table);
            table_header.skip_to_end(&mut reader)?;
        }

        Ok(Self { tables })
    }

    pub fn size(&self) -> usize {
        VersionHeader::size(Self::KEY) + self.tables.iter().map(StringTable::size).sum::<usize>()
    }

    pub fn write<W>(&self, mut writer: W) -> Result<(), VersionResourceError>
    where
        W: Write + Seek,
    {
        VersionHeader::write(&mut writer, self.size(), 0, VersionDataType::Text, Self::KEY)?;
        for table in &self.tables {
            table.write(&mut writer)?;
        }
        Ok(())
    }
}
