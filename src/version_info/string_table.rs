use std::io::{Read, Seek, Write};

use indexmap::{IndexMap, map::Entry};
use zerocopy::LE;

use super::{Translation, VersionDataType, VersionHeader};
use crate::{
    binary::{ReadBytesExt, WriteBytesExt, write_padding},
    error::VersionResourceError,
};

/// A `StringTable`: the strings for one language and code page, in file order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StringTable {
    pub translation: Translation,
    pub strings: IndexMap<String, String>,
}

impl StringTable {
    pub fn new(translation: Translation) -> Self {
        Self {
            translation,
            strings: IndexMap::new(),
        }
    }

    /// Reads the strings of a table whose header has already been consumed.
    pub fn read_body<R>(mut reader: R, header: &VersionHeader) -> Result<Self, VersionResourceError>
    where
        R: Read + Seek,
    {
        header.expect_type(VersionDataType::Text)?;
        let translation = parse_key(header)?;

        let mut strings = IndexMap::new();
        while reader.stream_position()? < header.end() {
            // Some resource compilers mark strings as binary; their values are read as text
            // regardless and re-emitted as text.
            let string = VersionHeader::read_from(&mut reader, header.end())?;

            let value = if string.value_length == 0 {
                String::new()
            } else {
                read_value(&mut reader, string.end())?
            };
            string.skip_to_end(&mut reader)?;

            match strings.entry(string.key) {
                Entry::Occupied(entry) => {
                    return Err(VersionResourceError::format(
                        string.offset,
                        format!("{} appears twice in string table {translation}", entry.key()),
                    ));
                }
                Entry::Vacant(entry) => {
                    entry.insert(value);
                }
            }
        }

        Ok(Self {
            translation,
            strings,
        })
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    /// Replaces the value of an existing string, returning the previous value. Keys that are not
    /// in the table are not added.
    pub fn replace(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        self.strings
            .get_mut(key)
            .map(|existing| std::mem::replace(existing, value.into()))
    }

    fn string_size(key: &str, value: &str) -> usize {
        (VersionHeader::size(key) + (value.encode_utf16().count() + 1) * size_of::<u16>())
            .next_multiple_of(4)
    }

    pub fn size(&self) -> usize {
        VersionHeader::size(&self.translation.to_string())
            + self
                .strings
                .iter()
                .map(|(key, value)| Self::string_size(key, value))
                .sum::<usize>()
    }

    pub fn write<W>(&self, mut writer: W) -> Result<(), VersionResourceError>
    where
        W: Write + Seek,
    {
        VersionHeader::write(
            &mut writer,
            self.size(),
            0,
            VersionDataType::Text,
            &self.translation.to_string(),
        )?;

        for (key, value) in &self.strings {
            VersionHeader::write(
                &mut writer,
                Self::string_size(key, value),
                value.encode_utf16().count() + 1,
                VersionDataType::Text,
                key,
            )?;
            writer.write_utf16_nul(value)?;
            write_padding(&mut writer)?;
        }

        Ok(())
    }
}

/// Parses the 8 hex digit key, language identifier first.
fn parse_key(header: &VersionHeader) -> Result<Translation, VersionResourceError> {
    let key = &header.key;
    if key.len() != 8 || !key.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return Err(VersionResourceError::format(
            header.offset,
            format!("string table key {key:?} is not 8 hexadecimal digits"),
        ));
    }

    let language = u16::from_str_radix(&key[..4], 16);
    let code_page = u16::from_str_radix(&key[4..], 16);
    match (language, code_page) {
        (Ok(language), Ok(code_page)) => Ok(Translation::new(language, code_page)),
        _ => Err(VersionResourceError::format(
            header.offset,
            format!("string table key {key:?} is not 8 hexadecimal digits"),
        )),
    }
}

/// Reads a null-terminated UTF-16 value that may not run past `end`.
fn read_value<R>(mut reader: R, end: u64) -> Result<String, VersionResourceError>
where
    R: Read + Seek,
{
    let mut units = Vec::new();
    while reader.stream_position()? + size_of::<u16>() as u64 <= end {
        match reader.read_u16::<LE>()? {
            0 => break,
            unit => units.push(unit),
        }
    }

    Ok(String::from_utf16_lossy(&units))
}
