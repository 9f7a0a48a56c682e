mod image;

use std::{
    io::{Read, Seek},
    ops::Range,
};

pub use image::{ImageResourceDataEntry, ImageResourceDirectory, ImageResourceDirectoryEntry};

use super::read_record;
use crate::error::PeError;

/// `RT_VERSION`, the resource type of `VS_VERSIONINFO`.
pub const RT_VERSION: u32 = 16;

/// A resource directory table together with its entries.
#[derive(Clone, Debug)]
pub struct ResourceDirectoryTable {
    offset: u64,
    header: ImageResourceDirectory,
    entries: Vec<ImageResourceDirectoryEntry>,
}

impl ResourceDirectoryTable {
    /// Reads the table at the absolute file `offset`.
    pub fn read_from<R>(mut src: R, offset: u64) -> Result<Self, PeError>
    where
        R: Read + Seek,
    {
        let header = read_record::<ImageResourceDirectory, _>(
            &mut src,
            offset,
            "resource directory table",
        )?;

        let entries_offset = offset + size_of::<ImageResourceDirectory>() as u64;
        let entries = (0..header.number_of_entries() as u64)
            .map(|index| {
                read_record(
                    &mut src,
                    entries_offset + index * size_of::<ImageResourceDirectoryEntry>() as u64,
                    "resource directory entry",
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            offset,
            header,
            entries,
        })
    }

    #[inline]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub const fn header(&self) -> &ImageResourceDirectory {
        &self.header
    }

    /// The bytes taken by the table header and its entries.
    pub fn extent(&self) -> Range<u64> {
        let length = size_of::<ImageResourceDirectory>()
            + self.entries.len() * size_of::<ImageResourceDirectoryEntry>();
        self.offset..self.offset + length as u64
    }

    pub fn find_id_entry(&self, id: u32) -> Option<&ImageResourceDirectoryEntry> {
        self.id_entries().find(|entry| entry.id() == Some(id))
    }

    /// Returns the single entry of this table, or `None` if it has zero or several.
    pub fn sole_entry(&self) -> Option<&ImageResourceDirectoryEntry> {
        match self.entries.as_slice() {
            [entry] => Some(entry),
            _ => None,
        }
    }

    #[inline]
    pub fn name_entries(&self) -> impl Iterator<Item = &ImageResourceDirectoryEntry> {
        self.entries.iter().filter(|entry| entry.has_name())
    }

    #[inline]
    pub fn id_entries(&self) -> impl Iterator<Item = &ImageResourceDirectoryEntry> {
        self.entries.iter().filter(|entry| !entry.has_name())
    }

    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = &ImageResourceDirectoryEntry> {
        self.entries.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
