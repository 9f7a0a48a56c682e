mod section_header;

use std::{
    io::{Read, Seek},
    slice,
};

pub use section_header::SectionHeader;
use thiserror::Error;

use super::read_record;
use crate::error::PeError;

#[derive(Error, Debug, Eq, PartialEq)]
pub enum RvaError {
    #[error("RVA {0:#X} is not backed by the raw data of any section")]
    Unmapped(u32),
    #[error("RVA {rva:#X} is claimed by {count} sections")]
    Ambiguous { rva: u32, count: usize },
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[repr(transparent)]
pub struct SectionTable(Vec<SectionHeader>);

impl SectionTable {
    pub fn read_from<R>(mut src: R, offset: u64, number_of_sections: u16) -> Result<Self, PeError>
    where
        R: Read + Seek,
    {
        (0..u64::from(number_of_sections))
            .map(|index| {
                read_record(
                    &mut src,
                    offset + index * size_of::<SectionHeader>() as u64,
                    "section header",
                )
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    #[inline]
    pub fn sections(&self) -> &[SectionHeader] {
        &self.0
    }

    pub fn find_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.0.iter().find(|section| section.name() == name)
    }

    /// Translates an RVA into a file offset through the one section whose raw data covers it.
    pub fn to_file_offset(&self, rva: u32) -> Result<(u64, &SectionHeader), RvaError> {
        let mut matches = self.0.iter().filter(|section| section.contains_rva(rva));

        let section = matches.next().ok_or(RvaError::Unmapped(rva))?;

        let extra = matches.count();
        if extra != 0 {
            return Err(RvaError::Ambiguous {
                rva,
                count: extra + 1,
            });
        }

        let offset = u64::from(section.pointer_to_raw_data())
            + u64::from(rva - section.virtual_address());
        Ok((offset, section))
    }
}

impl<'table> IntoIterator for &'table SectionTable {
    type Item = &'table SectionHeader;

    type IntoIter = slice::Iter<'table, SectionHeader>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
