mod data_directories;
mod standard_fields;
mod windows_fields;

use std::io::{Read, Seek};

pub use data_directories::{DataDirectories, DataDirectory};
pub use standard_fields::{Magic, StandardFields, StandardFields32, StandardFields64};
use tracing::debug;
pub use windows_fields::{WindowsFields, WindowsFields32, WindowsFields64};

use super::read_record;
use crate::error::PeError;

/// `IMAGE_OPTIONAL_HEADER32` or `IMAGE_OPTIONAL_HEADER64`, chosen by [`Magic`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptionalHeader {
    pub standard_fields: StandardFields,
    pub windows_fields: WindowsFields,
    pub data_directories: DataDirectories,
}

impl OptionalHeader {
    /// Reads the optional header starting at `offset`. `size_of_optional_header` comes from the
    /// COFF header and bounds the data directory array.
    pub fn read_from<R>(
        mut src: R,
        offset: u64,
        size_of_optional_header: u16,
    ) -> Result<Self, PeError>
    where
        R: Read + Seek,
    {
        let magic = read_record::<Magic, _>(&mut src, offset, "optional header magic")?;

        let standard_fields: StandardFields = match magic {
            Magic::Pe32 => {
                read_record::<StandardFields32, _>(&mut src, offset, "PE32 standard fields")?.into()
            }
            Magic::Pe32Plus => {
                read_record::<StandardFields64, _>(&mut src, offset, "PE32+ standard fields")?
                    .into()
            }
        };

        let windows_offset = offset + standard_fields.size() as u64;
        let windows_fields = match magic {
            Magic::Pe32 => WindowsFields::Pe32(read_record(
                &mut src,
                windows_offset,
                "PE32 windows fields",
            )?),
            Magic::Pe32Plus => WindowsFields::Pe32Plus(read_record(
                &mut src,
                windows_offset,
                "PE32+ windows fields",
            )?),
        };

        let directories_offset = windows_offset + windows_fields.size() as u64;
        let count = u64::from(windows_fields.number_of_rva_and_sizes());
        let directories_end = directories_offset + count * size_of::<DataDirectory>() as u64;
        if directories_end > offset + u64::from(size_of_optional_header) {
            return Err(PeError::format(
                directories_offset,
                "data directories",
                format!(
                    "{count} data directories do not fit in an optional header of {size_of_optional_header} bytes"
                ),
            ));
        }

        let data_directories = (0..count)
            .map(|index| {
                read_record::<DataDirectory, _>(
                    &mut src,
                    directories_offset + index * size_of::<DataDirectory>() as u64,
                    "data directory",
                )
            })
            .collect::<Result<Vec<_>, _>>()?
            .into();

        debug!(
            magic = magic.as_str(),
            data_directories = count,
            "Read optional header at {offset:#X}"
        );

        Ok(Self {
            standard_fields,
            windows_fields,
            data_directories,
        })
    }

    #[inline]
    pub const fn magic(&self) -> Magic {
        self.standard_fields.magic()
    }

    /// The offset of the `CheckSum` field from the start of the optional header. It is 64 for both
    /// `PE32` and `PE32+`, since the wider image base replaces `BaseOfData`.
    pub const fn check_sum_offset(&self) -> usize {
        self.standard_fields.size() + self.windows_fields.check_sum_offset()
    }
}
