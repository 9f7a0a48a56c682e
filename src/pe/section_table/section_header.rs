use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, U16, U32};

/// `IMAGE_SECTION_HEADER`.
#[derive(Copy, Clone, Eq, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct SectionHeader {
    name: [u8; 8],
    virtual_size: U32<LittleEndian>,
    virtual_address: U32<LittleEndian>,
    size_of_raw_data: U32<LittleEndian>,
    pointer_to_raw_data: U32<LittleEndian>,
    pointer_to_relocations: U32<LittleEndian>,
    pointer_to_line_numbers: U32<LittleEndian>,
    number_of_relocations: U16<LittleEndian>,
    number_of_line_numbers: U16<LittleEndian>,
    characteristics: U32<LittleEndian>,
}

impl SectionHeader {
    pub fn name(&self) -> &str {
        std::str::from_utf8(&self.name)
            .map(|name| name.trim_end_matches('\0'))
            .unwrap_or_default()
    }

    #[inline]
    pub const fn virtual_size(&self) -> u32 {
        self.virtual_size.get()
    }

    #[inline]
    pub const fn virtual_address(&self) -> u32 {
        self.virtual_address.get()
    }

    #[inline]
    pub const fn size_of_raw_data(&self) -> u32 {
        self.size_of_raw_data.get()
    }

    #[inline]
    pub const fn pointer_to_raw_data(&self) -> u32 {
        self.pointer_to_raw_data.get()
    }

    #[inline]
    pub const fn characteristics(&self) -> u32 {
        self.characteristics.get()
    }

    /// Whether `rva` falls inside the part of the section that is backed by file data.
    pub fn contains_rva(&self, rva: u32) -> bool {
        let start = u64::from(self.virtual_address());
        (start..start + u64::from(self.size_of_raw_data())).contains(&u64::from(rva))
    }

    /// The file offset one past the section's raw data.
    #[inline]
    pub fn raw_data_end(&self) -> u64 {
        u64::from(self.pointer_to_raw_data()) + u64::from(self.size_of_raw_data())
    }

    /// The file offset one past the raw data the loader maps, which stops at `VirtualSize` when
    /// the raw data is padded beyond it. A zero `VirtualSize` maps all of the raw data.
    pub fn mapped_data_end(&self) -> u64 {
        let mapped = match self.virtual_size() {
            0 => self.size_of_raw_data(),
            virtual_size => virtual_size.min(self.size_of_raw_data()),
        };
        u64::from(self.pointer_to_raw_data()) + u64::from(mapped)
    }
}

impl fmt::Debug for SectionHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("Name", &self.name())
            .field("VirtualSize", &self.virtual_size())
            .field("VirtualAddress", &self.virtual_address())
            .field("SizeOfRawData", &self.size_of_raw_data())
            .field("PointerToRawData", &self.pointer_to_raw_data())
            .field("Characteristics", &self.characteristics())
            .finish_non_exhaustive()
    }
}
