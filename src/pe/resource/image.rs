use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, U16, U32};

/// `IMAGE_RESOURCE_DIRECTORY`. Its entries follow immediately, named entries first.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ImageResourceDirectory {
    characteristics: U32<LittleEndian>,
    time_date_stamp: U32<LittleEndian>,
    major_version: U16<LittleEndian>,
    minor_version: U16<LittleEndian>,
    number_of_name_entries: U16<LittleEndian>,
    number_of_id_entries: U16<LittleEndian>,
}

impl ImageResourceDirectory {
    #[inline]
    pub const fn number_of_name_entries(&self) -> u16 {
        self.number_of_name_entries.get()
    }

    #[inline]
    pub const fn number_of_id_entries(&self) -> u16 {
        self.number_of_id_entries.get()
    }

    #[inline]
    pub const fn number_of_entries(&self) -> usize {
        self.number_of_name_entries() as usize + self.number_of_id_entries() as usize
    }
}

/// `IMAGE_RESOURCE_DIRECTORY_ENTRY`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ImageResourceDirectoryEntry {
    name_or_id: U32<LittleEndian>,
    offset_to_data_or_directory: U32<LittleEndian>,
}

impl ImageResourceDirectoryEntry {
    const HIGH_BIT: u32 = 1 << 31;

    #[inline]
    pub const fn has_name(self) -> bool {
        self.name_or_id.get() & Self::HIGH_BIT != 0
    }

    /// The integer identifier, unless the entry is named.
    #[inline]
    pub const fn id(self) -> Option<u32> {
        if self.has_name() {
            None
        } else {
            Some(self.name_or_id.get())
        }
    }

    /// The offset of the length-prefixed UTF-16 name, relative to the resource directory root.
    #[inline]
    pub const fn name_offset(self) -> Option<u32> {
        if self.has_name() {
            Some(self.name_or_id.get() & !Self::HIGH_BIT)
        } else {
            None
        }
    }

    /// Whether the entry points at another directory table rather than a data entry.
    #[inline]
    pub const fn is_table(self) -> bool {
        self.offset_to_data_or_directory.get() & Self::HIGH_BIT != 0
    }

    /// The offset of the table or data entry, relative to the resource directory root.
    #[inline]
    pub const fn data_offset(self) -> u32 {
        self.offset_to_data_or_directory.get() & !Self::HIGH_BIT
    }
}

/// `IMAGE_RESOURCE_DATA_ENTRY`, a leaf of the resource tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct ImageResourceDataEntry {
    /// RVA of the data, not an offset from the resource root.
    offset_to_data: U32<LittleEndian>,
    size: U32<LittleEndian>,
    codepage: U32<LittleEndian>,
    reserved: U32<LittleEndian>,
}

impl ImageResourceDataEntry {
    #[inline]
    pub const fn offset_to_data(&self) -> u32 {
        self.offset_to_data.get()
    }

    #[inline]
    pub const fn size(&self) -> u32 {
        self.size.get()
    }

    #[inline]
    pub fn set_size(&mut self, size: u32) {
        self.size.set(size);
    }

    #[inline]
    pub const fn codepage(&self) -> u32 {
        self.codepage.get()
    }
}
