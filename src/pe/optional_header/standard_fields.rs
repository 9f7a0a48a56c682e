use zerocopy::{Immutable, KnownLayout, LittleEndian, TryFromBytes, U32};

/// The discriminant at the very start of the optional header.
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, Immutable, KnownLayout)]
#[repr(u16)]
pub enum Magic {
    #[doc(alias = "IMAGE_NT_OPTIONAL_HDR32_MAGIC")]
    Pe32 = 0x10b_u16.to_le(),
    #[doc(alias = "IMAGE_NT_OPTIONAL_HDR64_MAGIC")]
    Pe32Plus = 0x20b_u16.to_le(),
}

impl Magic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pe32 => "PE32",
            Self::Pe32Plus => "PE32+",
        }
    }
}

// Only ever produced by validating bytes
#[expect(dead_code)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, Immutable, KnownLayout)]
#[repr(u16)]
enum Pe32Magic {
    Pe32 = 0x10b_u16.to_le(),
}

#[expect(dead_code)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, Immutable, KnownLayout)]
#[repr(u16)]
enum Pe32PlusMagic {
    Pe32Plus = 0x20b_u16.to_le(),
}

/// Standard COFF fields of a `PE32` optional header.
///
/// The record repeats the magic, so decoding it fails if its magic disagrees with the one the
/// header was dispatched on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct StandardFields32 {
    magic: Pe32Magic,
    #[doc(alias = "MajorLinkerVersion")]
    major_linker_version: u8,
    #[doc(alias = "MinorLinkerVersion")]
    minor_linker_version: u8,
    #[doc(alias = "SizeOfCode")]
    size_of_code: U32<LittleEndian>,
    #[doc(alias = "SizeOfInitializedData")]
    size_of_initialized_data: U32<LittleEndian>,
    #[doc(alias = "SizeOfUninitializedData")]
    size_of_uninitialized_data: U32<LittleEndian>,
    #[doc(alias = "AddressOfEntryPoint")]
    address_of_entry_point: U32<LittleEndian>,
    #[doc(alias = "BaseOfCode")]
    base_of_code: U32<LittleEndian>,
    /// Absent in `PE32+`.
    #[doc(alias = "BaseOfData")]
    base_of_data: U32<LittleEndian>,
}

/// Standard COFF fields of a `PE32+` optional header.
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct StandardFields64 {
    magic: Pe32PlusMagic,
    #[doc(alias = "MajorLinkerVersion")]
    major_linker_version: u8,
    #[doc(alias = "MinorLinkerVersion")]
    minor_linker_version: u8,
    #[doc(alias = "SizeOfCode")]
    size_of_code: U32<LittleEndian>,
    #[doc(alias = "SizeOfInitializedData")]
    size_of_initialized_data: U32<LittleEndian>,
    #[doc(alias = "SizeOfUninitializedData")]
    size_of_uninitialized_data: U32<LittleEndian>,
    #[doc(alias = "AddressOfEntryPoint")]
    address_of_entry_point: U32<LittleEndian>,
    #[doc(alias = "BaseOfCode")]
    base_of_code: U32<LittleEndian>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StandardFields {
    Pe32(StandardFields32),
    Pe32Plus(StandardFields64),
}

impl StandardFields {
    pub const fn magic(&self) -> Magic {
        match self {
            Self::Pe32(_) => Magic::Pe32,
            Self::Pe32Plus(_) => Magic::Pe32Plus,
        }
    }

    /// The linker version as `major.minor`.
    pub const fn linker_version(&self) -> (u8, u8) {
        match self {
            Self::Pe32(pe32) => (pe32.major_linker_version, pe32.minor_linker_version),
            Self::Pe32Plus(pe64) => (pe64.major_linker_version, pe64.minor_linker_version),
        }
    }

    pub const fn address_of_entry_point(&self) -> u32 {
        match self {
            Self::Pe32(pe32) => pe32.address_of_entry_point.get(),
            Self::Pe32Plus(pe64) => pe64.address_of_entry_point.get(),
        }
    }

    pub const fn base_of_data(&self) -> Option<u32> {
        match self {
            Self::Pe32(pe32) => Some(pe32.base_of_data.get()),
            Self::Pe32Plus(_) => None,
        }
    }

    /// The size of the standard fields record on disk.
    pub const fn size(&self) -> usize {
        match self {
            Self::Pe32(_) => size_of::<StandardFields32>(),
            Self::Pe32Plus(_) => size_of::<StandardFields64>(),
        }
    }
}

impl From<StandardFields32> for StandardFields {
    #[inline]
    fn from(fields: StandardFields32) -> Self {
        Self::Pe32(fields)
    }
}

impl From<StandardFields64> for StandardFields {
    #[inline]
    fn from(fields: StandardFields64) -> Self {
        Self::Pe32Plus(fields)
    }
}
