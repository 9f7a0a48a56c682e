use std::mem::offset_of;

use zerocopy::{FromBytes, Immutable, KnownLayout, LittleEndian, U16, U32, U64};

/// Windows-specific fields of a `PE32` optional header.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct WindowsFields32 {
    #[doc(alias = "ImageBase")]
    image_base: U32<LittleEndian>,
    #[doc(alias = "SectionAlignment")]
    section_alignment: U32<LittleEndian>,
    #[doc(alias = "FileAlignment")]
    file_alignment: U32<LittleEndian>,
    major_operating_system_version: U16<LittleEndian>,
    minor_operating_system_version: U16<LittleEndian>,
    major_image_version: U16<LittleEndian>,
    minor_image_version: U16<LittleEndian>,
    major_subsystem_version: U16<LittleEndian>,
    minor_subsystem_version: U16<LittleEndian>,
    win32_version_value: U32<LittleEndian>,
    #[doc(alias = "SizeOfImage")]
    size_of_image: U32<LittleEndian>,
    #[doc(alias = "SizeOfHeaders")]
    size_of_headers: U32<LittleEndian>,
    #[doc(alias = "CheckSum")]
    check_sum: U32<LittleEndian>,
    #[doc(alias = "Subsystem")]
    subsystem: U16<LittleEndian>,
    #[doc(alias = "DllCharacteristics")]
    dll_characteristics: U16<LittleEndian>,
    size_of_stack_reserve: U32<LittleEndian>,
    size_of_stack_commit: U32<LittleEndian>,
    size_of_heap_reserve: U32<LittleEndian>,
    size_of_heap_commit: U32<LittleEndian>,
    loader_flags: U32<LittleEndian>,
    #[doc(alias = "NumberOfRvaAndSizes")]
    number_of_rva_and_sizes: U32<LittleEndian>,
}

/// Windows-specific fields of a `PE32+` optional header. The image base and the stack and heap
/// sizes widen to 64 bits; everything else keeps its `PE32` width.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct WindowsFields64 {
    #[doc(alias = "ImageBase")]
    image_base: U64<LittleEndian>,
    #[doc(alias = "SectionAlignment")]
    section_alignment: U32<LittleEndian>,
    #[doc(alias = "FileAlignment")]
    file_alignment: U32<LittleEndian>,
    major_operating_system_version: U16<LittleEndian>,
    minor_operating_system_version: U16<LittleEndian>,
    major_image_version: U16<LittleEndian>,
    minor_image_version: U16<LittleEndian>,
    major_subsystem_version: U16<LittleEndian>,
    minor_subsystem_version: U16<LittleEndian>,
    win32_version_value: U32<LittleEndian>,
    #[doc(alias = "SizeOfImage")]
    size_of_image: U32<LittleEndian>,
    #[doc(alias = "SizeOfHeaders")]
    size_of_headers: U32<LittleEndian>,
    #[doc(alias = "CheckSum")]
    check_sum: U32<LittleEndian>,
    #[doc(alias = "Subsystem")]
    subsystem: U16<LittleEndian>,
    #[doc(alias = "DllCharacteristics")]
    dll_characteristics: U16<LittleEndian>,
    size_of_stack_reserve: U64<LittleEndian>,
    size_of_stack_commit: U64<LittleEndian>,
    size_of_heap_reserve: U64<LittleEndian>,
    size_of_heap_commit: U64<LittleEndian>,
    loader_flags: U32<LittleEndian>,
    #[doc(alias = "NumberOfRvaAndSizes")]
    number_of_rva_and_sizes: U32<LittleEndian>,
}

impl WindowsFields32 {
    pub const CHECK_SUM_OFFSET: usize = offset_of!(Self, check_sum);
}

impl WindowsFields64 {
    pub const CHECK_SUM_OFFSET: usize = offset_of!(Self, check_sum);
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WindowsFields {
    Pe32(WindowsFields32),
    Pe32Plus(WindowsFields64),
}

macro_rules! field {
    ($self:ident.$field:ident) => {
        match $self {
            Self::Pe32(fields) => fields.$field.get(),
            Self::Pe32Plus(fields) => fields.$field.get(),
        }
    };
}

impl WindowsFields {
    pub fn image_base(&self) -> u64 {
        match self {
            Self::Pe32(fields) => fields.image_base.get().into(),
            Self::Pe32Plus(fields) => fields.image_base.get(),
        }
    }

    pub const fn file_alignment(&self) -> u32 {
        field!(self.file_alignment)
    }

    pub const fn section_alignment(&self) -> u32 {
        field!(self.section_alignment)
    }

    pub const fn size_of_image(&self) -> u32 {
        field!(self.size_of_image)
    }

    /// The checksum currently stored in the image.
    pub const fn check_sum(&self) -> u32 {
        field!(self.check_sum)
    }

    pub const fn subsystem(&self) -> u16 {
        field!(self.subsystem)
    }

    pub const fn number_of_rva_and_sizes(&self) -> u32 {
        field!(self.number_of_rva_and_sizes)
    }

    /// The offset of the `CheckSum` field from the start of the Windows fields.
    pub const fn check_sum_offset(&self) -> usize {
        match self {
            Self::Pe32(_) => WindowsFields32::CHECK_SUM_OFFSET,
            Self::Pe32Plus(_) => WindowsFields64::CHECK_SUM_OFFSET,
        }
    }

    pub const fn size(&self) -> usize {
        match self {
            Self::Pe32(_) => size_of::<WindowsFields32>(),
            Self::Pe32Plus(_) => size_of::<WindowsFields64>(),
        }
    }

    pub const fn subsystem_name(&self) -> &'static str {
        match self.subsystem() {
            1 => "native",
            2 => "Windows GUI",
            3 => "Windows console",
            9 => "Windows CE GUI",
            10..=13 => "EFI",
            _ => "unknown",
        }
    }
}
