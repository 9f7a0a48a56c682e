mod characteristics;

pub use characteristics::CoffCharacteristics;
use zerocopy::{FromBytes, Immutable, KnownLayout, LittleEndian, U16, U32};

pub const IMAGE_FILE_MACHINE_I386: u16 = 0x014C;
pub const IMAGE_FILE_MACHINE_ARMNT: u16 = 0x01C4;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;
pub const IMAGE_FILE_MACHINE_ARM64: u16 = 0xAA64;

/// `IMAGE_FILE_HEADER`, which directly follows the `PE\0\0` signature.
#[doc(alias("IMAGE_FILE_HEADER"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct CoffHeader {
    #[doc(alias("Machine"))]
    machine: U16<LittleEndian>,

    #[doc(alias("NumberOfSections"))]
    number_of_sections: U16<LittleEndian>,

    #[doc(alias("TimeDateStamp"))]
    time_date_stamp: U32<LittleEndian>,

    #[doc(alias("PointerToSymbolTable"))]
    pointer_to_symbol_table: U32<LittleEndian>,

    #[doc(alias("NumberOfSymbols"))]
    number_of_symbols: U32<LittleEndian>,

    /// The size of the optional header including its data directories. The section table starts
    /// this many bytes after the optional header does.
    #[doc(alias("SizeOfOptionalHeader"))]
    size_of_optional_header: U16<LittleEndian>,

    #[doc(alias("Characteristics"))]
    characteristics: CoffCharacteristics,
}

impl CoffHeader {
    #[inline]
    pub const fn machine(&self) -> u16 {
        self.machine.get()
    }

    pub const fn machine_name(&self) -> &'static str {
        match self.machine() {
            IMAGE_FILE_MACHINE_I386 => "x86",
            IMAGE_FILE_MACHINE_ARMNT => "arm",
            IMAGE_FILE_MACHINE_AMD64 => "x64",
            IMAGE_FILE_MACHINE_ARM64 => "arm64",
            _ => "unknown",
        }
    }

    #[inline]
    pub const fn number_of_sections(&self) -> u16 {
        self.number_of_sections.get()
    }

    #[inline]
    pub const fn time_date_stamp(&self) -> u32 {
        self.time_date_stamp.get()
    }

    #[inline]
    pub const fn size_of_optional_header(&self) -> u16 {
        self.size_of_optional_header.get()
    }

    #[inline]
    pub const fn characteristics(&self) -> CoffCharacteristics {
        self.characteristics
    }
}
