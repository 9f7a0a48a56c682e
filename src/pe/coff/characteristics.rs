use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, KnownLayout};

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct CoffCharacteristics(u16);

bitflags! {
    impl CoffCharacteristics: u16 {
        const RELOCS_STRIPPED = 1;

        /// The image is valid and can be run.
        const EXECUTABLE_IMAGE = 1 << 1;

        const LARGE_ADDRESS_AWARE = 1 << 5;

        const MACHINE_32BIT = 1 << 8;

        const DEBUG_STRIPPED = 1 << 9;

        const SYSTEM = 1 << 12;

        /// The image is a dynamic-link library.
        const DLL = 1 << 13;

        const UP_SYSTEM_ONLY = 1 << 14;
    }
}

impl CoffCharacteristics {
    pub fn kind(self) -> &'static str {
        if self.contains(Self::DLL) {
            "DLL"
        } else if self.contains(Self::SYSTEM) {
            "system file"
        } else if self.contains(Self::EXECUTABLE_IMAGE) {
            "executable"
        } else {
            "object"
        }
    }
}
