use zerocopy::{Immutable, KnownLayout, LittleEndian, TryFromBytes, U16, U32};

#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, KnownLayout, Immutable)]
#[repr(u16)]
pub enum DosSignature {
    MZ = u16::from_le_bytes(*b"MZ"),
}

/// `IMAGE_DOS_HEADER`.
///
/// Only `e_magic` and `e_lfanew` still mean anything on Windows. The fields in between are the
/// real-mode loader's "formatted header" and are carried as an opaque block.
#[doc(alias("IMAGE_DOS_HEADER"))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, TryFromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct DosHeader {
    #[doc(alias("e_magic"))]
    signature: DosSignature,

    /// `e_cblp` through `e_res2`.
    legacy: [U16<LittleEndian>; 29],

    #[doc(alias("e_lfanew"))]
    pe_pointer: U32<LittleEndian>,
}

impl DosHeader {
    /// The file offset of the `PE\0\0` signature.
    #[inline]
    pub const fn pe_pointer(&self) -> u32 {
        self.pe_pointer.get()
    }
}
