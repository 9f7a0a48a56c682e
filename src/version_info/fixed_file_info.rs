use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, U32};

use super::FileFlags;
use crate::version::FileVersion;

/// `VS_FIXEDFILEINFO`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct FixedFileInfo {
    signature: U32<LittleEndian>,
    struct_version: U32<LittleEndian>,
    file_version_ms: U32<LittleEndian>,
    file_version_ls: U32<LittleEndian>,
    product_version_ms: U32<LittleEndian>,
    product_version_ls: U32<LittleEndian>,
    file_flags_mask: U32<LittleEndian>,
    file_flags: FileFlags,
    file_os: U32<LittleEndian>,
    file_type: U32<LittleEndian>,
    file_subtype: U32<LittleEndian>,
    file_date_ms: U32<LittleEndian>,
    file_date_ls: U32<LittleEndian>,
}

impl FixedFileInfo {
    pub const SIGNATURE: u32 = 0xFEEF_04BD;

    /// Whether `dwSignature` holds the magic value. A record with any other signature is kept so
    /// the tree still encodes the bytes it was decoded from, but is otherwise ignored.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.signature.get() == Self::SIGNATURE
    }

    #[inline]
    pub const fn signature(&self) -> u32 {
        self.signature.get()
    }

    #[inline]
    pub const fn struct_version(&self) -> u32 {
        self.struct_version.get()
    }

    pub const fn file_version(&self) -> FileVersion {
        FileVersion::from_ms_ls(self.file_version_ms.get(), self.file_version_ls.get())
    }

    pub fn set_file_version(&mut self, version: FileVersion) {
        self.file_version_ms.set(version.ms());
        self.file_version_ls.set(version.ls());
    }

    pub const fn product_version(&self) -> FileVersion {
        FileVersion::from_ms_ls(self.product_version_ms.get(), self.product_version_ls.get())
    }

    pub fn set_product_version(&mut self, version: FileVersion) {
        self.product_version_ms.set(version.ms());
        self.product_version_ls.set(version.ls());
    }

    /// The flags that are set and meaningful according to `dwFileFlagsMask`.
    #[inline]
    pub fn file_flags(&self) -> FileFlags {
        self.file_flags & FileFlags::from_bits_retain(self.file_flags_mask.get())
    }

    #[inline]
    pub const fn file_os(&self) -> u32 {
        self.file_os.get()
    }

    #[inline]
    pub const fn file_type(&self) -> u32 {
        self.file_type.get()
    }

    #[inline]
    pub const fn file_subtype(&self) -> u32 {
        self.file_subtype.get()
    }

    pub const fn file_type_name(&self) -> &'static str {
        match self.file_type() {
            0x1 => "application",
            0x2 => "DLL",
            0x3 => "driver",
            0x4 => "font",
            0x5 => "virtual device",
            0x7 => "static library",
            _ => "unknown",
        }
    }
}
