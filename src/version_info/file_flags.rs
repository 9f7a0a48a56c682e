use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// `dwFileFlags` of `VS_FIXEDFILEINFO`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct FileFlags(u32);

bitflags! {
    impl FileFlags: u32 {
        const DEBUG = 0x0000_0001;
        const PRERELEASE = 0x0000_0002;
        const PATCHED = 0x0000_0004;
        const PRIVATEBUILD = 0x0000_0008;
        const INFOINFERRED = 0x0000_0010;
        const SPECIALBUILD = 0x0000_0020;
    }
}
