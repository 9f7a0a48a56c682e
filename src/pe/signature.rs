use std::fmt;

use zerocopy::{Immutable, IntoBytes, KnownLayout, TryFromBytes};

/// `PE\0\0`, the four bytes at `e_lfanew`.
#[derive(Copy, Clone, Default, Eq, PartialEq, TryFromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(u32)]
pub enum PeSignature {
    #[default]
    Magic = u32::from_le_bytes(*b"PE\0\0"),
}

impl PeSignature {
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes())
            .map(|signature| signature.trim_end_matches('\0'))
            .unwrap_or_default()
    }
}

impl fmt::Debug for PeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PeSignature").field(&self.as_str()).finish()
    }
}
