use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, U16};

/// A language identifier and code page pair from the `Translation` value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct Translation {
    language: U16<LittleEndian>,
    code_page: U16<LittleEndian>,
}

impl Translation {
    pub const fn new(language: u16, code_page: u16) -> Self {
        Self {
            language: U16::new(language),
            code_page: U16::new(code_page),
        }
    }

    #[inline]
    pub const fn language(&self) -> u16 {
        self.language.get()
    }

    #[inline]
    pub const fn code_page(&self) -> u16 {
        self.code_page.get()
    }

    /// The name of the encoding the code page refers to, if it has one.
    pub fn encoding_name(&self) -> Option<&'static str> {
        codepage::to_encoding(self.code_page()).map(encoding_rs::Encoding::name)
    }
}

impl fmt::Debug for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translation")
            .field("language", &format_args!("{:#06X}", self.language()))
            .field("code_page", &self.code_page())
            .finish()
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}{:04x}", self.language(), self.code_page())
    }
}
