use std::slice;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, LittleEndian, U32};

/// One `IMAGE_DATA_DIRECTORY`: an address and a size.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct DataDirectory {
    virtual_address: U32<LittleEndian>,
    size: U32<LittleEndian>,
}

impl DataDirectory {
    /// An RVA for every directory except the certificate table, where it is a file offset.
    #[inline]
    pub const fn virtual_address(self) -> u32 {
        self.virtual_address.get()
    }

    #[inline]
    pub const fn size(self) -> u32 {
        self.size.get()
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.virtual_address() == 0 || self.size() == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct DataDirectories(Vec<DataDirectory>);

impl DataDirectories {
    const RESOURCE_TABLE: usize = 2;
    const CERTIFICATE_TABLE: usize = 4;

    #[inline]
    pub fn resource_table(&self) -> Option<DataDirectory> {
        self.get(Self::RESOURCE_TABLE)
    }

    /// The Authenticode signature, if the image has one.
    #[inline]
    pub fn certificate_table(&self) -> Option<DataDirectory> {
        self.get(Self::CERTIFICATE_TABLE)
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<DataDirectory> {
        self.0.get(index).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, DataDirectory> {
        self.0.iter()
    }
}

impl From<Vec<DataDirectory>> for DataDirectories {
    #[inline]
    fn from(directories: Vec<DataDirectory>) -> Self {
        Self(directories)
    }
}

impl<'a> IntoIterator for &'a DataDirectories {
    type Item = &'a DataDirectory;

    type IntoIter = slice::Iter<'a, DataDirectory>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
