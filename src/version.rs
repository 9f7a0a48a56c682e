use std::{num::ParseIntError, str::FromStr};

use derive_more::Display;
use thiserror::Error;

/// A Windows file version, `major.minor.build.revision`.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[display("{major}.{minor}.{build}.{revision}")]
pub struct FileVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

#[derive(Error, Debug, Eq, PartialEq)]
pub enum FileVersionError {
    #[error("A file version has between one and four components but {0} were given")]
    ComponentCount(usize),
    #[error("Invalid version component {component:?}: {source}")]
    Component {
        component: String,
        source: ParseIntError,
    },
}

impl FileVersion {
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Unpacks the `dwFileVersionMS` and `dwFileVersionLS` pair of `VS_FIXEDFILEINFO`.
    pub const fn from_ms_ls(ms: u32, ls: u32) -> Self {
        Self::new(
            (ms >> 16) as u16,
            ms as u16,
            (ls >> 16) as u16,
            ls as u16,
        )
    }

    #[inline]
    pub const fn ms(self) -> u32 {
        (self.major as u32) << 16 | self.minor as u32
    }

    #[inline]
    pub const fn ls(self) -> u32 {
        (self.build as u32) << 16 | self.revision as u32
    }
}

impl FromStr for FileVersion {
    type Err = FileVersionError;

    /// Parses one to four dot-separated components. Missing components are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s.trim().split('.').collect::<Vec<_>>();
        if components.len() > 4 {
            return Err(FileVersionError::ComponentCount(components.len()));
        }

        let mut parts = [0u16; 4];
        for (part, component) in parts.iter_mut().zip(&components) {
            *part = component
                .parse()
                .map_err(|source| FileVersionError::Component {
                    component: (*component).to_owned(),
                    source,
                })?;
        }

        let [major, minor, build, revision] = parts;
        Ok(Self::new(major, minor, build, revision))
    }
}
