//! Stamps version information into Windows PE images.
//!
//! The `VS_VERSIONINFO` resource of an image is decoded, its versions are rewritten and it is
//! encoded back in place, after which the image checksum is recomputed. Sections are never moved,
//! so a resource that no longer fits is refused rather than truncated.

pub mod binary;
pub mod checksum;
pub mod error;
pub mod pe;
pub mod stamp;
pub mod version;
pub mod version_info;

#[cfg(test)]
mod fixture;

pub use error::{PeError, StampError, VersionResourceError};
pub use pe::PeImage;
pub use stamp::{
    Inspection, StampOptions, StampReport, StringChange, inspect, inspect_file, stamp, stamp_file,
};
pub use version::FileVersion;
