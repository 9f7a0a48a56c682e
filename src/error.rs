use std::io;

use thiserror::Error;

/// Errors raised while reading or patching the structure of a PE image.
#[derive(Error, Debug)]
pub enum PeError {
    #[error("Malformed {structure} at offset {offset:#X}: {reason}")]
    Format {
        offset: u64,
        structure: &'static str,
        reason: String,
    },
    #[error("Cannot call {operation}: {reason}")]
    InvalidState {
        operation: &'static str,
        reason: &'static str,
    },
    #[error(
        "The image carries an Authenticode signature that would be invalidated by rewriting its checksum"
    )]
    Signed,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PeError {
    pub fn format(offset: u64, structure: &'static str, reason: impl Into<String>) -> Self {
        Self::Format {
            offset,
            structure,
            reason: reason.into(),
        }
    }

    pub const fn header_not_read(operation: &'static str) -> Self {
        Self::InvalidState {
            operation,
            reason: "the PE header has not been read",
        }
    }
}

/// Errors raised while decoding or encoding a `VS_VERSIONINFO` tree.
#[derive(Error, Debug)]
pub enum VersionResourceError {
    #[error("Malformed version resource at offset {offset:#X}: {reason}")]
    Format { offset: u64, reason: String },
    #[error("{node} needs {size} bytes which does not fit in a 16-bit length field")]
    TooLarge { node: String, size: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl VersionResourceError {
    pub fn format(offset: u64, reason: impl Into<String>) -> Self {
        Self::Format {
            offset,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the end-to-end stamping pipeline.
#[derive(Error, Debug)]
pub enum StampError {
    #[error(transparent)]
    Pe(#[from] PeError),
    #[error(transparent)]
    VersionResource(#[from] VersionResourceError),
    #[error(
        "The patched version resource needs {required} bytes but only {available} bytes are available without moving sections"
    )]
    ResourceTooLarge { required: u64, available: u64 },
    #[error(transparent)]
    Io(#[from] io::Error),
}
