//! Rewrites the version resource of a PE image in place.

use std::{
    fs::OpenOptions,
    io,
    io::{Read, Seek, Write},
};

use bon::Builder;
use camino::Utf8Path;
use tracing::{debug, info, warn};

use crate::{
    error::{PeError, StampError},
    pe::{PeImage, VersionResource},
    version::FileVersion,
    version_info::{Translation, VersionInfo},
};

const FILE_VERSION: &str = "FileVersion";
const PRODUCT_VERSION: &str = "ProductVersion";

#[derive(Builder, Clone, Debug)]
pub struct StampOptions {
    /// Written to the fixed file info and to the `FileVersion` string.
    version: FileVersion,
    /// Written to the `ProductVersion` string. Defaults to the numeric version.
    #[builder(into)]
    informational_version: Option<String>,
    #[builder(default = true)]
    patch_file_version: bool,
    #[builder(default = true)]
    patch_product_version: bool,
}

impl StampOptions {
    #[inline]
    pub const fn version(&self) -> FileVersion {
        self.version
    }

    pub fn informational_version(&self) -> String {
        self.informational_version
            .clone()
            .unwrap_or_else(|| self.version.to_string())
    }

    #[inline]
    pub const fn patch_file_version(&self) -> bool {
        self.patch_file_version
    }

    #[inline]
    pub const fn patch_product_version(&self) -> bool {
        self.patch_product_version
    }
}

/// A string that was rewritten in one string table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StringChange {
    pub translation: Translation,
    pub key: &'static str,
    pub previous: String,
    pub current: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StampReport {
    pub version_resource: VersionResource,
    pub previous_size: u32,
    pub size: u32,
    pub capacity: u64,
    pub previous_checksum: u32,
    pub checksum: u32,
    /// Whether the fixed file info was present and had at least one of its versions rewritten.
    pub fixed_file_info_patched: bool,
    pub changed_strings: Vec<StringChange>,
}

/// Patches the version resource of the image in `stream` and recomputes its checksum.
///
/// Nothing is written unless every structure has been read successfully and the new resource fits
/// in the space available to it.
pub fn stamp<S>(stream: S, options: &StampOptions) -> Result<StampReport, StampError>
where
    S: Read + Write + Seek,
{
    let mut pe = PeImage::open(stream);

    let headers = pe.read_header()?;
    if headers.is_signed() {
        return Err(PeError::Signed.into());
    }
    let previous_checksum = headers.optional_header.windows_fields.check_sum();

    let resource = pe.locate_version_resource()?;
    let mut version_info = VersionInfo::read_from(pe.version_resource_window()?)?;

    let fixed_file_info_patched = patch_fixed_file_info(&mut version_info, options);
    let changed_strings = patch_strings(&mut version_info, options);

    let encoded = version_info.encode()?;
    let capacity = pe.version_resource_capacity()?;
    if encoded.len() as u64 > capacity {
        return Err(StampError::ResourceTooLarge {
            required: encoded.len() as u64,
            available: capacity,
        });
    }

    {
        let mut window = pe.reserved_version_resource_window()?;
        window.write_all(&encoded)?;

        let stale = (resource.size() as usize).saturating_sub(encoded.len());
        io::copy(&mut io::repeat(0).take(stale as u64), &mut window)?;
    }

    let size = encoded.len() as u32;
    pe.update_resource_data_entry_size(size)?;
    let checksum = pe.recompute_and_write_checksum()?;
    pe.flush()?;

    info!(
        previous_size = resource.size(),
        size,
        "Stamped version {} with checksum {checksum:#010X}",
        options.version()
    );

    Ok(StampReport {
        version_resource: resource,
        previous_size: resource.size(),
        size,
        capacity,
        previous_checksum,
        checksum,
        fixed_file_info_patched,
        changed_strings,
    })
}

/// Opens `path` for exclusive reading and writing and stamps it. The file is closed on every path
/// out of this function.
pub fn stamp_file(path: &Utf8Path, options: &StampOptions) -> Result<StampReport, StampError> {
    let mut open_options = OpenOptions::new();
    open_options.read(true).write(true);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;

        open_options.share_mode(0);
    }

    let mut file = open_options.open(path)?;
    debug!(%path, "Opened image");

    stamp(&mut file, options)
}

fn patch_fixed_file_info(version_info: &mut VersionInfo, options: &StampOptions) -> bool {
    if !options.patch_file_version() && !options.patch_product_version() {
        return false;
    }

    let Some(fixed_file_info) = version_info.fixed_file_info_mut() else {
        warn!("The version resource has no VS_FIXEDFILEINFO so only strings will be patched");
        return false;
    };

    if options.patch_file_version() {
        fixed_file_info.set_file_version(options.version());
    }
    if options.patch_product_version() {
        fixed_file_info.set_product_version(options.version());
    }

    true
}

fn patch_strings(version_info: &mut VersionInfo, options: &StampOptions) -> Vec<StringChange> {
    let mut requested = Vec::new();
    if options.patch_file_version() {
        requested.push((FILE_VERSION, options.version().to_string()));
    }
    if options.patch_product_version() {
        requested.push((PRODUCT_VERSION, options.informational_version()));
    }

    let mut changes = Vec::new();
    for (key, value) in requested {
        for table in version_info
            .string_tables()
            .filter(|table| table.get(key).is_none())
        {
            warn!("String table {} has no {key} entry", table.translation);
        }

        changes.extend(
            version_info
                .replace_string(key, &value)
                .into_iter()
                .map(|(translation, previous)| StringChange {
                    translation,
                    key,
                    previous,
                    current: value.clone(),
                }),
        );
    }

    changes
}

/// A read-only view of the version resource and checksum of an image.
#[derive(Clone, Debug)]
pub struct Inspection {
    pub version_resource: VersionResource,
    pub version_info: VersionInfo,
    pub stored_checksum: u32,
    pub computed_checksum: u32,
    pub signed: bool,
}

pub fn inspect<S>(stream: S) -> Result<Inspection, StampError>
where
    S: Read + Seek,
{
    let mut pe = PeImage::open(stream);

    let headers = pe.read_header()?;
    let stored_checksum = headers.optional_header.windows_fields.check_sum();
    let signed = headers.is_signed();

    let version_resource = pe.locate_version_resource()?;
    let version_info = VersionInfo::read_from(pe.version_resource_window()?)?;
    let computed_checksum = pe.compute_checksum()?;

    Ok(Inspection {
        version_resource,
        version_info,
        stored_checksum,
        computed_checksum,
        signed,
    })
}

pub fn inspect_file(path: &Utf8Path) -> Result<Inspection, StampError> {
    let file = std::fs::File::open(path)?;
    inspect(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use camino::Utf8Path;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    use super::{StampOptions, inspect, stamp, stamp_file};
    use crate::{
        checksum,
        error::{PeError, StampError},
        fixture::{Node, PeFixture, sample_fixed_file_info},
        version::FileVersion,
        version_info::{Translation, VersionInfo},
    };

    const VERSION: FileVersion = FileVersion::new(10, 20, 30, 40);

    fn stamped(fixture: &PeFixture, options: &StampOptions) -> (super::StampReport, Vec<u8>) {
        let mut cursor = Cursor::new(fixture.bytes());
        let report = stamp(&mut cursor, options).unwrap();
        (report, cursor.into_inner())
    }

    fn blob<'data>(bytes: &'data [u8], fixture: &PeFixture, size: u32) -> &'data [u8] {
        let start = fixture.blob_offset() as usize;
        &bytes[start..start + size as usize]
    }

    /// The bytes of the string node with `key`, header included.
    fn string_node<'data>(blob: &'data [u8], key: &str) -> &'data [u8] {
        let pattern = key
            .encode_utf16()
            .chain([0])
            .flat_map(u16::to_le_bytes)
            .collect::<Vec<_>>();
        let key_start = blob
            .windows(pattern.len())
            .position(|window| window == pattern)
            .unwrap();
        let start = key_start - 6;
        let length = u16::from_le_bytes([blob[start], blob[start + 1]]) as usize;
        &blob[start..start + length]
    }

    #[test]
    fn stamps_versions_and_checksum() {
        let fixture = PeFixture::default();
        let options = StampOptions::builder()
            .version(VERSION)
            .informational_version("10.20.30-beta+0123abcd")
            .build();

        let (report, bytes) = stamped(&fixture, &options);

        let info = VersionInfo::decode(blob(&bytes, &fixture, report.size)).unwrap();
        let fixed = info.fixed_file_info().unwrap();
        assert_eq!(fixed.file_version(), VERSION);
        assert_eq!(fixed.product_version(), VERSION);
        assert_eq!(info.string("FileVersion"), Some("10.20.30.40"));
        assert_eq!(info.string("ProductVersion"), Some("10.20.30-beta+0123abcd"));
        assert_eq!(info.string("CompanyName"), Some("Acme Corporation"));

        assert!(report.fixed_file_info_patched);
        assert_eq!(report.changed_strings.len(), 2);
        assert_eq!(report.size as usize, info.total_size());
        assert!(report.size > report.previous_size);

        let offset = PeFixture::CHECKSUM_OFFSET as usize;
        assert_eq!(&bytes[offset..offset + 4], &report.checksum.to_le_bytes());
        assert_eq!(checksum::calculate(&bytes, offset as u64), report.checksum);
    }

    #[test]
    fn data_entry_size_follows_new_resource() {
        let fixture = PeFixture::default();
        let options = StampOptions::builder().version(VERSION).build();

        let (report, bytes) = stamped(&fixture, &options);

        let mut cursor = Cursor::new(bytes);
        let inspection = inspect(&mut cursor).unwrap();
        assert_eq!(inspection.version_resource.size(), report.size);
        assert_eq!(inspection.stored_checksum, inspection.computed_checksum);
        assert_eq!(inspection.version_info.string("ProductVersion"), Some("10.20.30.40"));
    }

    #[test]
    fn file_version_only_leaves_product_version_untouched() {
        let fixture = PeFixture::default();
        let before = fixture.bytes();
        let options = StampOptions::builder()
            .version(VERSION)
            .patch_product_version(false)
            .build();

        let (report, after) = stamped(&fixture, &options);

        let old_blob = blob(&before, &fixture, report.previous_size);
        let new_blob = blob(&after, &fixture, report.size);
        assert_eq!(
            string_node(new_blob, "ProductVersion"),
            string_node(old_blob, "ProductVersion")
        );
        assert_ne!(
            string_node(new_blob, "FileVersion"),
            string_node(old_blob, "FileVersion")
        );

        let info = VersionInfo::decode(new_blob).unwrap();
        let fixed = info.fixed_file_info().unwrap();
        assert_eq!(fixed.file_version(), VERSION);
        assert_eq!(fixed.product_version(), FileVersion::new(1, 2, 3, 4));
    }

    #[test]
    fn nothing_to_patch_keeps_resource_bytes() {
        let fixture = PeFixture::default();
        let before = fixture.bytes();
        let options = StampOptions::builder()
            .version(VERSION)
            .patch_file_version(false)
            .patch_product_version(false)
            .build();

        let (report, after) = stamped(&fixture, &options);

        assert_eq!(report.size, report.previous_size);
        assert!(!report.fixed_file_info_patched);
        assert!(report.changed_strings.is_empty());
        assert_eq!(
            blob(&after, &fixture, report.size),
            blob(&before, &fixture, report.previous_size)
        );
    }

    #[test]
    fn stamping_twice_changes_nothing_the_second_time() {
        let fixture = PeFixture::default();
        let options = StampOptions::builder().version(VERSION).build();

        let (_, once) = stamped(&fixture, &options);
        let mut cursor = Cursor::new(once.clone());
        let report = stamp(&mut cursor, &options).unwrap();

        assert!(report.changed_strings.is_empty());
        assert_eq!(report.previous_checksum, report.checksum);
        assert_eq!(cursor.into_inner(), once);
    }

    #[test]
    fn missing_fixed_file_info_still_patches_strings() {
        let version_info = Node::root(
            None,
            vec![Node::string_file_info(vec![Node::string_table(
                "040904b0",
                vec![
                    Node::string("FileVersion", "1.0.0.0"),
                    Node::string("ProductVersion", "1.0.0.0"),
                ],
            )])],
        )
        .encode();
        let fixture = PeFixture::builder().version_info(version_info).build();
        let options = StampOptions::builder().version(VERSION).build();

        let (report, bytes) = stamped(&fixture, &options);

        assert!(!report.fixed_file_info_patched);
        let info = VersionInfo::decode(blob(&bytes, &fixture, report.size)).unwrap();
        assert!(info.fixed_file_info().is_none());
        assert_eq!(info.string("FileVersion"), Some("10.20.30.40"));
        assert_eq!(
            report.changed_strings[0].translation,
            Translation::new(0x0409, 0x04B0)
        );
    }

    #[test]
    fn shrinking_zero_fills_old_tail() {
        let version_info = Node::root(
            Some(sample_fixed_file_info()),
            vec![Node::string_file_info(vec![Node::string_table(
                "040904b0",
                vec![Node::string(
                    "ProductVersion",
                    "1.2.3.4-a-rather-long-prerelease-tag+0123456789abcdef",
                )],
            )])],
        )
        .encode();
        let fixture = PeFixture::builder().version_info(version_info).build();
        let options = StampOptions::builder().version(FileVersion::new(1, 0, 0, 0)).build();

        let (report, bytes) = stamped(&fixture, &options);

        assert!(report.size < report.previous_size);
        let start = fixture.blob_offset() as usize;
        assert!(
            bytes[start + report.size as usize..start + report.previous_size as usize]
                .iter()
                .all(|&byte| byte == 0)
        );
    }

    #[rstest]
    #[case::section_end(PeFixture::default(), 1000)]
    #[case::following_resource(PeFixture::builder().trailing_resource(true).build(), 100)]
    #[case::past_virtual_size(PeFixture::builder().virtual_size(0x2A0).build(), 100)]
    #[case::past_directory_size(PeFixture::builder().resource_directory_size(0x2A0).build(), 100)]
    fn oversized_resource_is_refused(#[case] fixture: PeFixture, #[case] length: usize) {
        let before = fixture.bytes();
        let options = StampOptions::builder()
            .version(VERSION)
            .informational_version("x".repeat(length))
            .build();

        let mut cursor = Cursor::new(before.clone());
        let error = stamp(&mut cursor, &options).unwrap_err();

        assert!(matches!(error, StampError::ResourceTooLarge { .. }));
        assert_eq!(cursor.into_inner(), before);
    }

    #[test]
    fn trailing_resource_survives_growth_into_slack() {
        let fixture = PeFixture::builder().trailing_resource(true).build();
        let options = StampOptions::builder().version(VERSION).build();

        let (_, bytes) = stamped(&fixture, &options);

        let trailing = fixture.trailing_resource_offset() as usize;
        assert!(bytes[trailing..trailing + 0x40].iter().all(|&byte| byte == b'm'));
    }

    #[test]
    fn signed_image_is_refused_untouched() {
        let fixture = PeFixture::builder().signed(true).build();
        let before = fixture.bytes();
        let options = StampOptions::builder().version(VERSION).build();

        let mut cursor = Cursor::new(before.clone());
        assert!(matches!(
            stamp(&mut cursor, &options),
            Err(StampError::Pe(PeError::Signed))
        ));
        assert_eq!(cursor.into_inner(), before);
    }

    #[rstest]
    #[case::bad_dos_magic(|bytes: &mut Vec<u8>| bytes[..2].copy_from_slice(b"XX"))]
    #[case::bad_pe_signature(|bytes: &mut Vec<u8>| bytes[PeFixture::NT_OFFSET as usize] = 0)]
    fn malformed_image_is_not_mutated(#[case] corrupt: fn(&mut Vec<u8>)) {
        let mut before = PeFixture::default().bytes();
        corrupt(&mut before);
        let options = StampOptions::builder().version(VERSION).build();

        let mut cursor = Cursor::new(before.clone());
        assert!(matches!(
            stamp(&mut cursor, &options),
            Err(StampError::Pe(PeError::Format { .. }))
        ));
        assert_eq!(cursor.into_inner(), before);
    }

    #[test]
    fn ambiguous_languages_are_refused() {
        let fixture = PeFixture::builder().languages(vec![1033, 1031]).build();
        let before = fixture.bytes();
        let options = StampOptions::builder().version(VERSION).build();

        let mut cursor = Cursor::new(before.clone());
        assert!(matches!(
            stamp(&mut cursor, &options),
            Err(StampError::Pe(PeError::Format { .. }))
        ));
        assert_eq!(cursor.into_inner(), before);
    }

    #[test]
    fn stamps_file_on_disk() {
        let fixture = PeFixture::default();
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &fixture.bytes()).unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        let options = StampOptions::builder().version(VERSION).build();
        let report = stamp_file(path, &options).unwrap();

        let bytes = std::fs::read(path).unwrap();
        assert_eq!(
            checksum::calculate(&bytes, PeFixture::CHECKSUM_OFFSET),
            report.checksum
        );
        let info = VersionInfo::decode(blob(&bytes, &fixture, report.size)).unwrap();
        assert_eq!(info.fixed_file_info().unwrap().file_version(), VERSION);
    }

    #[test]
    fn informational_version_defaults_to_numeric_version() {
        let options = StampOptions::builder().version(VERSION).build();

        assert_eq!(options.informational_version(), "10.20.30.40");
        assert!(options.patch_file_version());
        assert!(options.patch_product_version());
    }
}
