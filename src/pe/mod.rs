pub mod coff;
pub mod dos;
pub mod optional_header;
pub mod resource;
mod section_table;
mod section_window;
mod signature;

use std::{
    collections::HashSet,
    io,
    io::{Read, Seek, SeekFrom, Write},
    ops::Range,
};

pub use coff::CoffHeader;
pub use dos::DosHeader;
pub use optional_header::{DataDirectory, OptionalHeader};
pub use section_table::{RvaError, SectionHeader, SectionTable};
pub use section_window::SectionWindow;
pub use signature::PeSignature;
use tracing::{debug, trace};
use zerocopy::{Immutable, KnownLayout, LE, TryFromBytes};

use crate::{
    binary::{ReadBytesExt, WriteBytesExt},
    checksum,
    error::PeError,
    pe::resource::{
        ImageResourceDataEntry, ImageResourceDirectoryEntry, RT_VERSION, ResourceDirectoryTable,
    },
};

/// Resource trees are three levels deep. Anything deeper than this is not a tree a resource
/// compiler produced.
const MAX_RESOURCE_DEPTH: usize = 8;

/// Reads a fixed-layout record at an absolute offset, turning truncation and invalid
/// discriminants into format errors that name the structure.
pub(crate) fn read_record<T, S>(
    stream: &mut S,
    offset: u64,
    structure: &'static str,
) -> Result<T, PeError>
where
    T: TryFromBytes + KnownLayout + Immutable,
    S: Read + Seek + ?Sized,
{
    stream.seek(SeekFrom::Start(offset))?;
    match stream.try_read_t::<T>() {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(PeError::format(
            offset,
            structure,
            "unrecognised signature or discriminant",
        )),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => Err(PeError::format(
            offset,
            structure,
            "the file ends inside this structure",
        )),
        Err(error) => Err(error.into()),
    }
}

/// Everything [`PeImage::read_header`] parses.
#[derive(Clone, Debug)]
pub struct PeHeaders {
    pub dos_header: DosHeader,
    pub coff_header: CoffHeader,
    pub optional_header_offset: u64,
    pub optional_header: OptionalHeader,
    pub section_table: SectionTable,
}

impl PeHeaders {
    /// The absolute file offset of the optional header's `CheckSum` field.
    pub const fn check_sum_offset(&self) -> u64 {
        self.optional_header_offset + self.optional_header.check_sum_offset() as u64
    }

    /// The absolute file offset of the data directory at `index`.
    pub const fn data_directory_offset(&self, index: usize) -> u64 {
        self.optional_header_offset
            + (self.optional_header.standard_fields.size()
                + self.optional_header.windows_fields.size()
                + index * size_of::<DataDirectory>()) as u64
    }

    /// Whether the image carries an Authenticode signature.
    pub fn is_signed(&self) -> bool {
        self.optional_header
            .data_directories
            .certificate_table()
            .is_some_and(|directory| !directory.is_empty())
    }

    fn to_file_offset(
        &self,
        rva: u32,
        referenced_at: u64,
        structure: &'static str,
    ) -> Result<(u64, &SectionHeader), PeError> {
        self.section_table
            .to_file_offset(rva)
            .map_err(|error| PeError::format(referenced_at, structure, error.to_string()))
    }
}

/// Where the `VS_VERSIONINFO` resource lives in the file.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VersionResource {
    resource_directory_offset: u64,
    data_entry_offset: u64,
    data_entry: ImageResourceDataEntry,
    file_offset: u64,
    growth_limit: u64,
    name_id: u32,
    language: u32,
}

impl VersionResource {
    /// The file offset of the resource directory root.
    #[inline]
    pub const fn resource_directory_offset(&self) -> u64 {
        self.resource_directory_offset
    }

    /// The file offset of the `IMAGE_RESOURCE_DATA_ENTRY` describing the blob.
    #[inline]
    pub const fn data_entry_offset(&self) -> u64 {
        self.data_entry_offset
    }

    #[inline]
    pub const fn data_entry(&self) -> &ImageResourceDataEntry {
        &self.data_entry
    }

    /// The file offset of the first byte of the blob.
    #[inline]
    pub const fn file_offset(&self) -> u64 {
        self.file_offset
    }

    #[inline]
    pub const fn size(&self) -> u32 {
        self.data_entry.size()
    }

    /// The file offset the blob may never grow past: the end of the mapped part of its section
    /// or the end of the resource data directory, whichever comes first.
    #[inline]
    pub const fn growth_limit(&self) -> u64 {
        self.growth_limit
    }

    /// The resource name, conventionally `1`.
    #[inline]
    pub const fn name_id(&self) -> u32 {
        self.name_id
    }

    /// The language identifier of the resource.
    #[inline]
    pub const fn language(&self) -> u32 {
        self.language
    }
}

/// A PE image opened over a seekable stream.
///
/// The protocol is strict: [`read_header`](Self::read_header) first, then the version resource
/// is located, read, rewritten and resized, and the checksum is recomputed last.
#[derive(Debug)]
pub struct PeImage<S> {
    stream: S,
    headers: Option<PeHeaders>,
    version_resource: Option<VersionResource>,
}

impl<S> PeImage<S> {
    /// Wraps `stream`. Nothing is read until [`read_header`](Self::read_header).
    pub const fn open(stream: S) -> Self {
        Self {
            stream,
            headers: None,
            version_resource: None,
        }
    }

    /// Returns the parsed headers.
    pub fn headers(&self) -> Result<&PeHeaders, PeError> {
        self.headers
            .as_ref()
            .ok_or(PeError::header_not_read("headers"))
    }

    /// The absolute file offset of the optional header's `CheckSum` field.
    pub fn checksum_offset(&self) -> Result<u64, PeError> {
        self.headers
            .as_ref()
            .map(PeHeaders::check_sum_offset)
            .ok_or(PeError::header_not_read("checksum_offset"))
    }

    /// Returns the version resource found by
    /// [`locate_version_resource`](Self::locate_version_resource), if it has been called.
    #[inline]
    pub const fn version_resource(&self) -> Option<&VersionResource> {
        self.version_resource.as_ref()
    }

    #[inline]
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Seek> PeImage<S> {
    /// Parses the DOS header, the NT headers, the data directories and the section table.
    ///
    /// May only be called once.
    pub fn read_header(&mut self) -> Result<&PeHeaders, PeError> {
        if self.headers.is_some() {
            return Err(PeError::InvalidState {
                operation: "read_header",
                reason: "the PE header has already been read",
            });
        }

        let stream = &mut self.stream;

        let dos_header = read_record::<DosHeader, _>(stream, 0, "DOS header")?;

        let nt_offset = u64::from(dos_header.pe_pointer());
        read_record::<PeSignature, _>(stream, nt_offset, "PE signature")?;

        let coff_offset = nt_offset + size_of::<PeSignature>() as u64;
        let coff_header = read_record::<CoffHeader, _>(stream, coff_offset, "COFF header")?;

        let optional_header_offset = coff_offset + size_of::<CoffHeader>() as u64;
        let optional_header = OptionalHeader::read_from(
            &mut *stream,
            optional_header_offset,
            coff_header.size_of_optional_header(),
        )?;

        let section_table = SectionTable::read_from(
            &mut *stream,
            optional_header_offset + u64::from(coff_header.size_of_optional_header()),
            coff_header.number_of_sections(),
        )?;

        debug!(
            machine = coff_header.machine_name(),
            kind = coff_header.characteristics().kind(),
            sections = coff_header.number_of_sections(),
            "Read PE header with NT headers at {nt_offset:#X}"
        );
        for section in &section_table {
            trace!(?section);
        }

        Ok(self.headers.insert(PeHeaders {
            dos_header,
            coff_header,
            optional_header_offset,
            optional_header,
            section_table,
        }))
    }

    /// Walks `VERSION` → name → language in the resource tree down to the single
    /// `IMAGE_RESOURCE_DATA_ENTRY` of the version resource.
    pub fn locate_version_resource(&mut self) -> Result<VersionResource, PeError> {
        let headers = self
            .headers
            .as_ref()
            .ok_or(PeError::header_not_read("locate_version_resource"))?;
        let stream = &mut self.stream;

        let resource_table = headers
            .optional_header
            .data_directories
            .resource_table()
            .filter(|directory| !directory.is_empty())
            .ok_or_else(|| {
                PeError::format(
                    headers.data_directory_offset(2),
                    "resource data directory",
                    "the image has no resources",
                )
            })?;

        let (root_offset, _) = headers.to_file_offset(
            resource_table.virtual_address(),
            headers.data_directory_offset(2),
            "resource data directory",
        )?;

        let root = ResourceDirectoryTable::read_from(&mut *stream, root_offset)?;
        let type_entry = root
            .find_id_entry(RT_VERSION)
            .copied()
            .ok_or_else(|| {
                PeError::format(
                    root_offset,
                    "resource directory table",
                    "the image has no VERSION resource",
                )
            })?;
        if !type_entry.is_table() {
            return Err(PeError::format(
                root_offset,
                "resource directory table",
                "the VERSION entry points at data instead of a directory",
            ));
        }

        let names_offset = root_offset + u64::from(type_entry.data_offset());
        let names = ResourceDirectoryTable::read_from(&mut *stream, names_offset)?;
        let name_entry = sole_id_entry(&names, "VERSION name directory", true)?;

        let languages_offset = root_offset + u64::from(name_entry.data_offset());
        let languages = ResourceDirectoryTable::read_from(&mut *stream, languages_offset)?;
        let language_entry = sole_id_entry(&languages, "VERSION language directory", false)?;

        let data_entry_offset = root_offset + u64::from(language_entry.data_offset());
        let data_entry = read_record::<ImageResourceDataEntry, _>(
            stream,
            data_entry_offset,
            "resource data entry",
        )?;

        let (file_offset, section) = headers.to_file_offset(
            data_entry.offset_to_data(),
            data_entry_offset,
            "resource data entry",
        )?;
        if file_offset + u64::from(data_entry.size()) > section.raw_data_end() {
            return Err(PeError::format(
                data_entry_offset,
                "resource data entry",
                format!(
                    "{} bytes at {file_offset:#X} run past the end of section {}",
                    data_entry.size(),
                    section.name()
                ),
            ));
        }

        let version_resource = VersionResource {
            resource_directory_offset: root_offset,
            data_entry_offset,
            data_entry,
            file_offset,
            growth_limit: section
                .mapped_data_end()
                .min(root_offset + u64::from(resource_table.size())),
            name_id: name_entry.id().unwrap_or_default(),
            language: language_entry.id().unwrap_or_default(),
        };

        debug!(
            language = version_resource.language,
            size = data_entry.size(),
            "Found version resource at {file_offset:#X}"
        );

        Ok(*self.version_resource.insert(version_resource))
    }

    /// A window over exactly the bytes of the version resource.
    pub fn version_resource_window(&mut self) -> Result<SectionWindow<&mut S>, PeError> {
        let resource = match self.version_resource {
            Some(resource) => resource,
            None => self.locate_version_resource()?,
        };

        SectionWindow::new(
            &mut self.stream,
            resource.file_offset(),
            resource.size().into(),
        )
        .map_err(PeError::from)
    }

    /// A window over every byte the version resource may grow into. See
    /// [`version_resource_capacity`](Self::version_resource_capacity).
    pub fn reserved_version_resource_window(&mut self) -> Result<SectionWindow<&mut S>, PeError> {
        let capacity = self.version_resource_capacity()?;
        let resource = self.located("reserved_version_resource_window")?;

        SectionWindow::new(&mut self.stream, resource.file_offset(), capacity)
            .map_err(PeError::from)
    }

    /// How many bytes the version resource may occupy without overwriting anything else.
    ///
    /// Sections are never moved, so this is the distance from the start of the blob to whichever
    /// comes first: the next structure of the resource tree, the data of another resource, or the
    /// [growth limit](VersionResource::growth_limit).
    pub fn version_resource_capacity(&mut self) -> Result<u64, PeError> {
        let resource = self.located("version_resource_capacity")?;
        let headers = self
            .headers
            .as_ref()
            .ok_or(PeError::header_not_read("version_resource_capacity"))?;

        let occupied = occupied_resource_ranges(
            &mut self.stream,
            headers,
            resource.resource_directory_offset,
        )?;

        let start = resource.file_offset();
        let end = occupied
            .iter()
            .map(|range| range.start)
            .filter(|&range_start| range_start > start)
            .fold(resource.growth_limit(), u64::min);

        let capacity = end.saturating_sub(start);
        debug!(
            capacity,
            size = resource.size(),
            "Version resource may grow up to {end:#X}"
        );
        Ok(capacity)
    }

    /// Computes the checksum of the image as it currently is on disk.
    pub fn compute_checksum(&mut self) -> Result<u32, PeError> {
        let offset = self.checksum_offset()?;

        self.stream.seek(SeekFrom::Start(0))?;
        Ok(checksum::calculate_from_reader(&mut self.stream, offset)?)
    }

    fn located(&self, operation: &'static str) -> Result<VersionResource, PeError> {
        if self.headers.is_none() {
            return Err(PeError::header_not_read(operation));
        }

        self.version_resource.ok_or(PeError::InvalidState {
            operation,
            reason: "the version resource has not been located",
        })
    }
}

impl<S: Read + Write + Seek> PeImage<S> {
    /// Rewrites the size of the version resource's data entry in place.
    pub fn update_resource_data_entry_size(&mut self, new_size: u32) -> Result<(), PeError> {
        let mut resource = self.located("update_resource_data_entry_size")?;

        resource.data_entry.set_size(new_size);
        self.stream
            .seek(SeekFrom::Start(resource.data_entry_offset()))?;
        self.stream.write_t(resource.data_entry())?;

        debug!(
            "Set version resource size to {new_size} at {:#X}",
            resource.data_entry_offset()
        );
        self.version_resource = Some(resource);
        Ok(())
    }

    /// Recomputes the image checksum over the whole stream and stores it in the header.
    pub fn recompute_and_write_checksum(&mut self) -> Result<u32, PeError> {
        let checksum = self.compute_checksum()?;
        let offset = self.checksum_offset()?;

        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.write_u32::<LE>(checksum)?;

        debug!("Wrote checksum {checksum:#010X} at {offset:#X}");
        Ok(checksum)
    }

    pub fn flush(&mut self) -> Result<(), PeError> {
        self.stream.flush().map_err(PeError::from)
    }
}

fn sole_id_entry(
    table: &ResourceDirectoryTable,
    structure: &'static str,
    expect_table: bool,
) -> Result<ImageResourceDirectoryEntry, PeError> {
    let entry = table.sole_entry().copied().ok_or_else(|| {
        PeError::format(
            table.offset(),
            structure,
            format!("expected exactly one entry but found {}", table.len()),
        )
    })?;

    if entry.has_name() {
        return Err(PeError::format(
            table.offset(),
            structure,
            "expected an integer identifier but found a named entry",
        ));
    }

    if entry.is_table() != expect_table {
        return Err(PeError::format(
            table.offset(),
            structure,
            if expect_table {
                "expected the entry to point at a directory"
            } else {
                "expected the entry to point at a data entry"
            },
        ));
    }

    Ok(entry)
}

/// Collects the file ranges taken by every table, entry, name and resource of the tree rooted at
/// `root_offset`.
fn occupied_resource_ranges<S>(
    stream: &mut S,
    headers: &PeHeaders,
    root_offset: u64,
) -> Result<Vec<Range<u64>>, PeError>
where
    S: Read + Seek,
{
    let mut occupied = Vec::new();
    let mut visited = HashSet::new();
    let mut pending = vec![(root_offset, 0)];

    while let Some((offset, depth)) = pending.pop() {
        if !visited.insert(offset) {
            continue;
        }

        if depth > MAX_RESOURCE_DEPTH {
            return Err(PeError::format(
                offset,
                "resource directory table",
                format!("resource tree is nested deeper than {MAX_RESOURCE_DEPTH} levels"),
            ));
        }

        let table = ResourceDirectoryTable::read_from(&mut *stream, offset)?;
        occupied.push(table.extent());

        for entry in table.entries() {
            if let Some(name_offset) = entry.name_offset() {
                let name_offset = root_offset + u64::from(name_offset);
                stream.seek(SeekFrom::Start(name_offset))?;
                let length = stream.read_u16::<LE>()?;
                occupied.push(name_offset..name_offset + 2 + u64::from(length) * 2);
            }

            let target = root_offset + u64::from(entry.data_offset());
            if entry.is_table() {
                pending.push((target, depth + 1));
                continue;
            }

            let data_entry = read_record::<ImageResourceDataEntry, _>(
                stream,
                target,
                "resource data entry",
            )?;
            occupied.push(target..target + size_of::<ImageResourceDataEntry>() as u64);

            // Data in another section does not constrain this one
            let data = headers.section_table.to_file_offset(data_entry.offset_to_data());
            if let Ok((data_offset, _)) = data {
                occupied.push(data_offset..data_offset + u64::from(data_entry.size()));
            }
        }
    }

    Ok(occupied)
}
