//! Synthetic version resources and PE images for tests.

use bon::Builder;
use zerocopy::FromBytes;

use crate::version_info::FixedFileInfo;

fn pad(bytes: &mut Vec<u8>) {
    bytes.resize(bytes.len().next_multiple_of(4), 0);
}

fn utf16_nul(value: &str) -> Vec<u8> {
    value
        .encode_utf16()
        .chain([0])
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// A raw version node, encoded without going through the codec so that malformed trees can be
/// built too.
#[derive(Clone, Debug)]
pub struct Node {
    key: String,
    value_type: u16,
    value: Vec<u8>,
    value_length: Option<u16>,
    children: Vec<Node>,
    unpadded: bool,
}

impl Node {
    fn new(key: &str, value_type: u16, value: Vec<u8>, children: Vec<Self>) -> Self {
        Self {
            key: key.to_owned(),
            value_type,
            value,
            value_length: None,
            children,
            unpadded: false,
        }
    }

    pub fn root(fixed_file_info: Option<FixedFileInfo>, children: Vec<Self>) -> Self {
        let value = fixed_file_info
            .map(|info| zerocopy::IntoBytes::as_bytes(&info).to_vec())
            .unwrap_or_default();
        Self::new("VS_VERSION_INFO", 0, value, children)
    }

    pub fn text(key: &str, children: Vec<Self>) -> Self {
        Self::new(key, 1, Vec::new(), children)
    }

    pub fn string_file_info(tables: Vec<Self>) -> Self {
        Self::text("StringFileInfo", tables)
    }

    pub fn string_table(key: &str, strings: Vec<Self>) -> Self {
        Self::text(key, strings)
    }

    pub fn string(key: &str, value: &str) -> Self {
        Self::new(key, 1, utf16_nul(value), Vec::new())
    }

    pub fn translation(pairs: &[(u16, u16)]) -> Self {
        let value = pairs
            .iter()
            .flat_map(|&(language, code_page)| {
                language.to_le_bytes().into_iter().chain(code_page.to_le_bytes())
            })
            .collect();
        Self::new("Translation", 0, value, Vec::new())
    }

    pub fn var_file_info(pairs: &[(u16, u16)]) -> Self {
        Self::text("VarFileInfo", vec![Self::translation(pairs)])
    }

    pub fn with_key(mut self, key: &str) -> Self {
        key.clone_into(&mut self.key);
        self
    }

    pub fn with_type(mut self, value_type: u16) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn with_value_length(mut self, value_length: u16) -> Self {
        self.value_length = Some(value_length);
        self
    }

    /// Leaves the padding after string values out of their `wLength`, the way `rc.exe` does.
    pub fn with_unpadded_strings(mut self) -> Self {
        if self.children.is_empty() && self.value_type == 1 {
            self.unpadded = true;
        }
        self.children = self
            .children
            .into_iter()
            .map(Self::with_unpadded_strings)
            .collect();
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write(&mut bytes);
        bytes
    }

    fn write(&self, bytes: &mut Vec<u8>) {
        let start = bytes.len();
        bytes.extend([0; 6]);
        bytes.extend(utf16_nul(&self.key));
        pad(bytes);

        bytes.extend(&self.value);
        let value_end = bytes.len();
        pad(bytes);

        for child in &self.children {
            child.write(bytes);
        }

        let end = if self.unpadded { value_end } else { bytes.len() };
        let value_length = self.value_length.unwrap_or_else(|| {
            let length = if self.value_type == 1 {
                self.value.len() / 2
            } else {
                self.value.len()
            };
            length as u16
        });

        bytes[start..start + 2].copy_from_slice(&((end - start) as u16).to_le_bytes());
        bytes[start + 2..start + 4].copy_from_slice(&value_length.to_le_bytes());
        bytes[start + 4..start + 6].copy_from_slice(&self.value_type.to_le_bytes());
    }
}

pub fn sample_fixed_file_info() -> FixedFileInfo {
    let words: [u32; 13] = [
        FixedFileInfo::SIGNATURE,
        0x0001_0000,
        0x0001_0002,
        0x0003_0004,
        0x0001_0002,
        0x0003_0004,
        0x3F,
        0,
        0x0004_0004,
        0x1,
        0,
        0,
        0,
    ];
    let bytes = words.iter().flat_map(|word| word.to_le_bytes()).collect::<Vec<_>>();
    FixedFileInfo::read_from_bytes(&bytes).unwrap()
}

pub fn sample_nodes() -> Node {
    Node::root(
        Some(sample_fixed_file_info()),
        vec![
            Node::string_file_info(vec![Node::string_table(
                "040904b0",
                vec![
                    Node::string("CompanyName", "Acme Corporation"),
                    Node::string("FileDescription", "Sample application"),
                    Node::string("FileVersion", "1.2.3.4"),
                    Node::string("InternalName", "sample"),
                    Node::string("ProductName", "Sample"),
                    Node::string("ProductVersion", "1.2.3.4"),
                ],
            )]),
            Node::var_file_info(&[(0x0409, 0x04B0)]),
        ],
    )
}

pub fn sample_version_info_bytes() -> Vec<u8> {
    sample_nodes().encode()
}

pub fn sample_version_info() -> crate::version_info::VersionInfo {
    crate::version_info::VersionInfo::decode(&sample_version_info_bytes()).unwrap()
}

/// A minimal PE image with a single `.rsrc` section holding a resource tree.
#[derive(Builder, Clone, Debug)]
pub struct PeFixture {
    #[builder(default)]
    pe32_plus: bool,
    #[builder(default = vec![1033])]
    languages: Vec<u32>,
    /// Gives the version resource a string name instead of the integer `1`.
    #[builder(default)]
    named_resource: bool,
    #[builder(default = 16)]
    resource_type: u32,
    /// Places a manifest resource after the version resource.
    #[builder(default)]
    trailing_resource: bool,
    /// Adds a certificate table entry and its 8 bytes at the end of the file.
    #[builder(default)]
    signed: bool,
    #[builder(default = sample_version_info_bytes())]
    version_info: Vec<u8>,
    /// `VirtualSize` of `.rsrc`, below its padded raw data size.
    virtual_size: Option<u32>,
    /// Size recorded in the resource data directory.
    resource_directory_size: Option<u32>,
}

impl Default for PeFixture {
    fn default() -> Self {
        Self::builder().build()
    }
}

struct Layout {
    version_names: u64,
    version_languages: u64,
    manifest_names: u64,
    manifest_languages: u64,
    data_entries: u64,
    name_string: u64,
    blob: u64,
    trailing: u64,
}

fn put_u16(bytes: &mut [u8], offset: u64, value: u16) {
    let offset = offset as usize;
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(bytes: &mut [u8], offset: u64, value: u32) {
    let offset = offset as usize;
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

impl PeFixture {
    pub const NT_OFFSET: u64 = 0x80;
    pub const OPTIONAL_HEADER_OFFSET: u64 = Self::NT_OFFSET + 4 + 20;
    pub const CHECKSUM_OFFSET: u64 = Self::OPTIONAL_HEADER_OFFSET + 64;
    pub const RESOURCE_OFFSET: u64 = 0x400;
    pub const RESOURCE_RVA: u32 = 0x1000;
    const SECTION_SIZE: u64 = 0x400;
    const TABLE: u64 = 16;
    const ENTRY: u64 = 8;
    const DATA_ENTRY: u64 = 16;
    const NAME: &'static str = "APP";
    const TRAILING_SLACK: u64 = 0x40;
    const TRAILING_SIZE: u32 = 0x40;

    const fn rva(offset: u64) -> u32 {
        Self::RESOURCE_RVA + (offset - Self::RESOURCE_OFFSET) as u32
    }

    /// All offsets are absolute file offsets.
    fn layout(&self) -> Layout {
        let type_count = 1 + u64::from(self.trailing_resource);

        let version_names = Self::RESOURCE_OFFSET + Self::TABLE + type_count * Self::ENTRY;
        let version_languages = version_names + Self::TABLE + Self::ENTRY;
        let manifest_names =
            version_languages + Self::TABLE + self.languages.len() as u64 * Self::ENTRY;
        let manifest_languages = manifest_names + Self::TABLE + Self::ENTRY;
        let data_entries = if self.trailing_resource {
            manifest_languages + Self::TABLE + Self::ENTRY
        } else {
            manifest_names
        };
        let name_string = data_entries
            + (self.languages.len() as u64 + u64::from(self.trailing_resource)) * Self::DATA_ENTRY;
        let blob = (name_string + 2 + Self::NAME.len() as u64 * 2).next_multiple_of(16);
        let trailing =
            (blob + self.version_info.len() as u64 + Self::TRAILING_SLACK).next_multiple_of(16);

        Layout {
            version_names,
            version_languages,
            manifest_names,
            manifest_languages,
            data_entries,
            name_string,
            blob,
            trailing,
        }
    }

    pub fn blob_offset(&self) -> u64 {
        self.layout().blob
    }

    pub const fn section_end(&self) -> u64 {
        Self::RESOURCE_OFFSET + Self::SECTION_SIZE
    }

    pub fn trailing_resource_offset(&self) -> u64 {
        self.layout().trailing
    }

    /// Encodes the image.
    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; self.section_end() as usize];
        self.write_headers(&mut bytes);
        self.write_resources(&mut bytes);

        if self.signed {
            bytes.extend([0xA5; 8]);
        }
        bytes
    }

    fn write_headers(&self, bytes: &mut [u8]) {
        bytes[..2].copy_from_slice(b"MZ");
        put_u32(bytes, 0x3C, Self::NT_OFFSET as u32);
        bytes[Self::NT_OFFSET as usize..Self::NT_OFFSET as usize + 4].copy_from_slice(b"PE\0\0");

        let (machine, optional_header_size, characteristics) = if self.pe32_plus {
            (0x8664, 240, 0x0022)
        } else {
            (0x014C, 224, 0x0102)
        };
        let coff = Self::NT_OFFSET + 4;
        put_u16(bytes, coff, machine);
        put_u16(bytes, coff + 2, 1);
        put_u16(bytes, coff + 16, optional_header_size);
        put_u16(bytes, coff + 18, characteristics);

        let optional = Self::OPTIONAL_HEADER_OFFSET;
        put_u16(bytes, optional, if self.pe32_plus { 0x20B } else { 0x10B });
        bytes[optional as usize + 2] = 14;
        put_u32(bytes, optional + 8, Self::SECTION_SIZE as u32);
        let windows_fields_end = if self.pe32_plus {
            bytes[optional as usize + 24..optional as usize + 32]
                .copy_from_slice(&0x1_4000_0000u64.to_le_bytes());
            optional + 112
        } else {
            put_u32(bytes, optional + 28, 0x40_0000);
            optional + 96
        };
        put_u32(bytes, optional + 32, 0x1000);
        put_u32(bytes, optional + 36, 0x200);
        put_u16(bytes, optional + 40, 6);
        put_u16(bytes, optional + 48, 6);
        put_u32(bytes, optional + 56, 0x2000);
        put_u32(bytes, optional + 60, Self::RESOURCE_OFFSET as u32);
        put_u16(bytes, optional + 68, 2);
        put_u32(bytes, windows_fields_end - 4, 16);

        let directories = windows_fields_end;
        put_u32(bytes, directories + 2 * 8, Self::RESOURCE_RVA);
        put_u32(
            bytes,
            directories + 2 * 8 + 4,
            self.resource_directory_size.unwrap_or(Self::SECTION_SIZE as u32),
        );
        if self.signed {
            put_u32(bytes, directories + 4 * 8, self.section_end() as u32);
            put_u32(bytes, directories + 4 * 8 + 4, 8);
        }

        let section = optional + u64::from(optional_header_size);
        bytes[section as usize..section as usize + 5].copy_from_slice(b".rsrc");
        put_u32(
            bytes,
            section + 8,
            self.virtual_size.unwrap_or(Self::SECTION_SIZE as u32),
        );
        put_u32(bytes, section + 12, Self::RESOURCE_RVA);
        put_u32(bytes, section + 16, Self::SECTION_SIZE as u32);
        put_u32(bytes, section + 20, Self::RESOURCE_OFFSET as u32);
        put_u32(bytes, section + 36, 0x4000_0040);
    }

    fn write_resources(&self, bytes: &mut [u8]) {
        const SUBDIRECTORY: u32 = 1 << 31;
        const NAMED: u32 = 1 << 31;

        let layout = self.layout();
        let relative = |offset: u64| (offset - Self::RESOURCE_OFFSET) as u32;

        let write_table = |bytes: &mut [u8], offset: u64, named: u16, ids: u16| {
            put_u16(bytes, offset + 12, named);
            put_u16(bytes, offset + 14, ids);
        };

        // Types, with the version resource first
        let root = Self::RESOURCE_OFFSET;
        write_table(bytes, root, 0, 1 + u16::from(self.trailing_resource));
        put_u32(bytes, root + Self::TABLE, self.resource_type);
        put_u32(
            bytes,
            root + Self::TABLE + 4,
            SUBDIRECTORY | relative(layout.version_names),
        );

        let names = layout.version_names;
        if self.named_resource {
            write_table(bytes, names, 1, 0);
            put_u32(bytes, names + Self::TABLE, NAMED | relative(layout.name_string));
        } else {
            write_table(bytes, names, 0, 1);
            put_u32(bytes, names + Self::TABLE, 1);
        }
        put_u32(
            bytes,
            names + Self::TABLE + 4,
            SUBDIRECTORY | relative(layout.version_languages),
        );

        let languages = layout.version_languages;
        write_table(bytes, languages, 0, self.languages.len() as u16);
        for (index, language) in (0u64..).zip(&self.languages) {
            let entry = languages + Self::TABLE + index * Self::ENTRY;
            let data_entry = layout.data_entries + index * Self::DATA_ENTRY;
            put_u32(bytes, entry, *language);
            put_u32(bytes, entry + 4, relative(data_entry));

            put_u32(bytes, data_entry, Self::rva(layout.blob));
            put_u32(bytes, data_entry + 4, self.version_info.len() as u32);
        }

        put_u16(bytes, layout.name_string, Self::NAME.len() as u16);
        for (index, unit) in (0u64..).zip(Self::NAME.encode_utf16()) {
            put_u16(bytes, layout.name_string + 2 + index * 2, unit);
        }

        let blob = layout.blob as usize;
        bytes[blob..blob + self.version_info.len()].copy_from_slice(&self.version_info);

        if self.trailing_resource {
            let manifest_type = root + Self::TABLE + Self::ENTRY;
            put_u32(bytes, manifest_type, 24);
            put_u32(bytes, manifest_type + 4, SUBDIRECTORY | relative(layout.manifest_names));

            write_table(bytes, layout.manifest_names, 0, 1);
            put_u32(bytes, layout.manifest_names + Self::TABLE, 1);
            put_u32(
                bytes,
                layout.manifest_names + Self::TABLE + 4,
                SUBDIRECTORY | relative(layout.manifest_languages),
            );

            let data_entry =
                layout.data_entries + self.languages.len() as u64 * Self::DATA_ENTRY;
            write_table(bytes, layout.manifest_languages, 0, 1);
            put_u32(bytes, layout.manifest_languages + Self::TABLE, 1033);
            put_u32(
                bytes,
                layout.manifest_languages + Self::TABLE + 4,
                relative(data_entry),
            );

            put_u32(bytes, data_entry, Self::rva(layout.trailing));
            put_u32(bytes, data_entry + 4, Self::TRAILING_SIZE);

            let trailing = layout.trailing as usize;
            bytes[trailing..trailing + Self::TRAILING_SIZE as usize].fill(b'm');
        }
    }
}
