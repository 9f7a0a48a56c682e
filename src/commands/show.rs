use std::io::Write;

use anstream::stdout;
use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::Result;
use owo_colors::OwoColorize;
use verstamp::{
    Inspection, inspect_file,
    version_info::{FixedFileInfo, Translation, VersionInfo},
};

use super::is_valid_file;

/// Prints the version resource and checksum of a PE image without modifying it
#[derive(Parser)]
pub struct Show {
    #[arg(value_parser = is_valid_file, value_hint = clap::ValueHint::FilePath)]
    file_path: Utf8PathBuf,
}

impl Show {
    pub fn run(self) -> Result<()> {
        let inspection = inspect_file(&self.file_path)?;

        let mut lock = stdout().lock();
        write_version_info(&mut lock, &inspection.version_info)?;
        write_checksum(&mut lock, &inspection)?;
        Ok(())
    }
}

fn encoding(translation: Translation) -> &'static str {
    translation.encoding_name().unwrap_or("unknown encoding")
}

fn write_fixed_file_info<W: Write>(writer: &mut W, info: &FixedFileInfo) -> std::io::Result<()> {
    writeln!(writer, "File version: {}", info.file_version().blue())?;
    writeln!(writer, "Product version: {}", info.product_version().blue())?;

    let flags = info
        .file_flags()
        .iter_names()
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    if !flags.is_empty() {
        writeln!(writer, "File flags: {}", flags.join(" | "))?;
    }

    writeln!(writer, "File type: {}", info.file_type_name())
}

fn write_version_info<W: Write>(writer: &mut W, info: &VersionInfo) -> std::io::Result<()> {
    match info.fixed_file_info() {
        Some(fixed_file_info) => write_fixed_file_info(writer, fixed_file_info)?,
        None => writeln!(writer, "{}", "No fixed file info".yellow())?,
    }

    for translation in info.translations() {
        writeln!(
            writer,
            "Translation: language {:#06X}, code page {} ({})",
            translation.language(),
            translation.code_page(),
            encoding(*translation)
        )?;
    }

    for table in info.string_tables() {
        writeln!(
            writer,
            "String table {} ({}):",
            table.translation.bold(),
            encoding(table.translation)
        )?;
        for (key, value) in &table.strings {
            writeln!(writer, "  {}: {value}", key.green())?;
        }
    }

    Ok(())
}

fn write_checksum<W: Write>(writer: &mut W, inspection: &Inspection) -> std::io::Result<()> {
    writeln!(
        writer,
        "Version resource: {} bytes at {:#X}",
        inspection.version_resource.size(),
        inspection.version_resource.file_offset()
    )?;

    let computed = if inspection.computed_checksum == inspection.stored_checksum {
        format!("{:#010X}", inspection.computed_checksum).green().to_string()
    } else {
        format!("{:#010X}", inspection.computed_checksum).red().to_string()
    };
    writeln!(
        writer,
        "Checksum: {:#010X} stored, {computed} computed",
        inspection.stored_checksum
    )?;

    if inspection.signed {
        writeln!(writer, "{}", "The image is signed and cannot be patched".yellow())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use anstream::StripStream;
    use indexmap::IndexMap;
    use indoc::indoc;
    use verstamp::version_info::{
        StringFileInfo, StringTable, Translation, VarFileInfo, VersionChild, VersionInfo,
    };

    use super::write_version_info;

    #[test]
    fn prints_tables_with_encodings() {
        let translation = Translation::new(0x0409, 1200);
        let mut table = StringTable::new(translation);
        table.strings = IndexMap::from([
            ("CompanyName".to_owned(), "Acme Corporation".to_owned()),
            ("FileVersion".to_owned(), "1.2.3.4".to_owned()),
        ]);
        let info = VersionInfo::new(
            None,
            vec![
                VersionChild::StringFileInfo(StringFileInfo {
                    tables: vec![table],
                }),
                VersionChild::VarFileInfo(VarFileInfo {
                    translations: vec![translation],
                }),
            ],
        );

        let mut buffer = Vec::new();
        write_version_info(&mut StripStream::new(&mut buffer), &info).unwrap();

        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            indoc! {"
                No fixed file info
                Translation: language 0x0409, code page 1200 (UTF-16LE)
                String table 040904b0 (UTF-16LE):
                  CompanyName: Acme Corporation
                  FileVersion: 1.2.3.4
            "}
        );
    }
}
