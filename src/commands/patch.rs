use std::io::Write;

use anstream::stdout;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use color_eyre::Result;
use owo_colors::OwoColorize;
use verstamp::{FileVersion, StampOptions, StampReport, stamp_file};

use super::is_valid_file;

/// Writes a new version into the version resource of a PE image and updates its checksum
#[derive(Parser)]
pub struct Patch {
    #[arg(value_parser = is_valid_file, value_hint = clap::ValueHint::FilePath)]
    file_path: Utf8PathBuf,

    /// The numeric version, as up to four dot-separated components
    #[arg(long, env = "VERSTAMP_VERSION")]
    version: FileVersion,

    /// The text to write to the ProductVersion string. Defaults to the numeric version
    #[arg(short, long, env = "VERSTAMP_INFORMATIONAL_VERSION")]
    informational_version: Option<String>,

    /// Leave the file version and the FileVersion string as they are
    #[arg(long, env = "VERSTAMP_SKIP_FILE_VERSION")]
    skip_file_version: bool,

    /// Leave the product version and the ProductVersion string as they are
    #[arg(long, env = "VERSTAMP_SKIP_PRODUCT_VERSION")]
    skip_product_version: bool,
}

impl Patch {
    pub fn run(self) -> Result<()> {
        let options = StampOptions::builder()
            .version(self.version)
            .maybe_informational_version(self.informational_version)
            .patch_file_version(!self.skip_file_version)
            .patch_product_version(!self.skip_product_version)
            .build();

        let report = stamp_file(&self.file_path, &options)?;

        write_report(&mut stdout().lock(), &self.file_path, &options, &report)?;
        Ok(())
    }
}

fn write_report<W: Write>(
    writer: &mut W,
    path: &Utf8Path,
    options: &StampOptions,
    report: &StampReport,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{} stamped {} with version {}",
        "Successfully".green(),
        path.blue(),
        options.version().blue()
    )?;

    writeln!(
        writer,
        "Version resource: {} -> {} bytes ({} available)",
        report.previous_size, report.size, report.capacity
    )?;

    if report.fixed_file_info_patched {
        writeln!(writer, "Fixed file info: updated")?;
    } else if options.patch_file_version() || options.patch_product_version() {
        writeln!(writer, "Fixed file info: {}", "not present".yellow())?;
    }

    for change in &report.changed_strings {
        writeln!(
            writer,
            "{} ({}): {:?} -> {:?}",
            change.key, change.translation, change.previous, change.current
        )?;
    }

    writeln!(
        writer,
        "Checksum: {:#010X} -> {:#010X}",
        report.previous_checksum, report.checksum
    )
}
