pub mod patch;
pub mod show;

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Result, bail};

pub fn is_valid_file(path: &str) -> Result<Utf8PathBuf> {
    let path = Utf8Path::new(path);
    if !path.exists() {
        bail!("{path} does not exist")
    }
    if !path.is_file() {
        bail!("{path} is not a file")
    }
    Ok(path.to_path_buf())
}
