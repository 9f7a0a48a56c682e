mod align;
mod read;
mod write;

pub use align::{DWORD, skip_padding, write_padding};
pub use read::ReadBytesExt;
pub use write::WriteBytesExt;
