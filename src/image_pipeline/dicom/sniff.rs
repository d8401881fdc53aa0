use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// File extension conventionally used for DICOM Part 10 files.
pub const DICOM_EXTENSION: &str = "dcm";

/// Length of the Part 10 preamble preceding the magic.
pub const PREAMBLE_LEN: u64 = 128;

pub const DICOM_MAGIC: &[u8; 4] = b"DICM";

/// Best-effort check whether `path` holds DICOM data.
///
/// Unreadable or truncated files count as "not DICOM".
pub fn is_dicom(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DICOM_EXTENSION));
    by_extension || has_dicom_magic(path)
}

fn has_dicom_magic(path: &Path) -> bool {
    let read_magic = || -> std::io::Result<[u8; 4]> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(PREAMBLE_LEN))?;
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        Ok(magic)
    };
    matches!(read_magic(), Ok(magic) if &magic == DICOM_MAGIC)
}
