//! In-memory archive builders for tests (here and in other crates).

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a zip container in memory. Names ending in `/` become directory
/// entries (their contents are ignored).
///
/// Panics on failure: the fixture is broken, not the code under test.
pub fn build_cbz<N, D>(entries: impl IntoIterator<Item = (N, D)>) -> Vec<u8>
where
    N: AsRef<str>,
    D: AsRef<[u8]>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        let name = name.as_ref();
        if name.ends_with('/') {
            writer.add_directory(name, options).expect("fixture: add directory");
        } else {
            writer.start_file(name, options).expect("fixture: start file");
            writer.write_all(data.as_ref()).expect("fixture: write file");
        }
    }
    writer.finish().expect("fixture: finish archive").into_inner()
}

/// A zip container with `count` sequentially named PNG pages.
pub fn numbered_cbz(count: usize) -> Vec<u8> {
    build_cbz((1..=count).map(|n| (format!("page{n}.png"), n.to_string())))
}

/// A zip whose central directory has been chopped off.
pub fn corrupt_cbz() -> Vec<u8> {
    let mut bytes = numbered_cbz(3);
    bytes.truncate(bytes.len() / 2);
    bytes
}

/// A single stored zip64 entry whose recorded uncompressed size (in both the
/// local header and the central directory) is `declared` instead of the
/// real length of `data`.
pub fn misdeclared_cbz(name: &str, data: &[u8], declared: u64) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored).large_file(true);
    writer.start_file(name, options).expect("fixture: start file");
    writer.write_all(data).expect("fixture: write file");
    let mut bytes = writer.finish().expect("fixture: finish archive").into_inner();

    // Zip64 extended information: tag 0x0001, u16 length, then the
    // uncompressed size as the first u64.
    let real = (data.len() as u64).to_le_bytes();
    let mut patched = 0;
    let mut i = 0;
    while i + 12 <= bytes.len() {
        if bytes[i..i + 2] == [0x01, 0x00] && bytes[i + 4..i + 12] == real {
            bytes[i + 4..i + 12].copy_from_slice(&declared.to_le_bytes());
            patched += 1;
            i += 12;
        } else {
            i += 1;
        }
    }
    assert!(patched > 0, "fixture: no zip64 size field found");
    bytes
}
