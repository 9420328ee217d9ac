//! Builds `.tar.gz` fixtures in memory.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use tar::{Builder, EntryType, Header};

pub(crate) enum Fixture<'a> {
    Dir(&'a str),
    File(&'a str, u32, &'a [u8]),
}

fn tar_bytes(entries: &[Fixture<'_>]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for entry in entries {
        let mut header = Header::new_gnu();
        match entry {
            Fixture::Dir(path) => {
                header.set_path(path).unwrap();
                header.set_entry_type(EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                header.set_cksum();
                builder.append(&header, &[][..]).unwrap();
            }
            Fixture::File(path, mode, content) => {
                header.set_path(path).unwrap();
                header.set_entry_type(EntryType::Regular);
                header.set_mode(*mode);
                header.set_size(content.len() as u64);
                header.set_cksum();
                builder.append(&header, *content).unwrap();
            }
        }
    }
    builder.into_inner().unwrap()
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

pub(crate) fn tar_gz(entries: &[Fixture<'_>]) -> Vec<u8> {
    gzip(&tar_bytes(entries))
}

/// Archive whose entries are followed by a block with a broken header
/// checksum instead of the end-of-archive marker.
pub(crate) fn tar_gz_with_trailing_garbage(entries: &[Fixture<'_>]) -> Vec<u8> {
    let mut bytes = tar_bytes(entries);
    // Drop the two zero blocks written by `into_inner`.
    bytes.truncate(bytes.len() - 1024);
    bytes.extend_from_slice(&[0xFF; 512]);
    gzip(&bytes)
}
