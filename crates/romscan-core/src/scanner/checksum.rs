/// Streaming CRC32 + SHA-256 of a file.
///
/// Both digests are fed from the same read buffer so each file is read once.
use crate::model::Checksums;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER: usize = 64 * 1024;

pub fn compute_checksums(path: &Path) -> io::Result<Checksums> {
    let mut file = File::open(path)?;
    let mut crc = crc32fast::Hasher::new();
    let mut sha = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        crc.update(&buf[..n]);
        sha.update(&buf[..n]);
    }

    Ok(Checksums {
        crc32: format!("{:08x}", crc.finalize()),
        sha256: format!("{:x}", sha.finalize()),
    })
}
