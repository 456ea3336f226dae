//! Digest helpers via `ring::digest`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use ring::digest::{Context, SHA1_FOR_LEGACY_USE_ONLY, SHA256};
use smartid_core::{Result, SmartIdError};

/// Buffer size for streaming file reads (64 KiB).
const BUF_SIZE: usize = 64 * 1024;

/// Compute SHA-256 of a file, streaming to avoid loading it all into memory.
///
/// Returns lowercase hex-encoded digest.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| SmartIdError::io(path, e))?;

    let mut context = Context::new(&SHA256);
    let mut buf = vec![0u8; BUF_SIZE];

    loop {
        let n = file.read(&mut buf).map_err(|e| SmartIdError::io(path, e))?;
        if n == 0 {
            break;
        }
        context.update(&buf[..n]);
    }

    Ok(hex::encode(context.finish().as_ref()))
}

/// Compute SHA-256 of raw bytes, hex encoded.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    ring::digest::digest(&SHA256, data).as_ref().to_vec()
}

/// SHA-1, only for OCSP `CertID` hashes.
#[must_use]
pub fn sha1(data: &[u8]) -> Vec<u8> {
    ring::digest::digest(&SHA1_FOR_LEGACY_USE_ONLY, data)
        .as_ref()
        .to_vec()
}

/// Turns standard base64 into the URL-safe unpadded alphabet.
#[must_use]
pub fn to_url_safe(base64: &str) -> String {
    base64
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

/// URL-safe unpadded base64 of SHA-256(`data`).
#[must_use]
pub fn sha256_url_safe(data: &[u8]) -> String {
    to_url_safe(&STANDARD.encode(sha256(data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sha256_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "hello world").unwrap();
        tmp.flush().unwrap();

        let hash = sha256_file(tmp.path()).unwrap();
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_empty_file() {
        let tmp = NamedTempFile::new().unwrap();
        assert_eq!(
            sha256_file(tmp.path()).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = sha256_file(Path::new("/nonexistent/ca.pem")).unwrap_err();
        assert!(matches!(err, SmartIdError::Io { .. }));
    }

    #[test]
    fn test_sha1() {
        assert_eq!(
            hex::encode(sha1(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn url_safe_replaces_alphabet_and_padding() {
        assert_eq!(to_url_safe("a+b/c=="), "a-b_c");
        assert_eq!(
            sha256_url_safe(b"verifier-123"),
            "Ds3NpaREu9I2EYq6l0l3ZkFyv_Gt5O4EpGD6cZlY0Kg"
        );
    }
}
