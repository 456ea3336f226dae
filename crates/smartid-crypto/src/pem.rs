//! Certificate PEM armour.

use smartid_core::{Result, SmartIdError};

const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
const PEM_FOOTER: &str = "-----END CERTIFICATE-----";
const LINE_WIDTH: usize = 64;

/// Wraps a base64 certificate body in PEM armour.
///
/// Existing armour is stripped first, so the operation is idempotent.
#[must_use]
pub fn add_pem_headers(value: &str) -> String {
    let body = strip_pem_headers(value);
    let mut pem = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for chunk in body.as_bytes().chunks(LINE_WIDTH) {
        // base64 is ASCII, chunks never split a character
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    pem
}

/// Removes header, footer and line breaks, leaving the base64 body.
#[must_use]
pub fn strip_pem_headers(pem: &str) -> String {
    pem.replace(PEM_HEADER, "")
        .replace(PEM_FOOTER, "")
        .replace(['\n', '\r'], "")
}

/// PEM encodes DER certificate bytes.
#[must_use]
pub fn der_to_pem(der: &[u8]) -> String {
    let block = ::pem::Pem::new("CERTIFICATE", der.to_vec());
    ::pem::encode_config(&block, ::pem::EncodeConfig::new().set_line_ending(::pem::LineEnding::LF))
}

/// Extracts every `CERTIFICATE` block from PEM text; other blocks are skipped.
pub fn parse_certificates(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let blocks = ::pem::parse_many(data)
        .map_err(|e| SmartIdError::Certificate(format!("PEM parse error: {e}")))?;
    Ok(blocks
        .into_iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(::pem::Pem::into_contents)
        .collect())
}
