use der::asn1::{OctetString, Uint};
use smartid_core::{Result, SmartIdError};
use smartid_crypto::asn1::{self, AlgorithmIdentifier, CertId, OcspRequest, Request, TbsRequest, Version};
use smartid_crypto::{hash, oid};
use x509_parser::num_bigint::BigUint;
use x509_parser::prelude::X509Certificate;

/// Reduces a serial number string to canonical decimal digits.
///
/// Whitespace and `:` separators are dropped. A `0x` prefix or any hex
/// letter selects base 16, otherwise the value is decimal. Returns an empty
/// string when the input is not a number at all.
pub fn normalize_serial(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if cleaned.is_empty() {
        return "0".into();
    }

    let (digits, hex) = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(rest) => (rest, true),
        None => (
            cleaned.as_str(),
            cleaned.chars().any(|c| matches!(c, 'a'..='f' | 'A'..='F')),
        ),
    };

    if hex {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            return "0".into();
        }
        return BigUint::parse_bytes(trimmed.as_bytes(), 16)
            .map(|n| n.to_str_radix(10))
            .unwrap_or_default();
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".into()
    } else {
        trimmed.to_owned()
    }
}

/// DER INTEGER for a decimal serial.
pub fn serial_to_uint(decimal: &str) -> Result<Uint> {
    let value = BigUint::parse_bytes(decimal.as_bytes(), 10)
        .ok_or_else(|| SmartIdError::Ocsp(format!("invalid certificate serial number '{decimal}'")))?;
    Uint::new(&value.to_bytes_be()).map_err(|e| SmartIdError::Asn1Encoding(e.to_string()))
}

/// A single-certificate OCSP request together with the serial it asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspRequestData {
    pub der: Vec<u8>,
    pub serial: Uint,
}

/// Builds the request for `subject` issued by `issuer`.
///
/// `CertID` uses SHA-1 over the issuer's raw subject name and over the bit
/// string contents of its public key.
pub fn build_request(
    subject: &X509Certificate<'_>,
    issuer: &X509Certificate<'_>,
) -> Result<OcspRequestData> {
    let serial = serial_to_uint(&normalize_serial(&subject.serial.to_str_radix(10)))?;

    let issuer_name_hash = hash::sha1(issuer.subject().as_raw());
    let issuer_key_hash = hash::sha1(issuer.public_key().subject_public_key.data.as_ref());

    let octets = |bytes: Vec<u8>| {
        OctetString::new(bytes).map_err(|e| SmartIdError::Asn1Encoding(e.to_string()))
    };
    let request = OcspRequest {
        tbs_request: TbsRequest {
            version: Some(Version::V1),
            requestor_name: None,
            request_list: vec![Request {
                req_cert: CertId {
                    hash_algorithm: AlgorithmIdentifier::with_null_parameters(oid::SHA1),
                    issuer_name_hash: octets(issuer_name_hash)?,
                    issuer_key_hash: octets(issuer_key_hash)?,
                    serial_number: serial.clone(),
                },
                single_request_extensions: None,
            }],
            request_extensions: None,
        },
        optional_signature: None,
    };

    Ok(OcspRequestData {
        der: asn1::encode(&request)?,
        serial,
    })
}
