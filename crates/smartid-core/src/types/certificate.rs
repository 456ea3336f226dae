use base64::{engine::general_purpose::STANDARD, Engine};

use super::CertificateLevel;
use crate::{Result, SmartIdError};

/// End-user certificate returned with a successful session.
///
/// Holds the bare base64 body exactly as delivered and its DER decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    value: String,
    level: CertificateLevel,
    der: Vec<u8>,
}

impl Certificate {
    /// Decodes a base64 certificate body; line breaks are tolerated
    pub fn new(value: impl Into<String>, level: CertificateLevel) -> Result<Self> {
        let value = value.into();
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| SmartIdError::Certificate(format!("certificate value is not base64: {e}")))?;
        if der.is_empty() {
            return Err(SmartIdError::Certificate("certificate value is empty".into()));
        }
        Ok(Self { value, level, der })
    }

    /// Wraps DER bytes
    pub fn from_der(der: &[u8], level: CertificateLevel) -> Result<Self> {
        Self::new(STANDARD.encode(der), level)
    }

    /// Base64 body without PEM armour
    pub fn value(&self) -> &str {
        &self.value
    }

    pub const fn level(&self) -> CertificateLevel {
        self.level
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_body() {
        let cert = Certificate::new("MAMCAQE=", CertificateLevel::Qualified).unwrap();
        assert_eq!(cert.der(), &[0x30, 0x03, 0x02, 0x01, 0x01]);
        assert_eq!(cert.level(), CertificateLevel::Qualified);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Certificate::new("not base64!", CertificateLevel::Advanced).is_err());
        assert!(Certificate::new("", CertificateLevel::Advanced).is_err());
    }
}
