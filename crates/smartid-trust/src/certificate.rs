//! X.509 accessors shared by the validators.

use der::asn1::ObjectIdentifier;
use smartid_core::{Certificate, Result, SemanticsIdentifier, SmartIdError};
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::oid_registry::Oid;
use x509_parser::prelude::{FromDer, X509Certificate};

use smartid_crypto::oid;

const OID_COMMON_NAME: &str = "2.5.4.3";
const OID_SURNAME: &str = "2.5.4.4";
const OID_SERIAL_NUMBER: &str = "2.5.4.5";
const OID_GIVEN_NAME: &str = "2.5.4.42";

/// Parses DER certificate bytes; trailing data is ignored.
pub fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>> {
    X509Certificate::from_der(der)
        .map(|(_, cert)| cert)
        .map_err(|e| SmartIdError::Certificate(format!("Unable to parse certificate: {e}")))
}

/// Compares an x509-parser OID with a `der` constant by encoded arcs.
pub fn oid_matches(parsed: &Oid<'_>, expected: &ObjectIdentifier) -> bool {
    parsed.as_bytes() == expected.as_bytes()
}

/// First subject attribute of the given type, as a string.
pub fn subject_attribute(cert: &X509Certificate<'_>, attr_oid: &str) -> Option<String> {
    cert.subject()
        .iter_attributes()
        .find(|attr| attr.attr_type().to_id_string() == attr_oid)
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_owned)
}

/// Subject CN, `N/A` when absent. Used for log context only.
pub fn common_name(cert: &X509Certificate<'_>) -> String {
    subject_attribute(cert, OID_COMMON_NAME).unwrap_or_else(|| "N/A".into())
}

/// OCSP responder URL from the authority information access extension.
pub fn ocsp_url(cert: &X509Certificate<'_>) -> Option<String> {
    cert.extensions().iter().find_map(|ext| match ext.parsed_extension() {
        ParsedExtension::AuthorityInfoAccess(aia) => aia
            .accessdescs
            .iter()
            .filter(|desc| oid_matches(&desc.access_method, &oid::OCSP_ACCESS_METHOD))
            .find_map(|desc| match desc.access_location {
                GeneralName::URI(uri) => Some(uri.trim().to_owned()),
                _ => None,
            }),
        _ => None,
    })
}

/// True when basic constraints mark the certificate as a CA.
pub fn is_ca(cert: &X509Certificate<'_>) -> bool {
    matches!(cert.basic_constraints(), Ok(Some(bc)) if bc.value.ca)
}

/// Natural person named in a Smart-ID certificate subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSubject {
    given_name: String,
    surname: String,
    serial_number: String,
}

impl CertificateSubject {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let cert = parse_certificate(der)?;
        let attribute = |attr_oid: &str, name: &str| {
            subject_attribute(&cert, attr_oid).ok_or_else(|| {
                SmartIdError::Certificate(format!("certificate subject has no {name}"))
            })
        };
        Ok(Self {
            given_name: attribute(OID_GIVEN_NAME, "givenName")?,
            surname: attribute(OID_SURNAME, "surname")?,
            serial_number: attribute(OID_SERIAL_NUMBER, "serialNumber")?,
        })
    }

    pub fn of(certificate: &Certificate) -> Result<Self> {
        Self::from_der(certificate.der())
    }

    /// Given name in title case
    pub fn given_name(&self) -> String {
        title_case(&self.given_name)
    }

    /// Surname in title case
    pub fn surname(&self) -> String {
        title_case(&self.surname)
    }

    /// "Given Surname"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name(), self.surname())
    }

    /// Subject `serialNumber` read as `PNOEE-30303039914` style identifier.
    pub fn identifier(&self) -> Result<SemanticsIdentifier> {
        self.serial_number.parse()
    }
}

/// Lowercases, then capitalises the first letter of every word.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for c in value.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        word_start = !c.is_alphanumeric();
    }
    out
}
