//! Smart-ID policy, QC statement and key usage rules for end-user
//! certificates.

use chrono::{DateTime, Utc};
use smartid_core::{Certificate, CertificateLevel, Result, SmartIdError};
use smartid_crypto::asn1::{self, has_statement, QcStatements};
use smartid_crypto::oid;
use tracing::{debug, warn};
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::X509Certificate;

use crate::bundle::TrustStore;
use crate::certificate::{common_name, oid_matches, parse_certificate};

/// Validates authentication and signing certificates against a trust store.
#[derive(Debug, Clone, Copy)]
pub struct SmartIdCertificateValidator<'a> {
    store: &'a TrustStore,
}

impl<'a> SmartIdCertificateValidator<'a> {
    pub const fn new(store: &'a TrustStore) -> Self {
        Self { store }
    }

    /// Chain, policy OID and authentication key usage.
    pub fn validate_auth_certificate(&self, certificate: &Certificate) -> Result<()> {
        self.validate_auth_certificate_at(certificate, Utc::now())
    }

    pub fn validate_auth_certificate_at(
        &self,
        certificate: &Certificate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let cert = parse_certificate(certificate.der())?;
        let cn = common_name(&cert);
        debug!(subject = %cn, "authentication certificate validation started");

        self.store.validate_chain_at(certificate.der(), now)?;
        validate_policy(&cert, certificate.level())?;
        validate_auth_key_usage(&cert)?;

        debug!(subject = %cn, "authentication certificate validation passed");
        Ok(())
    }

    /// Chain, policy OID, QC statements and non-repudiation.
    pub fn validate_signing_certificate(&self, certificate: &Certificate) -> Result<()> {
        self.validate_signing_certificate_at(certificate, Utc::now())
    }

    pub fn validate_signing_certificate_at(
        &self,
        certificate: &Certificate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let cert = parse_certificate(certificate.der())?;
        let cn = common_name(&cert);
        debug!(subject = %cn, "signing certificate validation started");

        self.store.validate_chain_at(certificate.der(), now)?;
        validate_policy(&cert, certificate.level())?;
        validate_qc_statements(&cert, certificate.level())?;
        validate_signing_key_usage(&cert)?;

        debug!(subject = %cn, "signing certificate validation passed");
        Ok(())
    }
}

/// QUALIFIED requires the qualified policy, every other level the
/// non-qualified one.
pub fn validate_policy(cert: &X509Certificate<'_>, level: CertificateLevel) -> Result<()> {
    let expected = match level {
        CertificateLevel::Qualified => oid::SMART_ID_POLICY_QUALIFIED,
        CertificateLevel::Advanced | CertificateLevel::Qscd => oid::SMART_ID_POLICY_NON_QUALIFIED,
    };

    let policies = cert.extensions().iter().find_map(|ext| match ext.parsed_extension() {
        ParsedExtension::CertificatePolicies(policies) => Some(policies),
        _ => None,
    });
    let Some(policies) = policies else {
        warn!(subject = %common_name(cert), "certificate policies extension is missing");
        return Err(SmartIdError::CertificatePolicy);
    };

    if policies
        .iter()
        .any(|policy| oid_matches(&policy.policy_id, &expected))
    {
        debug!(subject = %common_name(cert), "Smart-ID policy OID present");
        Ok(())
    } else {
        warn!(policy = %expected, level = %level, "required Smart-ID policy OID missing");
        Err(SmartIdError::CertificatePolicy)
    }
}

/// QC compliance statement, required unless the level is ADVANCED.
pub fn validate_qc_statements(cert: &X509Certificate<'_>, level: CertificateLevel) -> Result<()> {
    if level == CertificateLevel::Advanced {
        debug!("QC statements not required for ADVANCED level");
        return Ok(());
    }

    let Some(ext) = cert
        .extensions()
        .iter()
        .find(|ext| oid_matches(&ext.oid, &oid::QC_STATEMENTS))
    else {
        warn!(subject = %common_name(cert), "QC statements extension is missing");
        return Err(SmartIdError::CertificateQc);
    };

    let statements: QcStatements = asn1::decode(ext.value).map_err(|e| {
        warn!(error = %e, "QC statements extension is malformed");
        SmartIdError::CertificateQc
    })?;
    if has_statement(&statements, &oid::QC_COMPLIANCE) {
        debug!(subject = %common_name(cert), "QC compliance statement present");
        Ok(())
    } else {
        warn!(subject = %common_name(cert), "QC compliance statement missing");
        Err(SmartIdError::CertificateQc)
    }
}

/// Current profile: digitalSignature + Smart-ID auth EKU. Legacy profile:
/// digitalSignature, keyEncipherment, dataEncipherment + TLS client auth.
pub fn validate_auth_key_usage(cert: &X509Certificate<'_>) -> Result<()> {
    let key_usage = cert.key_usage().ok().flatten().map(|ext| ext.value);
    let eku = cert.extended_key_usage().ok().flatten().map(|ext| ext.value);

    let digital_signature = key_usage.is_some_and(|ku| ku.digital_signature());
    let smart_id_auth = eku.is_some_and(|eku| {
        eku.other
            .iter()
            .any(|o| oid_matches(o, &oid::SMART_ID_AUTH_EKU))
    });
    if digital_signature && smart_id_auth {
        debug!(subject = %common_name(cert), "authentication key usage passed");
        return Ok(());
    }

    let legacy_usage =
        key_usage.is_some_and(|ku| ku.key_encipherment() && ku.data_encipherment());
    let client_auth = eku.is_some_and(|eku| eku.client_auth);
    if digital_signature && legacy_usage && client_auth {
        debug!(subject = %common_name(cert), "legacy authentication key usage passed");
        return Ok(());
    }

    warn!(
        subject = %common_name(cert),
        key_usage = ?key_usage,
        extended_key_usage = ?eku,
        "certificate does not meet Smart-ID authentication key usage"
    );
    Err(SmartIdError::CertificateKeyUsage)
}

/// Signing certificates must allow non-repudiation.
pub fn validate_signing_key_usage(cert: &X509Certificate<'_>) -> Result<()> {
    let non_repudiation = cert
        .key_usage()
        .ok()
        .flatten()
        .is_some_and(|ext| ext.value.non_repudiation());
    if non_repudiation {
        Ok(())
    } else {
        warn!(subject = %common_name(cert), "nonRepudiation key usage missing");
        Err(SmartIdError::CertificateKeyUsage)
    }
}
