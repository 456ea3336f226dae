//! Path building from a certificate to a bundled root.

use chrono::{DateTime, Utc};
use smartid_core::{Result, SmartIdError};
use tracing::{debug, warn};
use x509_parser::prelude::X509Certificate;

use crate::bundle::TrustStore;
use crate::certificate::{common_name, is_ca, parse_certificate};

/// Longest path, counted in issuers above the leaf
const MAX_CHAIN_DEPTH: usize = 8;

fn valid_at(cert: &X509Certificate<'_>, now: i64) -> bool {
    let validity = cert.validity();
    validity.not_before.timestamp() <= now && now <= validity.not_after.timestamp()
}

fn issued_by(cert: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    cert.issuer().as_raw() == issuer.subject().as_raw()
        && cert.verify_signature(Some(issuer.public_key())).is_ok()
}

impl TrustStore {
    /// Fails with [`SmartIdError::CertificateChain`] unless a path of valid,
    /// correctly signed certificates leads from `der` to a bundled root.
    pub fn validate_chain(&self, der: &[u8]) -> Result<()> {
        self.validate_chain_at(der, Utc::now())
    }

    pub fn validate_chain_at(&self, der: &[u8], now: DateTime<Utc>) -> Result<()> {
        let cert = parse_certificate(der)?;
        let cn = common_name(&cert);
        if self.chains_to_root(der, &cert, now.timestamp(), 0) {
            debug!(subject = %cn, "certificate chain validation passed");
            Ok(())
        } else {
            warn!(subject = %cn, "certificate chain validation failed");
            Err(SmartIdError::CertificateChain)
        }
    }

    fn chains_to_root(&self, der: &[u8], cert: &X509Certificate<'_>, now: i64, depth: usize) -> bool {
        if !valid_at(cert, now) {
            return false;
        }
        if self.roots().iter().any(|root| root == der) {
            return true;
        }
        if depth >= MAX_CHAIN_DEPTH {
            return false;
        }

        for root_der in self.roots() {
            let Ok(root) = parse_certificate(root_der) else {
                continue;
            };
            if issued_by(cert, &root) && valid_at(&root, now) {
                return true;
            }
        }
        for int_der in self.intermediates() {
            let Ok(intermediate) = parse_certificate(int_der) else {
                continue;
            };
            if int_der.as_slice() != der
                && is_ca(&intermediate)
                && issued_by(cert, &intermediate)
                && self.chains_to_root(int_der, &intermediate, now, depth + 1)
            {
                return true;
            }
        }
        false
    }

    /// Bundled certificate whose subject is `cert`'s issuer, intermediates
    /// first.
    pub fn find_issuer(&self, cert: &X509Certificate<'_>) -> Option<&[u8]> {
        self.intermediates()
            .iter()
            .chain(self.roots())
            .find(|candidate| {
                parse_certificate(candidate)
                    .is_ok_and(|issuer| issuer.subject().as_raw() == cert.issuer().as_raw())
            })
            .map(Vec::as_slice)
    }
}
