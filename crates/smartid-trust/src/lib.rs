//! # smartid-trust
//!
//! Certificate trust for Smart-ID relying parties.
//!
//! Nothing is trusted because it arrives in a session response. A user
//! certificate is accepted only when it chains to a CA certificate the
//! operator put on disk, carries the Smart-ID policy and usage markers for
//! its purpose, and its issuer's OCSP responder says it is good.
//!
//! ## Data Flow
//!
//! ```text
//! Phase 1: Trust bundle (disk, cached by folder hash)
//!   TrustBundleBuilder::build()
//!   -> classify PEM files into roots and intermediates
//!   -> <cache_dir>/<sha256>/ca.pem + int.pem
//!   -> TrustStore
//!
//! Phase 2: Certificate rules (no network)
//!   SmartIdCertificateValidator::validate_auth_certificate()
//!   SmartIdCertificateValidator::validate_signing_certificate()
//!   -> chain, policy OID, QC statements, key usage
//!
//! Phase 3: Revocation (OCSP responder via OcspTransport)
//!   RevocationValidator::validate_certificate_revocation()
//!   -> request, status, responder chain + EKU, signature, freshness
//! ```

pub mod bundle;
pub mod certificate;
mod chain;
pub mod ocsp;
pub mod policy;

pub use bundle::{compute_folder_hash, default_cache_dir, CertificateSource, TrustBundleBuilder, TrustStore};
pub use certificate::CertificateSubject;
pub use ocsp::{OcspTransport, RevocationValidator};
pub use policy::SmartIdCertificateValidator;
