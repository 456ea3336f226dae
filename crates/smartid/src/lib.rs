//! # smartid
//!
//! Verification side of a Smart-ID relying party.
//!
//! A session status response is only a claim. Before acting on it the
//! relying party checks that the signature matches what it asked to be
//! signed, that the certificate behind it chains to CA certificates it
//! trusts and fits the Smart-ID profile, that the callback belongs to the
//! same session, and that the certificate is not revoked.
//!
//! ## Data Flow
//!
//! ```text
//! Setup
//!   SmartIdConfig::load() -> RelyingParty::new()
//!   -> TrustBundleBuilder::build() (cached by folder hash) + OcspClient
//!
//! Session start (kept locally)
//!   generate_rp_challenge() + encode_interactions()
//!   -> DeviceLinkSession -> device_link() / context()
//!
//! Session result
//!   Session::from_json() -> RelyingParty::validator()
//!   -> SessionValidator::check()
//!        signature -> certificate -> callback URL -> revocation
//! ```

pub mod config;
mod relying_party;
pub mod validator;

pub use config::{SmartIdConfig, TrustConfig};
pub use relying_party::RelyingParty;
pub use validator::SessionValidator;

pub use smartid_client::{OcspClient, OcspClientBuilder};
pub use smartid_core::*;
pub use smartid_crypto::{
    decode_interactions, encode_interactions, generate_rp_challenge, session_secret_digest,
    validate_interactions, verify_auth_code, AcspV2Payload, AuthCodeInput, CallbackParams,
    DeviceLinkSession, Interaction, SignatureVerifier, RP_CHALLENGE_LEN,
};
pub use smartid_trust::{
    compute_folder_hash, default_cache_dir, CertificateSource, CertificateSubject, OcspTransport,
    RevocationValidator, SmartIdCertificateValidator, TrustBundleBuilder, TrustStore,
};
