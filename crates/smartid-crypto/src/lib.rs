//! # smartid-crypto
//!
//! Cryptographic building blocks of Smart-ID response verification.
//!
//! - **ASN.1**: static DER schemas for OCSP, extensions and public keys
//! - **Signatures**: RSA PKCS#1 v1.5 / PSS and ECDSA, the ACSP v2 payload
//! - **Device links**: HMAC auth codes over the link and session fields
//! - **Callbacks**: session secret digest and user challenge checks
//!
//! ## Data Flow
//!
//! ```text
//! session start   -> generate_rp_challenge() + encode_interactions()
//!                 -> DeviceLinkSession::device_link()
//! session result  -> AcspV2Payload::to_bytes() (auth) or the signed data
//!                 -> SignatureVerifier::verify()
//! callback        -> CallbackParams::from_url() -> verify_*()
//! ```

pub mod asn1;
pub mod callback;
mod challenge;
pub mod device_link;
pub mod hash;
mod interactions;
pub mod oid;
pub mod pem;
pub mod signature;

pub use callback::{session_secret_digest, CallbackParams};
pub use challenge::{generate_rp_challenge, RP_CHALLENGE_LEN};
pub use device_link::{verify_auth_code, AuthCodeInput, DeviceLinkSession};
pub use interactions::{decode_interactions, encode_interactions, validate_interactions, Interaction};
pub use signature::{AcspV2Payload, SignatureVerifier};
