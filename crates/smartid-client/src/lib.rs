//! HTTP transport for Smart-ID OCSP revocation checks.
//!
//! [`OcspClient`] implements [`smartid_trust::OcspTransport`] on top of a
//! blocking `reqwest` client.

mod client;

pub use client::{
    OcspClient, OcspClientBuilder, DEFAULT_TIMEOUT, OCSP_REQUEST_CONTENT_TYPE,
    OCSP_RESPONSE_CONTENT_TYPE,
};
pub use smartid_core::{Result, SmartIdError};
