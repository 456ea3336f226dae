//! Core types for the Smart-ID relying-party toolkit.
//!
//! This crate provides the foundational types shared by the verification crates:
//!
//! - **Types**: wire enums, the session/signature/certificate model and
//!   semantics identifiers
//! - **Errors**: the validation error taxonomy in [`SmartIdError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use smartid_core::{Session, SessionKind, Result};
//!
//! fn poll_result(body: &str) -> Result<()> {
//!     let session = Session::from_json(SessionKind::Auth, body)?;
//!     session.validate()
//! }
//! ```

mod error;
pub mod types;

pub use error::{Result, SignatureFailure, SmartIdError};
pub use types::*;
