use thiserror::Error;

/// Result type alias for Smart-ID operations
pub type Result<T> = std::result::Result<T, SmartIdError>;

/// Why a signature check failed. Diagnostic only; every reason is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureFailure {
    /// The signature value is not valid base64
    MalformedBase64,
    /// The signature does not verify over the expected payload
    Mismatch,
    /// The declared algorithm or parameter combination is not supported
    UnsupportedAlgorithm(String),
    /// The certificate public key cannot be used for verification
    InvalidPublicKey(String),
}

impl std::fmt::Display for SignatureFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedBase64 => write!(f, "invalid base64 in signature value"),
            Self::Mismatch => write!(f, "signature does not match the payload"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm {alg}"),
            Self::InvalidPublicKey(reason) => write!(f, "unusable public key: {reason}"),
        }
    }
}

/// Errors raised by the Smart-ID trust and verification engine
#[derive(Error, Debug)]
pub enum SmartIdError {
    /// Bytes are not valid DER or do not match the expected structure
    #[error("ASN.1 decoding failed: {0}")]
    Asn1Decoding(String),

    /// A structure could not be encoded as DER
    #[error("ASN.1 encoding failed: {0}")]
    Asn1Encoding(String),

    /// Malformed, unsupported or unusable OCSP exchange
    #[error("OCSP error: {0}")]
    Ocsp(String),

    /// A certificate could not be parsed
    #[error("invalid certificate: {0}")]
    Certificate(String),

    /// A trust folder contains something other than a CA certificate
    #[error("trust store error: {0}")]
    TrustStore(String),

    /// Certificate does not chain to a trusted root
    #[error("Certificate is not trusted. Certificate chain validation failed.")]
    CertificateChain,

    /// Required Smart-ID policy OID is missing
    #[error("Certificate policies extension is missing or does not contain the required Smart-ID policy OIDs.")]
    CertificatePolicy,

    /// QC statements are missing or lack QC compliance
    #[error("Certificate QC statements extension is missing or does not contain the required Smart-ID QC statements.")]
    CertificateQc,

    /// Key usage or extended key usage does not fit the certificate purpose
    #[error("Certificate key usage or extended key usage is invalid.")]
    CertificateKeyUsage,

    /// OCSP reported a status other than good
    #[error("OCSP certificate status is not good.")]
    OcspCertificateRevocation {
        /// Status reported by the responder
        status: String,
    },

    /// OCSP responder certificate lacks the OCSP signing EKU
    #[error("OCSP responder certificate does not have OCSP signing extended key usage.")]
    OcspKeyUsage,

    /// OCSP response is outside the accepted time window
    #[error("OCSP response time is outside the acceptable skew range.")]
    OcspResponseTime,

    /// OCSP response signature did not verify
    #[error("OCSP response signature validation failed.")]
    OcspSignature,

    /// Session signature did not verify
    #[error("Signature validation failed: {0}")]
    Signature(SignatureFailure),

    /// The user refused the request
    #[error("User refused the request.")]
    UserRefused,

    /// The session timed out
    #[error("Session timed out.")]
    SessionTimeout,

    /// The document cannot be used
    #[error("Request failed. User must either check his/her Smart-ID mobile application or turn to customer support for getting the exact reason.")]
    DocumentUnusable,

    /// The user picked the wrong verification code
    #[error("User selected the wrong verification code.")]
    WrongVc,

    /// The app supports none of the requested interactions
    #[error("User app version does not support any of the required interactions.")]
    RequiredInteractionNotSupportedByApp,

    /// The user refused to choose a certificate
    #[error("User refused to choose a certificate.")]
    UserRefusedCertChoice,

    /// The user cancelled on the interaction screen
    #[error("User cancelled on the interaction screen.")]
    UserRefusedInteraction,

    /// Logical error in the signing protocol
    #[error("A logical error occurred in the signing protocol.")]
    ProtocolFailure,

    /// The app received another transaction while waiting for a linked session
    #[error("The app received a different transaction while waiting for the linked session.")]
    ExpectedLinkedSession,

    /// Service-side failure
    #[error("A server error occurred during the signing process.")]
    ServerError,

    /// The session has not reached the COMPLETE state
    #[error("The session is not complete yet.")]
    IncompleteSession,

    /// Callback session secret digest does not match
    #[error("Session secret mismatch.")]
    SessionSecretMismatch,

    /// Callback unique parameter does not match
    #[error("Initial callback URL unique parameter mismatch.")]
    CallbackParamMismatch,

    /// Callback user challenge verifier does not match
    #[error("User challenge mismatch.")]
    UserChallengeMismatch,

    /// Session response violates the session model
    #[error("invalid session response: {0}")]
    InvalidSession(String),

    /// Caller supplied inconsistent validation input
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid argument to a builder or parser
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP exchange with a remote collaborator failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Filesystem access failed
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved in the failed operation
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl SmartIdError {
    /// Wraps an I/O error with the path it happened on
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Returns true if the error reports a terminal session outcome other than OK
    #[must_use]
    pub const fn is_session_outcome(&self) -> bool {
        matches!(
            self,
            Self::UserRefused
                | Self::SessionTimeout
                | Self::DocumentUnusable
                | Self::WrongVc
                | Self::RequiredInteractionNotSupportedByApp
                | Self::UserRefusedCertChoice
                | Self::UserRefusedInteraction
                | Self::ProtocolFailure
                | Self::ExpectedLinkedSession
                | Self::ServerError
        )
    }

    /// Returns true if the error comes from OCSP response validation
    #[must_use]
    pub const fn is_revocation_failure(&self) -> bool {
        matches!(
            self,
            Self::OcspCertificateRevocation { .. }
                | Self::OcspKeyUsage
                | Self::OcspResponseTime
                | Self::OcspSignature
        )
    }

    /// Returns true if the error rejects the end-user certificate itself
    #[must_use]
    pub const fn is_certificate_failure(&self) -> bool {
        matches!(
            self,
            Self::CertificateChain
                | Self::CertificatePolicy
                | Self::CertificateQc
                | Self::CertificateKeyUsage
        )
    }
}
