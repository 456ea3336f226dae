use serde::{Deserialize, Serialize};

use crate::{Result, SmartIdError};

/// Demo environment of the relying-party API
pub const DEMO_BASE_URL: &str = "https://sid.demo.sk.ee/smart-id-rp/v3";

/// Production environment of the relying-party API
pub const PROD_BASE_URL: &str = "https://rp-api.smart-id.com/v3";

/// Declares a closed enum whose variants travel as fixed strings on the wire.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Wire representation of the value
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = SmartIdError;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(SmartIdError::InvalidArgument(format!(
                        concat!("unknown ", stringify!($name), " '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Assurance level declared for a certificate
    CertificateLevel {
        /// Qualified electronic signature level
        Qualified => "QUALIFIED",
        /// Advanced electronic signature level
        Advanced => "ADVANCED",
        /// Qualified, key held in a QSCD
        Qscd => "QSCD",
    }
}

wire_enum! {
    /// How the device link reaches the user's phone
    DeviceLinkType {
        /// Scanned from a QR code
        Qr => "QR",
        /// Opened from another app on the same device
        App2App => "App2App",
        /// Opened from a web page on the same device
        Web2App => "Web2App",
    }
}

wire_enum! {
    /// Digest algorithms named in signature metadata
    HashAlgorithm {
        /// SHA-256
        Sha256 => "SHA-256",
        /// SHA-384
        Sha384 => "SHA-384",
        /// SHA-512
        Sha512 => "SHA-512",
        /// SHA3-256
        Sha3_256 => "SHA3-256",
        /// SHA3-384
        Sha3_384 => "SHA3-384",
        /// SHA3-512
        Sha3_512 => "SHA3-512",
    }
}

impl HashAlgorithm {
    /// Lowercase digest name without dashes, e.g. `sha256` or `sha3256`
    #[must_use]
    pub fn digest_name(self) -> String {
        self.as_str().replace('-', "").to_lowercase()
    }
}

wire_enum! {
    /// Interaction shown to the user in the Smart-ID app
    InteractionType {
        /// Short text followed by PIN entry
        DisplayTextAndPin => "displayTextAndPIN",
        /// Long confirmation text
        ConfirmationMessage => "confirmationMessage",
        /// Confirmation text plus verification code choice
        ConfirmationMessageAndVerificationCodeChoice => "confirmationMessageAndVerificationCodeChoice",
    }
}

wire_enum! {
    /// Kind of national identity behind a semantics identifier
    NaturalIdentityType {
        /// Passport number
        Passport => "PAS",
        /// National identity card number
        NationalIdNumber => "IDC",
        /// National personal number
        NationalPersonalNumber => "PNO",
    }
}

wire_enum! {
    /// Lifecycle state of a remote session
    SessionState {
        /// The user has not finished yet
        Running => "RUNNING",
        /// Terminal state, an end result is available
        Complete => "COMPLETE",
    }
}

wire_enum! {
    /// Session type carried in device links
    SessionType {
        /// Authentication
        Auth => "auth",
        /// Document signing
        Sign => "sign",
        /// Certificate choice
        Cert => "cert",
    }
}

wire_enum! {
    /// Signature algorithm reported with a session signature
    SignatureAlgorithm {
        /// RSASSA-PSS with explicit parameters
        RsassaPss => "rsassa-pss",
        /// PKCS#1 v1.5 with SHA-256
        Sha256WithRsaEncryption => "sha256WithRSAEncryption",
        /// PKCS#1 v1.5 with SHA-384
        Sha384WithRsaEncryption => "sha384WithRSAEncryption",
        /// PKCS#1 v1.5 with SHA-512
        Sha512WithRsaEncryption => "sha512WithRSAEncryption",
    }
}

impl SignatureAlgorithm {
    /// Returns true for the PSS family
    #[must_use]
    pub const fn is_pss(self) -> bool {
        matches!(self, Self::RsassaPss)
    }

    /// Digest name used for PKCS#1 v1.5: the first six characters of the identifier
    #[must_use]
    pub fn pkcs1_digest_name(self) -> &'static str {
        let name = self.as_str();
        name.get(..6).unwrap_or(name)
    }
}

wire_enum! {
    /// Protocol the service used to produce the signature
    SignatureProtocol {
        /// Authentication protocol over the canonical ACSP v2 payload
        AcspV2 => "ACSP_V2",
        /// Signature over the caller's raw digest
        RawDigestSignature => "RAW_DIGEST_SIGNATURE",
    }
}

wire_enum! {
    /// Flow through which the user completed the session
    FlowType {
        /// QR code
        Qr => "QR",
        /// Web page to app
        Web2App => "Web2App",
        /// App to app
        App2App => "App2App",
        /// Push notification
        Notification => "Notification",
    }
}

wire_enum! {
    /// Terminal outcome of a completed session
    SessionEndResult {
        /// Success
        Ok => "OK",
        /// User refused
        UserRefused => "USER_REFUSED",
        /// No answer in time
        Timeout => "TIMEOUT",
        /// Document unusable
        DocumentUnusable => "DOCUMENT_UNUSABLE",
        /// Wrong verification code selected
        WrongVc => "WRONG_VC",
        /// App cannot show any requested interaction
        RequiredInteractionNotSupportedByApp => "REQUIRED_INTERACTION_NOT_SUPPORTED_BY_APP",
        /// User refused the certificate choice
        UserRefusedCertChoice => "USER_REFUSED_CERT_CHOICE",
        /// User cancelled on the interaction screen
        UserRefusedInteraction => "USER_REFUSED_INTERACTION",
        /// Protocol failure
        ProtocolFailure => "PROTOCOL_FAILURE",
        /// Another transaction arrived while a linked session was expected
        ExpectedLinkedSession => "EXPECTED_LINKED_SESSION",
        /// Service-side error
        ServerError => "SERVER_ERROR",
    }
}

impl SessionEndResult {
    /// Maps a non-OK outcome to its dedicated error
    #[must_use]
    pub const fn into_error(self) -> Option<SmartIdError> {
        match self {
            Self::Ok => None,
            Self::UserRefused => Some(SmartIdError::UserRefused),
            Self::Timeout => Some(SmartIdError::SessionTimeout),
            Self::DocumentUnusable => Some(SmartIdError::DocumentUnusable),
            Self::WrongVc => Some(SmartIdError::WrongVc),
            Self::RequiredInteractionNotSupportedByApp => {
                Some(SmartIdError::RequiredInteractionNotSupportedByApp)
            }
            Self::UserRefusedCertChoice => Some(SmartIdError::UserRefusedCertChoice),
            Self::UserRefusedInteraction => Some(SmartIdError::UserRefusedInteraction),
            Self::ProtocolFailure => Some(SmartIdError::ProtocolFailure),
            Self::ExpectedLinkedSession => Some(SmartIdError::ExpectedLinkedSession),
            Self::ServerError => Some(SmartIdError::ServerError),
        }
    }
}
