use super::{FlowType, HashAlgorithm, SignatureAlgorithm};

/// Fields shared by every signature that carries a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParameters {
    /// Base64 signature value
    pub value: String,
    pub flow_type: FlowType,
    pub algorithm: SignatureAlgorithm,
    pub hash_algorithm: HashAlgorithm,
    /// Mask generation function name, normally `id-mgf1`
    pub mask_gen_algorithm: String,
    pub mask_gen_hash_algorithm: HashAlgorithm,
    pub salt_length: usize,
    pub trailer_field: String,
}

/// Signature produced by an authentication session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcspV2Signature {
    pub parameters: SignatureParameters,
    pub server_random: String,
    pub user_challenge: String,
}

/// Signature produced by a signing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDigestSignature {
    pub parameters: SignatureParameters,
}

/// Certificate choice carries no signature value, only the flow used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateChoiceSignature {
    pub flow_type: FlowType,
}

/// Signature of a session, tagged by the operation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignature {
    Auth(AcspV2Signature),
    Signing(RawDigestSignature),
    CertificateChoice(CertificateChoiceSignature),
}

impl SessionSignature {
    pub const fn flow_type(&self) -> FlowType {
        match self {
            Self::Auth(sig) => sig.parameters.flow_type,
            Self::Signing(sig) => sig.parameters.flow_type,
            Self::CertificateChoice(sig) => sig.flow_type,
        }
    }

    /// Cryptographic parameters, absent for certificate choice
    pub const fn parameters(&self) -> Option<&SignatureParameters> {
        match self {
            Self::Auth(sig) => Some(&sig.parameters),
            Self::Signing(sig) => Some(&sig.parameters),
            Self::CertificateChoice(_) => None,
        }
    }
}
