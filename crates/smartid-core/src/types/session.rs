use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    AcspV2Signature, Certificate, CertificateChoiceSignature, CertificateLevel, FlowType,
    HashAlgorithm, InteractionType, RawDigestSignature, SessionEndResult, SessionSignature,
    SessionState, SignatureAlgorithm, SignatureParameters, SignatureProtocol,
};
use crate::{Result, SmartIdError};

/// Operation a session was started for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Auth,
    Signing,
    CertificateChoice,
}

/// Session status body as returned by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    #[serde(default)]
    pub state: Option<SessionState>,

    #[serde(default)]
    pub result: Option<SessionResultResponse>,

    #[serde(default)]
    pub signature_protocol: Option<SignatureProtocol>,

    #[serde(default)]
    pub signature: Option<SignatureResponse>,

    #[serde(default)]
    pub cert: Option<CertificateResponse>,

    #[serde(default)]
    pub interaction_type_used: Option<InteractionType>,

    #[serde(default)]
    pub device_ip_address: Option<String>,

    /// Request properties the service ignored; kept verbatim
    #[serde(default)]
    pub ignored_properties: Option<Value>,

    /// Keys this model does not know about
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResultResponse {
    #[serde(default)]
    pub end_result: Option<SessionEndResult>,

    #[serde(default)]
    pub document_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub value: String,
    pub certificate_level: CertificateLevel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub server_random: Option<String>,

    #[serde(default)]
    pub user_challenge: Option<String>,

    #[serde(default)]
    pub flow_type: Option<FlowType>,

    #[serde(default)]
    pub signature_algorithm: Option<SignatureAlgorithm>,

    #[serde(default)]
    pub signature_algorithm_parameters: Option<SignatureAlgorithmParameters>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAlgorithmParameters {
    pub hash_algorithm: HashAlgorithm,
    pub mask_gen_algorithm: MaskGenAlgorithm,
    pub salt_length: usize,
    pub trailer_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskGenAlgorithm {
    pub algorithm: String,
    pub parameters: MaskGenParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskGenParameters {
    pub hash_algorithm: HashAlgorithm,
}

fn required<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| SmartIdError::InvalidSession(format!("signature missing {what}")))
}

impl SignatureResponse {
    fn parameters(&self) -> Result<SignatureParameters> {
        let params = required(
            self.signature_algorithm_parameters.as_ref(),
            "signatureAlgorithmParameters",
        )?;
        Ok(SignatureParameters {
            value: required(self.value.clone(), "value")?,
            flow_type: required(self.flow_type, "flowType")?,
            algorithm: required(self.signature_algorithm, "signatureAlgorithm")?,
            hash_algorithm: params.hash_algorithm,
            mask_gen_algorithm: params.mask_gen_algorithm.algorithm.clone(),
            mask_gen_hash_algorithm: params.mask_gen_algorithm.parameters.hash_algorithm,
            salt_length: params.salt_length,
            trailer_field: params.trailer_field.clone(),
        })
    }

    fn into_signature(self, kind: SessionKind) -> Result<SessionSignature> {
        Ok(match kind {
            SessionKind::Auth => SessionSignature::Auth(AcspV2Signature {
                parameters: self.parameters()?,
                server_random: required(self.server_random, "serverRandom")?,
                user_challenge: required(self.user_challenge, "userChallenge")?,
            }),
            SessionKind::Signing => SessionSignature::Signing(RawDigestSignature {
                parameters: self.parameters()?,
            }),
            SessionKind::CertificateChoice => {
                SessionSignature::CertificateChoice(CertificateChoiceSignature {
                    flow_type: required(self.flow_type, "flowType")?,
                })
            }
        })
    }
}

/// A polled session, read-only once parsed.
///
/// `end_result` is present iff the state is COMPLETE; the certificate and
/// signature are present iff the end result is OK.
#[derive(Debug, Clone)]
pub struct Session {
    kind: SessionKind,
    state: SessionState,
    end_result: Option<SessionEndResult>,
    document_number: Option<String>,
    certificate: Option<Certificate>,
    signature: Option<SessionSignature>,
    signature_protocol: Option<SignatureProtocol>,
    interaction_type_used: Option<InteractionType>,
    device_ip_address: Option<String>,
    ignored_properties: Option<Value>,
    unknown_properties: BTreeMap<String, Value>,
}

impl Session {
    /// Parses a session status JSON body
    pub fn from_json(kind: SessionKind, body: &str) -> Result<Self> {
        let response: SessionResponse = serde_json::from_str(body)?;
        Self::from_response(kind, response)
    }

    /// Builds a session, enforcing the state/result/payload invariants
    pub fn from_response(kind: SessionKind, response: SessionResponse) -> Result<Self> {
        let state = response
            .state
            .ok_or_else(|| SmartIdError::InvalidSession("Missing state in session response.".into()))?;

        let mut session = Self {
            kind,
            state,
            end_result: None,
            document_number: None,
            certificate: None,
            signature: None,
            signature_protocol: None,
            interaction_type_used: None,
            device_ip_address: response.device_ip_address,
            ignored_properties: response.ignored_properties,
            unknown_properties: response.unknown,
        };

        if state == SessionState::Running {
            return Ok(session);
        }

        let result = response.result.unwrap_or_default();
        let end_result = result.end_result.ok_or_else(|| {
            SmartIdError::InvalidSession("Complete session missing endResult.".into())
        })?;
        session.end_result = Some(end_result);
        session.document_number = result.document_number;

        if end_result != SessionEndResult::Ok {
            return Ok(session);
        }

        let cert = response
            .cert
            .ok_or_else(|| SmartIdError::InvalidSession("OK session missing certificate.".into()))?;
        let signature = response
            .signature
            .ok_or_else(|| SmartIdError::InvalidSession("OK session missing signature.".into()))?;

        session.certificate = Some(Certificate::new(cert.value, cert.certificate_level)?);
        session.signature = Some(signature.into_signature(kind)?);
        session.signature_protocol = response.signature_protocol;
        session.interaction_type_used = response.interaction_type_used;
        Ok(session)
    }

    /// Fails unless the session completed with OK
    pub fn validate(&self) -> Result<()> {
        if !self.is_complete() {
            return Err(SmartIdError::IncompleteSession);
        }
        match self.end_result.and_then(SessionEndResult::into_error) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub const fn kind(&self) -> SessionKind {
        self.kind
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn end_result(&self) -> Option<SessionEndResult> {
        self.end_result
    }

    pub fn document_number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    pub const fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    pub const fn signature(&self) -> Option<&SessionSignature> {
        self.signature.as_ref()
    }

    pub const fn signature_protocol(&self) -> Option<SignatureProtocol> {
        self.signature_protocol
    }

    pub const fn interaction_type_used(&self) -> Option<InteractionType> {
        self.interaction_type_used
    }

    pub fn device_ip_address(&self) -> Option<&str> {
        self.device_ip_address.as_deref()
    }

    pub const fn ignored_properties(&self) -> Option<&Value> {
        self.ignored_properties.as_ref()
    }

    pub const fn unknown_properties(&self) -> &BTreeMap<String, Value> {
        &self.unknown_properties
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.is_complete() && self.end_result == Some(SessionEndResult::Ok)
    }
}
