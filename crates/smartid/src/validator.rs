//! Checklist over a completed authentication or signing session.

use chrono::{DateTime, Utc};
use smartid_core::{
    Certificate, Result, Session, SessionContext, SessionKind, SessionSignature, SignatureProtocol,
    SmartIdError,
};
use smartid_crypto::{AcspV2Payload, CallbackParams, SignatureVerifier};
use smartid_trust::certificate::parse_certificate;
use smartid_trust::{OcspTransport, RevocationValidator, SmartIdCertificateValidator, TrustStore};
use tracing::debug;

/// Runs the enabled checks against an OK session.
///
/// Signature validation is on by default; certificate, callback and
/// revocation checks are opt-in. [`check`](Self::check) runs them in the
/// order signature, certificate, callback URL, revocation and stops at the
/// first failure.
pub struct SessionValidator<'a> {
    session: &'a Session,
    context: &'a SessionContext,
    validate_signature: bool,
    validate_certificate: bool,
    validate_revocation: bool,
    callback: Option<CallbackParams>,
    trust_store: Option<&'a TrustStore>,
    transport: Option<&'a dyn OcspTransport>,
    now: Option<DateTime<Utc>>,
}

impl<'a> SessionValidator<'a> {
    /// Fails with the session's own error unless it completed with OK.
    pub fn new(session: &'a Session, context: &'a SessionContext) -> Result<Self> {
        session.validate()?;
        if session.kind() == SessionKind::CertificateChoice {
            return Err(SmartIdError::Validation(
                "Certificate choice sessions carry no signature to validate.".into(),
            ));
        }
        Ok(Self {
            session,
            context,
            validate_signature: true,
            validate_certificate: false,
            validate_revocation: false,
            callback: None,
            trust_store: None,
            transport: None,
            now: None,
        })
    }

    #[must_use]
    pub const fn with_signature_validation(mut self, enabled: bool) -> Self {
        self.validate_signature = enabled;
        self
    }

    /// Chain, policy, QC and key usage. Needs [`with_trust_store`](Self::with_trust_store).
    #[must_use]
    pub const fn with_certificate_validation(mut self, enabled: bool) -> Self {
        self.validate_certificate = enabled;
        self
    }

    /// OCSP status. Needs a trust store and an OCSP transport.
    #[must_use]
    pub const fn with_revocation_validation(mut self, enabled: bool) -> Self {
        self.validate_revocation = enabled;
        self
    }

    #[must_use]
    pub const fn with_trust_store(mut self, store: &'a TrustStore) -> Self {
        self.trust_store = Some(store);
        self
    }

    #[must_use]
    pub const fn with_ocsp_transport(mut self, transport: &'a dyn OcspTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Callback checks with values the caller already took from the URL.
    #[must_use]
    pub fn with_callback_params(mut self, params: CallbackParams) -> Self {
        self.callback = Some(params);
        self
    }

    /// Callback checks with values parsed from the full callback URL.
    pub fn with_callback_url(
        self,
        url: &str,
        expected_param_value: &str,
        param_name: &str,
    ) -> Result<Self> {
        let params = CallbackParams::from_url(url, expected_param_value, param_name)?;
        Ok(self.with_callback_params(params))
    }

    #[must_use]
    pub fn without_callback_validation(mut self) -> Self {
        self.callback = None;
        self
    }

    /// Validation instant for certificate validity and OCSP freshness.
    /// Defaults to the time of the check.
    #[must_use]
    pub const fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn check(&self) -> Result<()> {
        let now = self.now.unwrap_or_else(Utc::now);

        if self.validate_signature {
            self.check_signature()?;
        }
        if self.validate_certificate {
            self.check_certificate(now)?;
        }
        if let Some(callback) = &self.callback {
            self.check_callback(callback)?;
        }
        if self.validate_revocation {
            self.check_revocation(now)?;
        }
        Ok(())
    }

    fn certificate(&self) -> Result<&'a Certificate> {
        self.session
            .certificate()
            .ok_or_else(|| SmartIdError::InvalidSession("OK session missing certificate.".into()))
    }

    fn signature(&self) -> Result<&'a SessionSignature> {
        self.session
            .signature()
            .ok_or_else(|| SmartIdError::InvalidSession("OK session missing signature.".into()))
    }

    fn trust_store(&self, what: &str) -> Result<&'a TrustStore> {
        self.trust_store
            .ok_or_else(|| SmartIdError::Config(format!("{what} requires a trust store.")))
    }

    fn check_signature(&self) -> Result<()> {
        let certificate = self.certificate()?;
        let spki = parse_certificate(certificate.der())?.public_key().raw.to_vec();
        let verifier = SignatureVerifier::from_spki_der(&spki)?;

        match self.signature()? {
            SessionSignature::Auth(signature) => {
                let payload = AcspV2Payload {
                    signature_protocol: self
                        .session
                        .signature_protocol()
                        .unwrap_or(SignatureProtocol::AcspV2),
                    server_random: &signature.server_random,
                    rp_challenge: &self.context.signed_data,
                    user_challenge: &signature.user_challenge,
                    relying_party_name: &self.context.relying_party_name,
                    interactions: &self.context.interactions,
                    interaction_type_used: self.session.interaction_type_used(),
                    initial_callback_url: &self.context.initial_callback_url,
                    flow_type: signature.parameters.flow_type,
                };
                verifier.verify(&signature.parameters, &payload.to_bytes())?;
            }
            SessionSignature::Signing(signature) => {
                verifier.verify(&signature.parameters, &self.context.signed_data)?;
            }
            SessionSignature::CertificateChoice(_) => {
                return Err(SmartIdError::Validation(
                    "Certificate choice sessions carry no signature to validate.".into(),
                ))
            }
        }
        debug!("signature validation passed");
        Ok(())
    }

    fn check_certificate(&self, now: DateTime<Utc>) -> Result<()> {
        let certificate = self.certificate()?;
        let validator = SmartIdCertificateValidator::new(self.trust_store("Certificate validation")?);
        match self.session.kind() {
            SessionKind::Signing => validator.validate_signing_certificate_at(certificate, now)?,
            _ => validator.validate_auth_certificate_at(certificate, now)?,
        }
        debug!("Smart-ID certificate validation passed");
        Ok(())
    }

    fn check_callback(&self, callback: &CallbackParams) -> Result<()> {
        callback.verify_session_secret(&self.context.session_secret)?;
        callback.verify_param()?;
        if let SessionSignature::Auth(signature) = self.signature()? {
            callback.verify_user_challenge(&signature.user_challenge)?;
        }
        debug!("callback URL validation passed");
        Ok(())
    }

    fn check_revocation(&self, now: DateTime<Utc>) -> Result<()> {
        let store = self.trust_store("Revocation validation")?;
        let transport = self.transport.ok_or_else(|| {
            SmartIdError::Config("Revocation validation requires an OCSP transport.".into())
        })?;
        RevocationValidator::new(store, transport)
            .validate_certificate_revocation_at(self.certificate()?, now)?;
        debug!("certificate revocation validation passed");
        Ok(())
    }
}
