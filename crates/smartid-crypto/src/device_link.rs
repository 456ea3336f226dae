//! Device links and their HMAC auth codes.
//!
//! The auth code binds the link to the session secret:
//!
//! ```text
//! authCode = base64url(HMAC-SHA256(b64decode(secret),
//!     "smart-id" | protocol | digest | b64(rpName) | "" | interactions | callbackUrl | link))
//! ```

use std::time::Instant;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use ring::hmac;
use smartid_core::{DeviceLinkType, Result, SessionContext, SessionType, SignatureProtocol, SmartIdError};
use tracing::{debug, warn};

const PAYLOAD_PREFIX: &str = "smart-id";
const LINK_VERSION: &str = "1.0";
const AUTH_CODE_PARAM: &str = "&authCode=";

/// Fallback language of the Smart-ID app
pub const DEFAULT_LANG: &str = "eng";

/// Session fields covered by the auth code besides the link itself.
#[derive(Debug, Clone, Copy)]
pub struct AuthCodeInput<'a> {
    pub signature_protocol: SignatureProtocol,
    /// rpChallenge for authentication, the base64 digest for signing
    pub digest: &'a str,
    pub relying_party_name: &'a str,
    pub interactions: &'a str,
    pub initial_callback_url: &'a str,
}

impl AuthCodeInput<'_> {
    fn payload(&self, link: &str) -> String {
        let rp_name = STANDARD.encode(self.relying_party_name);
        [
            PAYLOAD_PREFIX,
            self.signature_protocol.as_str(),
            self.digest,
            rp_name.as_str(),
            "",
            self.interactions,
            self.initial_callback_url,
            link,
        ]
        .join("|")
    }
}

fn hmac_key(session_secret: &str) -> Result<hmac::Key> {
    let secret = STANDARD
        .decode(session_secret)
        .map_err(|e| SmartIdError::InvalidArgument(format!("session secret is not base64: {e}")))?;
    Ok(hmac::Key::new(hmac::HMAC_SHA256, &secret))
}

/// Auth code for `link`, URL-safe base64 without padding.
pub fn auth_code(session_secret: &str, input: &AuthCodeInput<'_>, link: &str) -> Result<String> {
    let key = hmac_key(session_secret)?;
    let tag = hmac::sign(&key, input.payload(link).as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(tag.as_ref()))
}

/// Checks the trailing `authCode` of a full device link in constant time.
pub fn verify_auth_code(session_secret: &str, input: &AuthCodeInput<'_>, full_link: &str) -> Result<()> {
    let (link, code) = full_link
        .rsplit_once(AUTH_CODE_PARAM)
        .ok_or_else(|| SmartIdError::Validation("Device link has no authCode parameter.".into()))?;
    let tag = URL_SAFE_NO_PAD
        .decode(code)
        .map_err(|_| SmartIdError::Validation("Device link authCode is not URL-safe base64.".into()))?;

    let key = hmac_key(session_secret)?;
    hmac::verify(&key, input.payload(link).as_bytes(), &tag).map_err(|_| {
        warn!(link = %link, "device link auth code mismatch");
        SmartIdError::Validation("Device link authCode does not match.".into())
    })
}

/// A started session that is continued through a device link.
#[derive(Debug, Clone)]
pub struct DeviceLinkSession {
    session_id: String,
    session_token: String,
    session_secret: String,
    device_link_base: String,
    session_type: SessionType,
    signature_protocol: SignatureProtocol,
    digest: String,
    interactions: String,
    signed_data: Vec<u8>,
    relying_party_name: String,
    initial_callback_url: String,
    started_at: Instant,
}

impl DeviceLinkSession {
    /// Starts the elapsed-time clock used by QR links.
    pub fn new(
        session_id: impl Into<String>,
        session_token: impl Into<String>,
        session_secret: impl Into<String>,
        device_link_base: impl Into<String>,
        session_type: SessionType,
        relying_party_name: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            session_token: session_token.into(),
            session_secret: session_secret.into(),
            device_link_base: device_link_base.into(),
            session_type,
            signature_protocol: SignatureProtocol::AcspV2,
            digest: String::new(),
            interactions: String::new(),
            signed_data: Vec::new(),
            relying_party_name: relying_party_name.into(),
            initial_callback_url: String::new(),
            started_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_signature_protocol(mut self, protocol: SignatureProtocol) -> Self {
        self.signature_protocol = protocol;
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = digest.into();
        self
    }

    #[must_use]
    pub fn with_interactions(mut self, interactions: impl Into<String>) -> Self {
        self.interactions = interactions.into();
        self
    }

    /// Data the signature will cover: the rpChallenge or the signed document
    #[must_use]
    pub fn with_signed_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.signed_data = data.into();
        self
    }

    /// Only set for App2App and Web2App flows
    #[must_use]
    pub fn with_initial_callback_url(mut self, url: impl Into<String>) -> Self {
        self.initial_callback_url = url.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn session_secret(&self) -> &str {
        &self.session_secret
    }

    pub fn signed_data(&self) -> &[u8] {
        &self.signed_data
    }

    pub fn interactions(&self) -> &str {
        &self.interactions
    }

    pub fn initial_callback_url(&self) -> &str {
        &self.initial_callback_url
    }

    fn auth_input(&self) -> AuthCodeInput<'_> {
        AuthCodeInput {
            signature_protocol: self.signature_protocol,
            digest: &self.digest,
            relying_party_name: &self.relying_party_name,
            interactions: &self.interactions,
            initial_callback_url: &self.initial_callback_url,
        }
    }

    /// Device link with `authCode`, elapsed time measured from session start.
    pub fn device_link(&self, link_type: DeviceLinkType, lang: Option<&str>) -> Result<String> {
        let elapsed = self.started_at.elapsed().as_secs();
        self.device_link_at(link_type, lang, elapsed)
    }

    /// Device link for a given elapsed time. `elapsed_seconds` is only
    /// emitted for QR links.
    pub fn device_link_at(
        &self,
        link_type: DeviceLinkType,
        lang: Option<&str>,
        elapsed_seconds: u64,
    ) -> Result<String> {
        let mut link = format!("{}?deviceLinkType={link_type}", self.device_link_base);
        if link_type == DeviceLinkType::Qr {
            link.push_str(&format!("&elapsedSeconds={elapsed_seconds}"));
        }
        link.push_str(&format!(
            "&sessionToken={}&sessionType={}&version={LINK_VERSION}&lang={}",
            self.session_token,
            self.session_type,
            lang.unwrap_or(DEFAULT_LANG)
        ));

        let code = auth_code(&self.session_secret, &self.auth_input(), &link)?;
        debug!(link = %link, "built device link");
        Ok(format!("{link}{AUTH_CODE_PARAM}{code}"))
    }

    /// Checks a link produced for this session.
    pub fn verify_auth_code(&self, full_link: &str) -> Result<()> {
        verify_auth_code(&self.session_secret, &self.auth_input(), full_link)
    }

    /// Everything later validation needs from this session.
    pub fn context(&self) -> SessionContext {
        SessionContext::new(self.relying_party_name.clone(), self.signed_data.clone())
            .with_interactions(self.interactions.clone())
            .with_initial_callback_url(self.initial_callback_url.clone())
            .with_session_secret(self.session_secret.clone())
    }
}
