//! Callback URL parameters of the App2App and Web2App flows.

use base64::{engine::general_purpose::STANDARD, Engine};
use smartid_core::{Result, SmartIdError};
use tracing::debug;
use url::Url;

use crate::hash;

pub const SESSION_SECRET_DIGEST_PARAM: &str = "sessionSecretDigest";
pub const USER_CHALLENGE_VERIFIER_PARAM: &str = "userChallengeVerifier";

/// URL-safe SHA-256 of the decoded session secret, as delivered in callbacks.
pub fn session_secret_digest(session_secret: &str) -> Result<String> {
    let secret = STANDARD
        .decode(session_secret)
        .map_err(|e| SmartIdError::InvalidArgument(format!("session secret is not base64: {e}")))?;
    Ok(hash::sha256_url_safe(&secret))
}

/// Values taken from the callback query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    session_secret_digest: String,
    user_challenge_verifier: Option<String>,
    expected_param_value: String,
    param_value: String,
}

impl CallbackParams {
    /// Raw values already extracted by the caller. The verifier is only
    /// needed for authentication sessions.
    pub fn new(
        session_secret_digest: impl Into<String>,
        user_challenge_verifier: Option<String>,
        expected_param_value: impl Into<String>,
        param_value: impl Into<String>,
    ) -> Result<Self> {
        let session_secret_digest = session_secret_digest.into();
        if session_secret_digest.is_empty() {
            return Err(SmartIdError::Validation(
                "Session secret digest must be provided for callback URL validation.".into(),
            ));
        }
        if user_challenge_verifier.as_deref() == Some("") {
            return Err(SmartIdError::Validation(
                "User challenge verifier must not be empty.".into(),
            ));
        }
        Ok(Self {
            session_secret_digest,
            user_challenge_verifier,
            expected_param_value: expected_param_value.into(),
            param_value: param_value.into(),
        })
    }

    /// Parses the full callback URL, reading `param_name` as the caller's
    /// correlation parameter.
    pub fn from_url(url: &str, expected_param_value: &str, param_name: &str) -> Result<Self> {
        if url.is_empty() || param_name.is_empty() {
            return Err(SmartIdError::Validation(
                "URL and query parameter name must be provided for callback URL validation.".into(),
            ));
        }
        let url = Url::parse(url)
            .map_err(|e| SmartIdError::Validation(format!("Invalid callback URL: {e}")))?;
        let query = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };
        let missing = |name: &str| {
            SmartIdError::Validation(format!("Query parameter '{name}' not found in callback URL."))
        };

        let param_value = query(param_name).ok_or_else(|| missing(param_name))?;
        let digest =
            query(SESSION_SECRET_DIGEST_PARAM).ok_or_else(|| missing(SESSION_SECRET_DIGEST_PARAM))?;
        let verifier = query(USER_CHALLENGE_VERIFIER_PARAM);

        Self::new(digest, verifier, expected_param_value, param_value)
    }

    pub fn session_secret_digest(&self) -> &str {
        &self.session_secret_digest
    }

    pub fn user_challenge_verifier(&self) -> Option<&str> {
        self.user_challenge_verifier.as_deref()
    }

    /// The delivered digest must match the secret of the session.
    pub fn verify_session_secret(&self, session_secret: &str) -> Result<()> {
        let actual = session_secret_digest(session_secret)?;
        if actual != self.session_secret_digest {
            debug!(
                expected = %self.session_secret_digest,
                actual = %actual,
                "session secret digest mismatch"
            );
            return Err(SmartIdError::SessionSecretMismatch);
        }
        Ok(())
    }

    /// Exact string comparison of the correlation parameter.
    pub fn verify_param(&self) -> Result<()> {
        if self.expected_param_value != self.param_value {
            debug!(
                expected = %self.expected_param_value,
                actual = %self.param_value,
                "callback parameter mismatch"
            );
            return Err(SmartIdError::CallbackParamMismatch);
        }
        Ok(())
    }

    /// `user_challenge` must be the URL-safe SHA-256 of the verifier.
    pub fn verify_user_challenge(&self, user_challenge: &str) -> Result<()> {
        let verifier = self.user_challenge_verifier.as_deref().ok_or_else(|| {
            SmartIdError::Validation(format!(
                "Query parameter '{USER_CHALLENGE_VERIFIER_PARAM}' not found in callback URL."
            ))
        })?;
        let actual = hash::sha256_url_safe(verifier.as_bytes());
        if actual != user_challenge {
            debug!(expected = %user_challenge, actual = %actual, "user challenge mismatch");
            return Err(SmartIdError::UserChallengeMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
    const SECRET_DIGEST: &str = "PrG9Q5lH63YpmOVmzMLgmceREYsvQFecxPfaK1Bht_k";
    const VERIFIER: &str = "verifier-123";
    const USER_CHALLENGE: &str = "Ds3NpaREu9I2EYq6l0l3ZkFyv_Gt5O4EpGD6cZlY0Kg";

    fn callback_url() -> String {
        format!(
            "https://rp.example/callback?uid=abc&sessionSecretDigest={SECRET_DIGEST}&userChallengeVerifier={VERIFIER}"
        )
    }

    #[test]
    fn digest_of_session_secret() {
        assert_eq!(session_secret_digest(SECRET).unwrap(), SECRET_DIGEST);
    }

    #[test]
    fn parses_and_verifies_callback_url() {
        let params = CallbackParams::from_url(&callback_url(), "abc", "uid").unwrap();
        assert_eq!(params.session_secret_digest(), SECRET_DIGEST);
        assert_eq!(params.user_challenge_verifier(), Some(VERIFIER));
        params.verify_session_secret(SECRET).unwrap();
        params.verify_param().unwrap();
        params.verify_user_challenge(USER_CHALLENGE).unwrap();
    }

    #[test]
    fn mismatches_have_dedicated_errors() {
        let params = CallbackParams::from_url(&callback_url(), "xyz", "uid").unwrap();
        assert!(matches!(
            params.verify_param(),
            Err(SmartIdError::CallbackParamMismatch)
        ));
        assert!(matches!(
            params.verify_session_secret("b3RoZXItc2VjcmV0"),
            Err(SmartIdError::SessionSecretMismatch)
        ));
        assert!(matches!(
            params.verify_user_challenge("not-the-challenge"),
            Err(SmartIdError::UserChallengeMismatch)
        ));
    }

    #[test]
    fn missing_parameters_are_reported_by_name() {
        let err = CallbackParams::from_url(&callback_url(), "abc", "state").unwrap_err();
        assert_eq!(
            err.to_string(),
            SmartIdError::Validation("Query parameter 'state' not found in callback URL.".into())
                .to_string()
        );

        let err = CallbackParams::from_url("https://rp.example/cb?uid=abc", "abc", "uid").unwrap_err();
        assert!(err.to_string().contains("sessionSecretDigest"));
    }

    #[test]
    fn verifier_is_optional_until_needed() {
        let url = format!("https://rp.example/cb?uid=abc&sessionSecretDigest={SECRET_DIGEST}");
        let params = CallbackParams::from_url(&url, "abc", "uid").unwrap();
        params.verify_session_secret(SECRET).unwrap();
        assert!(matches!(
            params.verify_user_challenge(USER_CHALLENGE),
            Err(SmartIdError::Validation(_))
        ));
    }

    #[test]
    fn empty_values_are_rejected() {
        assert!(CallbackParams::new("", None, "a", "a").is_err());
        assert!(CallbackParams::new("d", Some(String::new()), "a", "a").is_err());
        assert!(CallbackParams::from_url("", "a", "uid").is_err());
    }
}
