/// What the relying party kept locally when it started a session.
///
/// None of this travels back in the session response, yet the signature,
/// callback and device-link checks all depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// rpChallenge for authentication, the original data for signing
    pub signed_data: Vec<u8>,
    /// Base64 interactions blob exactly as sent
    pub interactions: String,
    /// Empty when the session was started without one
    pub initial_callback_url: String,
    /// Base64 session secret from the session start response
    pub session_secret: String,
    pub relying_party_name: String,
}

impl SessionContext {
    pub fn new(relying_party_name: impl Into<String>, signed_data: impl Into<Vec<u8>>) -> Self {
        Self {
            relying_party_name: relying_party_name.into(),
            signed_data: signed_data.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_interactions(mut self, interactions: impl Into<String>) -> Self {
        self.interactions = interactions.into();
        self
    }

    #[must_use]
    pub fn with_initial_callback_url(mut self, url: impl Into<String>) -> Self {
        self.initial_callback_url = url.into();
        self
    }

    #[must_use]
    pub fn with_session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = secret.into();
        self
    }
}
