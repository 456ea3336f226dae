//! Configured verifier handle.

use smartid_client::OcspClient;
use smartid_core::{Result, Session, SessionContext, SmartIdError};
use smartid_crypto::DeviceLinkSession;
use smartid_trust::TrustStore;
use tracing::debug;

use crate::config::SmartIdConfig;
use crate::validator::SessionValidator;

/// Trust store and OCSP client built once from a [`SmartIdConfig`].
#[derive(Debug, Clone)]
pub struct RelyingParty {
    config: SmartIdConfig,
    trust_store: TrustStore,
    ocsp: OcspClient,
}

impl RelyingParty {
    /// Builds (or reuses) the trust bundles and the OCSP client.
    pub fn new(config: SmartIdConfig) -> Result<Self> {
        config.validate()?;
        let trust_store = config.trust_bundle_builder()?.build()?;
        let ocsp = config.ocsp_client()?;
        debug!(
            relying_party = %config.relying_party_name,
            roots = trust_store.roots().len(),
            intermediates = trust_store.intermediates().len(),
            "relying party ready"
        );
        Ok(Self {
            config,
            trust_store,
            ocsp,
        })
    }

    pub const fn config(&self) -> &SmartIdConfig {
        &self.config
    }

    pub const fn trust_store(&self) -> &TrustStore {
        &self.trust_store
    }

    pub const fn ocsp_client(&self) -> &OcspClient {
        &self.ocsp
    }

    /// Validator wired to this relying party's trust store and OCSP client.
    ///
    /// The context must name the configured relying party, since the name is
    /// part of the authentication payload.
    pub fn validator<'a>(
        &'a self,
        session: &'a Session,
        context: &'a SessionContext,
    ) -> Result<SessionValidator<'a>> {
        if context.relying_party_name != self.config.relying_party_name {
            return Err(SmartIdError::Validation(format!(
                "Session context belongs to relying party '{}'.",
                context.relying_party_name
            )));
        }
        Ok(SessionValidator::new(session, context)?
            .with_trust_store(&self.trust_store)
            .with_ocsp_transport(&self.ocsp))
    }

    /// Context for a device-link session started by this relying party.
    pub fn context_for(&self, session: &DeviceLinkSession) -> Result<SessionContext> {
        let context = session.context();
        if context.relying_party_name != self.config.relying_party_name {
            return Err(SmartIdError::Validation(
                "Device link session was started by another relying party.".into(),
            ));
        }
        Ok(context)
    }
}
