//! Relying-party configuration.

use serde::{Deserialize, Serialize};
use smartid_client::OcspClient;
use smartid_core::{Result, SmartIdError, PROD_BASE_URL};
use smartid_trust::TrustBundleBuilder;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration of a Smart-ID relying party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartIdConfig {
    /// UUID issued to the relying party.
    pub relying_party_uuid: String,

    /// Name registered for the relying party. Part of every signed payload.
    pub relying_party_name: String,

    /// Relying-party API base URL (default: production).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where trusted CA certificates are read from.
    #[serde(default)]
    pub trust: TrustConfig,

    /// OCSP request timeout in seconds (default: 10).
    #[serde(default = "default_ocsp_timeout")]
    pub ocsp_timeout_secs: u64,

    /// User-Agent sent to OCSP responders.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Trusted certificate folders.
///
/// Either `certificate_path` (roots and intermediates mixed) or both
/// `ca_path` and `int_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustConfig {
    pub certificate_path: Option<PathBuf>,
    pub ca_path: Option<PathBuf>,
    pub int_path: Option<PathBuf>,

    /// Bundle cache location (default: system temp dir).
    pub cache_dir: Option<PathBuf>,
}

impl TrustConfig {
    /// Single mixed folder
    pub fn mixed(folder: impl Into<PathBuf>) -> Self {
        Self {
            certificate_path: Some(folder.into()),
            ..Self::default()
        }
    }

    /// Roots and intermediates in separate folders
    pub fn separated(ca: impl Into<PathBuf>, intermediate: impl Into<PathBuf>) -> Self {
        Self {
            ca_path: Some(ca.into()),
            int_path: Some(intermediate.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    fn validate(&self) -> Result<()> {
        let direct = self.ca_path.is_some() || self.int_path.is_some();
        if self.certificate_path.is_some() && direct {
            return Err(SmartIdError::Config(
                "Cannot specify both certificatePath and direct paths (caPath/intPath). Choose one mode."
                    .into(),
            ));
        }
        if self.certificate_path.is_none() && (self.ca_path.is_none() || self.int_path.is_none()) {
            return Err(SmartIdError::Config(
                "Must provide either certificatePath (auto-separation) or both caPath and intPath (direct mode)."
                    .into(),
            ));
        }

        let folders = [
            (&self.certificate_path, "Certificate folder"),
            (&self.ca_path, "CA certificate folder"),
            (&self.int_path, "Intermediate certificate folder"),
        ];
        for (folder, what) in folders {
            if let Some(folder) = folder {
                if !folder.is_dir() {
                    return Err(SmartIdError::Config(format!(
                        "{what} not found: {}",
                        folder.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl SmartIdConfig {
    /// Validated configuration with defaults for everything optional.
    pub fn new(
        relying_party_uuid: impl Into<String>,
        relying_party_name: impl Into<String>,
        trust: TrustConfig,
    ) -> Result<Self> {
        let config = Self {
            relying_party_uuid: relying_party_uuid.into(),
            relying_party_name: relying_party_name.into(),
            base_url: default_base_url(),
            trust,
            ocsp_timeout_secs: default_ocsp_timeout(),
            user_agent: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SmartIdError::io(path, e))?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "loaded Smart-ID configuration");
        Ok(config)
    }

    /// Parse and validate config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SmartIdError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Required fields, trust folder mode and folder existence.
    pub fn validate(&self) -> Result<()> {
        if self.relying_party_uuid.trim().is_empty() {
            return Err(SmartIdError::Config("Relying party UUID must be set.".into()));
        }
        if self.relying_party_name.trim().is_empty() {
            return Err(SmartIdError::Config("Relying party name must be set.".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(SmartIdError::Config("Base URL must not be empty.".into()));
        }
        self.trust.validate()
    }

    pub const fn ocsp_timeout(&self) -> Duration {
        Duration::from_secs(self.ocsp_timeout_secs)
    }

    /// Bundle builder for the configured trust folder mode.
    pub fn trust_bundle_builder(&self) -> Result<TrustBundleBuilder> {
        let trust = &self.trust;
        let builder = match (&trust.certificate_path, &trust.ca_path, &trust.int_path) {
            (Some(folder), None, None) => TrustBundleBuilder::mixed(folder),
            (None, Some(ca), Some(int)) => TrustBundleBuilder::separated(ca, int),
            _ => return Err(SmartIdError::Config("Trust folders are not configured.".into())),
        };
        Ok(match &trust.cache_dir {
            Some(dir) => builder.with_cache_dir(dir),
            None => builder,
        })
    }

    /// OCSP transport honoring the configured timeout and user agent.
    pub fn ocsp_client(&self) -> Result<OcspClient> {
        let builder = OcspClient::builder().timeout(self.ocsp_timeout());
        match &self.user_agent {
            Some(agent) => builder.user_agent(agent).build(),
            None => builder.build(),
        }
    }
}

fn default_base_url() -> String {
    String::from(PROD_BASE_URL)
}

const fn default_ocsp_timeout() -> u64 {
    10
}
