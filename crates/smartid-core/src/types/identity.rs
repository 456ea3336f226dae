use serde::{Deserialize, Serialize};

use super::NaturalIdentityType;
use crate::{Result, SmartIdError};

/// ETSI semantics identifier, e.g. `PNOEE-30303039914`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemanticsIdentifier {
    identity_type: NaturalIdentityType,
    country_code: String,
    identifier: String,
}

impl SemanticsIdentifier {
    /// Starts a validating builder
    #[must_use]
    pub fn builder() -> SemanticsIdentifierBuilder {
        SemanticsIdentifierBuilder::default()
    }

    /// Identifier for a national personal number
    pub fn from_personal_number(country_code: &str, number: &str) -> Result<Self> {
        Self::builder()
            .identity_type(NaturalIdentityType::NationalPersonalNumber)
            .country_code(country_code)
            .identifier(number)
            .build()
    }

    pub const fn identity_type(&self) -> NaturalIdentityType {
        self.identity_type
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl std::fmt::Display for SemanticsIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}-{}",
            self.identity_type, self.country_code, self.identifier
        )
    }
}

impl std::str::FromStr for SemanticsIdentifier {
    type Err = SmartIdError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || SmartIdError::InvalidArgument(format!("malformed semantics identifier '{s}'"));

        let type_part = s.get(..3).ok_or_else(malformed)?;
        let country_code = s.get(3..5).ok_or_else(malformed)?;
        if s.get(5..6) != Some("-") {
            return Err(malformed());
        }
        let identifier = s.get(6..).ok_or_else(malformed)?;
        let identity_type = type_part.to_uppercase().parse()?;

        Ok(Self {
            identity_type,
            country_code: country_code.to_string(),
            identifier: identifier.to_string(),
        })
    }
}

impl TryFrom<String> for SemanticsIdentifier {
    type Error = SmartIdError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SemanticsIdentifier> for String {
    fn from(value: SemanticsIdentifier) -> Self {
        value.to_string()
    }
}

/// Builder for [`SemanticsIdentifier`]; every field is mandatory
#[derive(Debug, Default, Clone)]
pub struct SemanticsIdentifierBuilder {
    identity_type: Option<NaturalIdentityType>,
    country_code: Option<String>,
    identifier: Option<String>,
}

impl SemanticsIdentifierBuilder {
    #[must_use]
    pub const fn identity_type(mut self, identity_type: NaturalIdentityType) -> Self {
        self.identity_type = Some(identity_type);
        self
    }

    /// Country code, uppercased
    #[must_use]
    pub fn country_code(mut self, country_code: &str) -> Self {
        self.country_code = Some(country_code.to_uppercase());
        self
    }

    #[must_use]
    pub fn identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }

    pub fn build(self) -> Result<SemanticsIdentifier> {
        let missing = |name: &str| SmartIdError::InvalidArgument(format!("missing mandatory parameter: {name}"));

        let identity_type = self.identity_type.ok_or_else(|| missing("type"))?;
        let country_code = self
            .country_code
            .filter(|cc| !cc.is_empty())
            .ok_or_else(|| missing("countryCode"))?;
        let identifier = self
            .identifier
            .filter(|id| !id.is_empty())
            .ok_or_else(|| missing("identifier"))?;

        if country_code.chars().count() != 2 {
            return Err(SmartIdError::InvalidArgument(
                "country code must be exactly 2 characters".into(),
            ));
        }

        Ok(SemanticsIdentifier {
            identity_type,
            country_code,
            identifier,
        })
    }
}
