//! Interaction list sent with a session request.
//!
//! The base64 JSON blob produced here is part of both the device-link auth
//! code and the ACSP v2 payload, so its serialized form must stay stable.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use smartid_core::{InteractionType, Result, SmartIdError};

const DISPLAY_TEXT_60_MAX: usize = 60;
const DISPLAY_TEXT_200_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text60: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text200: Option<String>,

    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
}

impl Interaction {
    pub fn display_text_and_pin(text: impl Into<String>) -> Self {
        Self {
            display_text60: Some(text.into()),
            display_text200: None,
            interaction_type: InteractionType::DisplayTextAndPin,
        }
    }

    pub fn confirmation_message(text: impl Into<String>) -> Self {
        Self {
            display_text60: None,
            display_text200: Some(text.into()),
            interaction_type: InteractionType::ConfirmationMessage,
        }
    }

    pub fn confirmation_message_and_verification_code_choice(text: impl Into<String>) -> Self {
        Self {
            display_text60: None,
            display_text200: Some(text.into()),
            interaction_type: InteractionType::ConfirmationMessageAndVerificationCodeChoice,
        }
    }
}

/// At least one interaction, display texts within their limits.
pub fn validate_interactions(interactions: &[Interaction]) -> Result<()> {
    if interactions.is_empty() {
        return Err(SmartIdError::InvalidArgument(
            "At least one interaction must be provided.".into(),
        ));
    }
    for interaction in interactions {
        if let Some(text) = &interaction.display_text60 {
            if text.chars().count() > DISPLAY_TEXT_60_MAX {
                return Err(SmartIdError::InvalidArgument(
                    "displayText60 exceeds maximum length of 60 characters.".into(),
                ));
            }
        }
        if let Some(text) = &interaction.display_text200 {
            if text.chars().count() > DISPLAY_TEXT_200_MAX {
                return Err(SmartIdError::InvalidArgument(
                    "displayText200 exceeds maximum length of 200 characters.".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Validates and encodes interactions as base64 JSON.
pub fn encode_interactions(interactions: &[Interaction]) -> Result<String> {
    validate_interactions(interactions)?;
    let json = serde_json::to_vec(interactions)?;
    Ok(STANDARD.encode(json))
}

/// Decodes a base64 JSON interactions blob.
pub fn decode_interactions(encoded: &str) -> Result<Vec<Interaction>> {
    let json = STANDARD
        .decode(encoded)
        .map_err(|e| SmartIdError::InvalidArgument(format!("interactions are not base64: {e}")))?;
    Ok(serde_json::from_slice(&json)?)
}
