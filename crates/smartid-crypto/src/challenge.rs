use base64::{engine::general_purpose::STANDARD, Engine};
use ring::rand::{SecureRandom, SystemRandom};
use smartid_core::{Result, SmartIdError};

/// Random bytes in an authentication challenge.
pub const RP_CHALLENGE_LEN: usize = 64;

/// Fresh base64 `rpChallenge` for an authentication session.
pub fn generate_rp_challenge() -> Result<String> {
    let mut bytes = [0u8; RP_CHALLENGE_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| SmartIdError::Internal("system random source unavailable".into()))?;
    Ok(STANDARD.encode(bytes))
}
