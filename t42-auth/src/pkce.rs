//! PKCE (RFC 7636) verifier/challenge generation and OAuth state tokens.

use crate::error::AuthError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

const VERIFIER_BYTES: usize = 64;
const STATE_BYTES: usize = 32;

/// One login attempt's verifier and its S256 challenge. Never persisted.
#[derive(Clone)]
pub struct PkceParams {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl std::fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"[redacted]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

pub fn generate() -> Result<PkceParams, AuthError> {
    let code_verifier = URL_SAFE_NO_PAD.encode(random_bytes::<VERIFIER_BYTES>()?);
    let code_challenge = challenge_s256(&code_verifier);

    Ok(PkceParams {
        code_verifier,
        code_challenge,
    })
}

pub fn challenge_s256(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Unguessable token binding a redirect to the login attempt that started it.
pub fn generate_state() -> Result<String, AuthError> {
    Ok(URL_SAFE_NO_PAD.encode(random_bytes::<STATE_BYTES>()?))
}

fn random_bytes<const N: usize>() -> Result<[u8; N], AuthError> {
    let mut buf = [0u8; N];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| AuthError::Pkce(e.to_string()))?;
    Ok(buf)
}
