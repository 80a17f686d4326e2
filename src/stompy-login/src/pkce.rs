//! PKCE (Proof Key for Code Exchange, RFC 7636) and CSRF state generation.
//!
//! Only the S256 challenge method is supported. Random bytes come straight
//! from the operating system; a failing entropy source is reported as
//! [`AuthError::Entropy`] and never retried.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::TryRngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::constants::{STATE_BYTES, VERIFIER_BYTES};
use crate::error::{AuthError, AuthResult};

/// PKCE challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeMethod {
    /// SHA-256 hash, base64url encoded.
    S256,
}

impl std::fmt::Display for ChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChallengeMethod::S256 => write!(f, "S256"),
        }
    }
}

/// Verifier/challenge pair for one login attempt.
///
/// The verifier is wiped from memory when the pair is dropped.
#[derive(Clone)]
pub struct PkcePair {
    /// Secret kept client-side and sent only at token exchange.
    pub verifier: Zeroizing<String>,
    /// `base64url(SHA256(verifier))`, sent with the authorization request.
    pub challenge: String,
    pub method: ChallengeMethod,
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"[REDACTED]")
            .field("challenge", &self.challenge)
            .field("method", &self.method)
            .finish()
    }
}

/// Generate a fresh PKCE pair from 32 bytes of OS entropy.
///
/// The verifier is 43 characters of unpadded base64url.
pub fn generate_pkce() -> AuthResult<PkcePair> {
    let bytes = random_bytes::<VERIFIER_BYTES>()?;
    let verifier = Zeroizing::new(URL_SAFE_NO_PAD.encode(&bytes[..]));
    let challenge = compute_s256_challenge(&verifier);

    Ok(PkcePair {
        verifier,
        challenge,
        method: ChallengeMethod::S256,
    })
}

/// Generate a random CSRF state value (16 bytes, unpadded base64url).
pub fn generate_state() -> AuthResult<String> {
    let bytes = random_bytes::<STATE_BYTES>()?;
    Ok(URL_SAFE_NO_PAD.encode(&bytes[..]))
}

/// S256: BASE64URL(SHA256(ASCII(code_verifier)))
pub fn compute_s256_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn random_bytes<const N: usize>() -> AuthResult<Zeroizing<[u8; N]>> {
    let mut bytes = Zeroizing::new([0u8; N]);
    OsRng
        .try_fill_bytes(&mut bytes[..])
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(bytes)
}
