//! Verification of signed interaction webhooks.
//!
//! The platform signs `timestamp || raw_body` with its Ed25519 key and sends
//! the hex signature and the timestamp as headers. Verification must run over
//! the exact bytes received, before any JSON decoding.
//!
//! Every failure mode collapses into [`VerificationError`]; callers answer all
//! of them with the same 401 and do nothing else with the request.

use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use thiserror::Error;

/// Header carrying the hex-encoded signature.
pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";

/// Header carrying the signed timestamp.
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Error raised while loading the configured public key at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("public key is not valid hex")]
    NotHex,

    #[error("public key must be {PUBLIC_KEY_LENGTH} bytes, got {0}")]
    WrongLength(usize),

    #[error("public key is not a valid Ed25519 point")]
    InvalidPoint,
}

/// Why an inbound request failed authentication.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum VerificationError {
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    #[error("malformed signature")]
    MalformedSignature,

    #[error("signature mismatch")]
    Mismatch,
}

/// Result type alias using VerificationError.
pub type VerificationResult<T> = Result<T, VerificationError>;

/// Verifies request signatures against the bot's configured public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Build a verifier from the hex-encoded key shown in the platform console.
    pub fn from_hex(public_key_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(public_key_hex.trim()).map_err(|_| KeyError::NotHex)?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::WrongLength(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPoint)?;
        Ok(Self { key })
    }

    /// Check `signature` over `timestamp || body`.
    pub fn verify(
        &self,
        signature_hex: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> VerificationResult<()> {
        let signature_hex = signature_hex
            .filter(|s| !s.is_empty())
            .ok_or(VerificationError::MissingHeader(SIGNATURE_HEADER))?;
        let timestamp = timestamp
            .filter(|t| !t.is_empty())
            .ok_or(VerificationError::MissingHeader(TIMESTAMP_HEADER))?;

        let raw = hex::decode(signature_hex).map_err(|_| VerificationError::MalformedSignature)?;
        let raw: [u8; SIGNATURE_LENGTH] = raw
            .as_slice()
            .try_into()
            .map_err(|_| VerificationError::MalformedSignature)?;
        let signature = Signature::from_bytes(&raw);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify_strict(&message, &signature)
            .map_err(|_| VerificationError::Mismatch)
    }
}
