/*! ECDSA signatures.

v3 transmissions can be signed with ECDSA over NIST P-256 and
SHA-256. On the wire a signature is the 64-byte fixed form
`r(32 BE) ‖ s(32 BE)`. Public keys are accepted as 33-byte SEC1
compressed points, 64-byte raw `x ‖ y`, or 65-byte uncompressed with
the `04` prefix; private keys are the raw 32-byte scalar.

Signing is randomized (fresh `k` per signature), so two signatures
over the same message differ while both verifying.
 */

use p256::ecdsa::signature::{DigestSigner, DigestVerifier};
use p256::ecdsa::{Signature, SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Wire size of a signature.
pub const SIGNATURE_SIZE: usize = 64;

/// Raw private key size.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// A P-256 signing key.
#[derive(Clone)]
pub struct SigningKey {
    key: P256SigningKey,
}

impl SigningKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            key: P256SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Load a raw 32-byte big-endian scalar.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != PRIVATE_KEY_SIZE {
            return Err(Error::WrongLength {
                what: "private key",
                want: PRIVATE_KEY_SIZE,
                got: data.len(),
            });
        }
        Ok(Self {
            key: P256SigningKey::from_slice(data).map_err(|_| Error::InvalidKey("P-256 scalar"))?,
        })
    }

    /// Export the raw 32-byte scalar.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        let mut out = [0u8; PRIVATE_KEY_SIZE];
        out.copy_from_slice(&self.key.to_bytes());
        out
    }

    /// The matching public key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            key: *self.key.verifying_key(),
        }
    }

    /// Sign a message: SHA-256 then ECDSA, emitted as `r ‖ s`.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_SIZE] {
        let sig: Signature = self.key.sign_digest(Sha256::new_with_prefix(message));
        let mut out = [0u8; SIGNATURE_SIZE];
        out.copy_from_slice(&sig.to_bytes());
        out
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        // Never print the scalar.
        write!(f, "SigningKey(P-256)")
    }
}

/// A P-256 verifying (public) key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyingKey {
    key: P256VerifyingKey,
}

impl VerifyingKey {
    /// Accepts 33-byte compressed, 64-byte raw `x ‖ y`, or 65-byte
    /// uncompressed SEC1 forms.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let key = match data.len() {
            33 | 65 => P256VerifyingKey::from_sec1_bytes(data),
            64 => {
                let mut sec1 = [0u8; 65];
                sec1[0] = 0x04;
                sec1[1..].copy_from_slice(data);
                P256VerifyingKey::from_sec1_bytes(&sec1)
            }
            _ => return Err(Error::InvalidKey("public key must be 33, 64, or 65 bytes")),
        };
        Ok(Self {
            key: key.map_err(|_| Error::InvalidKey("not a P-256 point"))?,
        })
    }

    /// Export as raw 64-byte `x ‖ y` (or 33-byte compressed).
    #[must_use]
    pub fn to_bytes(&self, compressed: bool) -> Vec<u8> {
        let point = self.key.to_encoded_point(compressed);
        if compressed {
            point.as_bytes().to_vec()
        } else {
            // Drop the 04 prefix.
            point.as_bytes()[1..].to_vec()
        }
    }

    /// Verify a 64-byte `r ‖ s` signature over a message.
    ///
    /// Returns false for malformed signatures rather than erroring;
    /// the decision must not depend on why verification failed.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        if signature.len() != SIGNATURE_SIZE {
            return false;
        }
        let Ok(sig) = Signature::from_slice(signature) else {
            return false;
        };
        self.key
            .verify_digest(Sha256::new_with_prefix(message), &sig)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[test]
    fn sign_verify_round_trip() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        let msg = b"CQ CQ CQ de W2FBI";
        let sig = sk.sign(msg);
        assert_eq!(sig.len(), 64);
        assert!(vk.verify(msg, &sig));
    }

    #[test]
    fn bit_flips_fail_verification() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        let msg = b"message";
        let sig = sk.sign(msg);
        assert!(!vk.verify(b"messagf", &sig));
        let mut bad = sig;
        bad[10] ^= 1;
        assert!(!vk.verify(msg, &bad));
    }

    #[test]
    fn signing_is_randomized() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        let msg = b"same message";
        let a = sk.sign(msg);
        let b = sk.sign(msg);
        assert_ne!(a, b);
        assert!(vk.verify(msg, &a));
        assert!(vk.verify(msg, &b));
    }

    #[test]
    fn private_key_round_trip() -> Result<()> {
        let sk = SigningKey::generate();
        let restored = SigningKey::from_bytes(&sk.to_bytes())?;
        let sig = restored.sign(b"hi");
        assert!(sk.verifying_key().verify(b"hi", &sig));
        Ok(())
    }

    #[test]
    fn public_key_forms() -> Result<()> {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();

        let raw = vk.to_bytes(false);
        assert_eq!(raw.len(), 64);
        assert_eq!(VerifyingKey::from_bytes(&raw)?, vk);

        let compressed = vk.to_bytes(true);
        assert_eq!(compressed.len(), 33);
        assert!(compressed[0] == 0x02 || compressed[0] == 0x03);
        assert_eq!(VerifyingKey::from_bytes(&compressed)?, vk);

        let mut uncompressed = vec![0x04];
        uncompressed.extend_from_slice(&raw);
        assert_eq!(VerifyingKey::from_bytes(&uncompressed)?, vk);
        Ok(())
    }

    #[test]
    fn bad_key_material_rejected() {
        assert!(SigningKey::from_bytes(&[0; 31]).is_err());
        // Zero scalar is not a valid private key.
        assert!(SigningKey::from_bytes(&[0; 32]).is_err());
        assert!(VerifyingKey::from_bytes(&[0; 10]).is_err());
        // 64 zero bytes is not a point on the curve.
        assert!(VerifyingKey::from_bytes(&[0; 64]).is_err());
    }

    #[test]
    fn wrong_size_signature_is_false_not_error() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        assert!(!vk.verify(b"m", &[0; 63]));
        assert!(!vk.verify(b"m", &[0; 65]));
        assert!(!vk.verify(b"m", &[0; 64]));
    }
}
