/*! AES-CTR payload encryption.

M17 encrypts stream payloads with AES in counter mode. The 16-byte
CTR IV for stream mode is the 14 META bytes (the nonce or AES-IV
variant) followed by the big-endian frame number, so every frame of a
stream gets a distinct counter block without any extra signalling. In
packet mode the caller supplies the whole 16-byte IV.

Keys shorter than the selected width are rejected; longer key
material is truncated.
 */

use aes::cipher::{KeyIvInit, StreamCipher};

use crate::consts::META_SIZE;
use crate::{Error, Result};

type Ctr128<C> = ctr::Ctr128BE<C>;

/// AES key width.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AesMode {
    /// 16-byte key.
    Aes128,
    /// 24-byte key.
    Aes192,
    /// 32-byte key.
    Aes256,
}

impl AesMode {
    /// Key size in bytes.
    #[must_use]
    pub fn key_bytes(self) -> usize {
        match self {
            AesMode::Aes128 => 16,
            AesMode::Aes192 => 24,
            AesMode::Aes256 => 32,
        }
    }
}

/// AES-CTR cipher for M17 payloads.
#[derive(Copy, Clone, Debug)]
pub struct AesCipher {
    mode: AesMode,
}

impl AesCipher {
    /// A cipher of the given key width.
    #[must_use]
    pub fn new(mode: AesMode) -> Self {
        Self { mode }
    }

    fn check_key<'k>(&self, key: &'k [u8]) -> Result<&'k [u8]> {
        let want = self.mode.key_bytes();
        if key.len() < want {
            return Err(Error::KeyLength {
                want,
                got: key.len(),
            });
        }
        Ok(&key[..want])
    }

    /// Compose the stream-mode IV: `meta_iv(14) ‖ frame_number(2 BE)`.
    #[must_use]
    pub fn stream_iv(meta_iv: &[u8], frame_number: u16) -> [u8; 16] {
        let mut iv = [0u8; 16];
        let n = meta_iv.len().min(META_SIZE);
        iv[..n].copy_from_slice(&meta_iv[..n]);
        iv[14..].copy_from_slice(&frame_number.to_be_bytes());
        iv
    }

    fn apply(&self, key: &[u8], iv: &[u8; 16], data: &mut [u8]) -> Result<()> {
        let key = self.check_key(key)?;
        match self.mode {
            AesMode::Aes128 => Ctr128::<aes::Aes128>::new_from_slices(key, iv)
                .map_err(|_| Error::InvalidKey("AES-128 key"))?
                .apply_keystream(data),
            AesMode::Aes192 => Ctr128::<aes::Aes192>::new_from_slices(key, iv)
                .map_err(|_| Error::InvalidKey("AES-192 key"))?
                .apply_keystream(data),
            AesMode::Aes256 => Ctr128::<aes::Aes256>::new_from_slices(key, iv)
                .map_err(|_| Error::InvalidKey("AES-256 key"))?
                .apply_keystream(data),
        }
        Ok(())
    }

    /// Encrypt a stream-mode payload.
    pub fn encrypt_stream(
        &self,
        data: &[u8],
        key: &[u8],
        meta_iv: &[u8],
        frame_number: u16,
    ) -> Result<Vec<u8>> {
        let mut out = data.to_vec();
        self.apply(key, &Self::stream_iv(meta_iv, frame_number), &mut out)?;
        Ok(out)
    }

    /// Decrypt a stream-mode payload. CTR is symmetric.
    pub fn decrypt_stream(
        &self,
        data: &[u8],
        key: &[u8],
        meta_iv: &[u8],
        frame_number: u16,
    ) -> Result<Vec<u8>> {
        self.encrypt_stream(data, key, meta_iv, frame_number)
    }

    /// Encrypt a packet-mode payload with a caller-supplied 16-byte
    /// IV (shorter input is zero-padded, longer truncated).
    pub fn encrypt_packet(&self, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        let mut full_iv = [0u8; 16];
        let n = iv.len().min(16);
        full_iv[..n].copy_from_slice(&iv[..n]);
        let mut out = data.to_vec();
        self.apply(key, &full_iv, &mut out)?;
        Ok(out)
    }

    /// Decrypt a packet-mode payload.
    pub fn decrypt_packet(&self, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_packet(data, key, iv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[test]
    fn stream_symmetric_all_widths() -> Result<()> {
        let key = [0x42u8; 32];
        let meta_iv = [7u8; 14];
        let pt = b"sixteen byte blk";
        for mode in [AesMode::Aes128, AesMode::Aes192, AesMode::Aes256] {
            let cipher = AesCipher::new(mode);
            let ct = cipher.encrypt_stream(pt, &key, &meta_iv, 3)?;
            assert_ne!(&ct[..], pt);
            assert_eq!(cipher.decrypt_stream(&ct, &key, &meta_iv, 3)?, pt);
        }
        Ok(())
    }

    #[test]
    fn frame_number_changes_keystream() -> Result<()> {
        let cipher = AesCipher::new(AesMode::Aes256);
        let key = [1u8; 32];
        let meta_iv = [2u8; 14];
        let a = cipher.encrypt_stream(&[0; 16], &key, &meta_iv, 0)?;
        let b = cipher.encrypt_stream(&[0; 16], &key, &meta_iv, 1)?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    fn stream_iv_layout() {
        let iv = AesCipher::stream_iv(&[0xAA; 14], 0xBEEF);
        assert_eq!(&iv[..14], &[0xAA; 14]);
        assert_eq!(&iv[14..], &[0xBE, 0xEF]);
        // Short META IVs are zero-padded.
        let iv = AesCipher::stream_iv(&[1, 2], 0);
        assert_eq!(&iv[..3], &[1, 2, 0]);
    }

    #[test]
    fn short_key_rejected() {
        let cipher = AesCipher::new(AesMode::Aes256);
        assert!(matches!(
            cipher.encrypt_stream(b"x", &[0; 31], &[0; 14], 0),
            Err(crate::Error::KeyLength { want: 32, got: 31 })
        ));
    }

    #[test]
    fn long_key_truncated() -> Result<()> {
        let cipher = AesCipher::new(AesMode::Aes128);
        let ct_long = cipher.encrypt_stream(b"hello", &[9u8; 40], &[0; 14], 0)?;
        let ct_exact = cipher.encrypt_stream(b"hello", &[9u8; 16], &[0; 14], 0)?;
        assert_eq!(ct_long, ct_exact);
        Ok(())
    }

    #[test]
    fn packet_mode_symmetric() -> Result<()> {
        let cipher = AesCipher::new(AesMode::Aes128);
        let key = [3u8; 16];
        let iv = [5u8; 16];
        let pt: Vec<u8> = (0..100).collect();
        let ct = cipher.encrypt_packet(&pt, &key, &iv)?;
        assert_eq!(cipher.decrypt_packet(&ct, &key, &iv)?, pt);
        Ok(())
    }

    #[test]
    fn ctr_crosses_block_boundary() -> Result<()> {
        // More than one AES block: the counter must increment.
        let cipher = AesCipher::new(AesMode::Aes128);
        let key = [3u8; 16];
        let ct = cipher.encrypt_packet(&[0u8; 48], &key, &[0; 16])?;
        assert_ne!(&ct[..16], &ct[16..32]);
        assert_ne!(&ct[16..32], &ct[32..48]);
        Ok(())
    }
}
