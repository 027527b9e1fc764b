//! Symmetric ciphers used by password-based encryption.
//!
//! Block ciphers run in CBC mode with PKCS#7 padding; RC4 is a plain keystream.
//! Keys and IVs are taken as given, so callers derive them first.

use ::cipher::block_padding::Pkcs7;
use ::cipher::consts::{U16, U5};
use ::cipher::{
    BlockCipher, BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyInit, StreamCipher,
};
use derkit_types::{CipherAlgId, CipherDirection, CryptoError};
use rc4::Rc4;

/// Key length in bytes expected for `alg`, if fixed.
pub fn key_len(alg: CipherAlgId) -> Option<usize> {
    match alg {
        CipherAlgId::DesCbc => Some(8),
        CipherAlgId::DesEde2Cbc => Some(16),
        CipherAlgId::DesEde3Cbc => Some(24),
        CipherAlgId::Aes128Cbc => Some(16),
        CipherAlgId::Aes192Cbc => Some(24),
        CipherAlgId::Aes256Cbc => Some(32),
        CipherAlgId::Rc2Cbc { .. } | CipherAlgId::Rc4 => None,
    }
}

/// Encrypt or decrypt `data` in one shot.
pub fn cipher(
    direction: CipherDirection,
    alg: CipherAlgId,
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if let Some(expected) = key_len(alg) {
        if key.len() != expected {
            return Err(CryptoError::InvalidKeyLength {
                expected,
                got: key.len(),
            });
        }
    }
    if alg.needs_iv() && iv.len() != alg.block_size() {
        return Err(CryptoError::InvalidIvLength);
    }

    match alg {
        CipherAlgId::DesCbc => run_cbc(keyed::<des::Des>(key)?, direction, iv, data),
        CipherAlgId::DesEde2Cbc => run_cbc(keyed::<des::TdesEde2>(key)?, direction, iv, data),
        CipherAlgId::DesEde3Cbc => run_cbc(keyed::<des::TdesEde3>(key)?, direction, iv, data),
        CipherAlgId::Aes128Cbc => run_cbc(keyed::<aes::Aes128>(key)?, direction, iv, data),
        CipherAlgId::Aes192Cbc => run_cbc(keyed::<aes::Aes192>(key)?, direction, iv, data),
        CipherAlgId::Aes256Cbc => run_cbc(keyed::<aes::Aes256>(key)?, direction, iv, data),
        CipherAlgId::Rc2Cbc { effective_bits } => {
            if key.is_empty() || key.len() > 128 || effective_bits == 0 || effective_bits > 1024
            {
                return Err(CryptoError::InvalidKey);
            }
            let rc2 = rc2::Rc2::new_with_eff_key_len(key, effective_bits);
            run_cbc(rc2, direction, iv, data)
        }
        // RC4 is symmetric
        CipherAlgId::Rc4 => rc4_apply(key, data),
    }
}

/// [`cipher`] with the algorithm addressed by name ("DESede", "rc2-40-cbc", ...).
pub fn cipher_by_name(
    direction: CipherDirection,
    name: &str,
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let alg = CipherAlgId::from_name(name)
        .ok_or_else(|| CryptoError::UnsupportedAlgorithm(name.to_string()))?;
    cipher(direction, alg, key, iv, data)
}

fn keyed<C: KeyInit>(key: &[u8]) -> Result<C, CryptoError> {
    C::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)
}

fn run_cbc<C>(
    inner: C,
    direction: CipherDirection,
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError>
where
    C: BlockCipher + BlockEncryptMut + BlockDecryptMut,
{
    match direction {
        CipherDirection::Encrypt => {
            let enc = cbc::Encryptor::<C>::inner_iv_slice_init(inner, iv)
                .map_err(|_| CryptoError::InvalidIvLength)?;
            Ok(enc.encrypt_padded_vec_mut::<Pkcs7>(data))
        }
        CipherDirection::Decrypt => {
            if data.is_empty() || data.len() % C::block_size() != 0 {
                return Err(CryptoError::InvalidInputLength);
            }
            let dec = cbc::Decryptor::<C>::inner_iv_slice_init(inner, iv)
                .map_err(|_| CryptoError::InvalidIvLength)?;
            dec.decrypt_padded_vec_mut::<Pkcs7>(data)
                .map_err(|_| CryptoError::InvalidPadding)
        }
    }
}

fn rc4_apply(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut out = data.to_vec();
    match key.len() {
        5 => Rc4::<U5>::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKey)?
            .apply_keystream(&mut out),
        16 => Rc4::<U16>::new_from_slice(key)
            .map_err(|_| CryptoError::InvalidKey)?
            .apply_keystream(&mut out),
        got => return Err(CryptoError::InvalidKeyLength { expected: 16, got }),
    }
    Ok(out)
}
