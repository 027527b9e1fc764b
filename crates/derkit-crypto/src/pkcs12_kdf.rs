//! PKCS#12 key derivation (RFC 7292, Appendix B.2).
//!
//! Derives cipher keys, IVs and MAC keys from a BMPString password. The
//! purpose byte (`ID`) separates the three outputs derived from one salt.

use crate::hash::Hasher;
use crate::provider::Digest;
use derkit_types::{CryptoError, HashAlgId};
use zeroize::Zeroize;

/// Purpose byte for cipher key material.
pub const KEY_ID: u8 = 1;
/// Purpose byte for initialization vectors.
pub const IV_ID: u8 = 2;
/// Purpose byte for MAC keys.
pub const MAC_ID: u8 = 3;

/// Format a password as PKCS#12 expects: big-endian UTF-16 with a trailing NUL.
pub fn bmp_password(password: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity((password.len() + 1) * 2);
    for unit in password.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out.extend_from_slice(&[0, 0]);
    out
}

/// Repeat `data` to the smallest multiple of `v` that holds it.
fn fill_blocks(data: &[u8], v: usize) -> Vec<u8> {
    if data.is_empty() {
        return Vec::new();
    }
    let len = v * data.len().div_ceil(v);
    data.iter().copied().cycle().take(len).collect()
}

/// Derive `len` bytes for purpose `id` from a BMP-encoded password.
pub fn derive(
    alg: HashAlgId,
    password: &[u8],
    salt: &[u8],
    id: u8,
    iterations: u32,
    len: usize,
) -> Result<Vec<u8>, CryptoError> {
    if iterations == 0 {
        return Err(CryptoError::KdfInvalidIterations);
    }
    let u = alg.output_size();
    let v = alg.block_size();

    let diversifier = vec![id; v];
    let mut input = fill_blocks(salt, v);
    let mut p = fill_blocks(password, v);
    input.extend_from_slice(&p);
    p.zeroize();

    let mut hasher = Hasher::new(alg);
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        hasher.update(&diversifier)?;
        hasher.update(&input)?;
        let mut a = hasher.finish_vec();
        for _ in 1..iterations {
            hasher.update(&a)?;
            a = hasher.finish_vec();
        }

        let take = u.min(len - out.len());
        out.extend_from_slice(&a[..take]);
        if out.len() == len {
            a.zeroize();
            break;
        }

        // I_j = (I_j + B + 1) mod 2^(8v) for every v-byte block of I
        let mut b: Vec<u8> = a.iter().copied().cycle().take(v).collect();
        for block in input.chunks_mut(v) {
            let mut carry = 1u16;
            for (x, y) in block.iter_mut().zip(&b).rev() {
                let sum = u16::from(*x) + u16::from(*y) + carry;
                *x = sum as u8;
                carry = sum >> 8;
            }
        }
        a.zeroize();
        b.zeroize();
    }

    input.zeroize();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_bmp_password() {
        assert_eq!(bmp_password("ab"), vec![0, b'a', 0, b'b', 0, 0]);
        assert_eq!(bmp_password(""), vec![0, 0]);
        assert_eq!(bmp_password("\u{e9}"), vec![0, 0xe9, 0, 0]);
    }

    #[test]
    fn test_sha1_key_and_iv() {
        let password = bmp_password("smeg");
        let salt = hex("0A58CF64530D823F");
        let key = derive(HashAlgId::Sha1, &password, &salt, KEY_ID, 1, 24).unwrap();
        assert_eq!(key, hex("8AAAE6297B6CB04642AB5B077851284EB7128F1A2A7FBCA3"));
        let iv = derive(HashAlgId::Sha1, &password, &salt, IV_ID, 1, 8).unwrap();
        assert_eq!(iv, hex("79993DFE048D3B76"));
    }

    #[test]
    fn test_sha1_mac_key() {
        let password = bmp_password("smeg");
        let salt = hex("3D83C0E4546AC140");
        let key = derive(HashAlgId::Sha1, &password, &salt, MAC_ID, 1, 20).unwrap();
        assert_eq!(key, hex("8D967D88F6CAA9D714800AB3D48051D63F73A312"));
    }

    #[test]
    fn test_iterated() {
        let password = bmp_password("queeg");
        let salt = hex("05DEC959ACFF72F7");
        let key = derive(HashAlgId::Sha1, &password, &salt, KEY_ID, 1000, 24).unwrap();
        assert_eq!(key, hex("ED2034E36328830FF09DF1E1A07DD357185DAC0D4F9EB3D4"));
    }

    #[test]
    fn test_prefix_stability() {
        // a shorter request is a prefix of a longer one
        let password = bmp_password("test1234");
        let long = derive(HashAlgId::Sha256, &password, b"saltsalt", KEY_ID, 3, 80).unwrap();
        let short = derive(HashAlgId::Sha256, &password, b"saltsalt", KEY_ID, 3, 16).unwrap();
        assert_eq!(&long[..16], &short[..]);
    }

    #[test]
    fn test_zero_iterations() {
        assert_eq!(
            derive(HashAlgId::Sha1, &[0, 0], b"salt", KEY_ID, 0, 8),
            Err(CryptoError::KdfInvalidIterations)
        );
    }
}
