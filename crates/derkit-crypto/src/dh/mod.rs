//! Finite-field Diffie-Hellman key agreement.
//!
//! Parameters come from the caller (typically a certificate's or keystore's
//! `DomainParameters`); no named groups are bundled.

use crate::provider::KeyAgreement;
use crate::to_bytes_padded;
use derkit_types::CryptoError;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use zeroize::Zeroize;

/// Diffie-Hellman domain parameters (p, g).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhParams {
    p: BigUint,
    g: BigUint,
}

impl DhParams {
    /// Create DH parameters from big-endian byte arrays for prime and generator.
    pub fn new(p: &[u8], g: &[u8]) -> Result<Self, CryptoError> {
        let p = BigUint::from_bytes_be(p);
        let g = BigUint::from_bytes_be(g);
        // p must be odd and > 3, 1 < g < p - 1
        if p.bits() < 3 || p.is_even() {
            return Err(CryptoError::InvalidArg);
        }
        if g <= BigUint::one() || g >= &p - 1u32 {
            return Err(CryptoError::InvalidArg);
        }
        Ok(Self { p, g })
    }

    /// Return the size of the prime in bytes.
    pub fn prime_size(&self) -> usize {
        (self.p.bits() as usize).div_ceil(8)
    }
}

/// A Diffie-Hellman key pair.
#[derive(Clone)]
pub struct DhKeyPair {
    params: DhParams,
    /// Big-endian private exponent; wiped on drop.
    private_key: Vec<u8>,
    public_key: BigUint,
}

impl Drop for DhKeyPair {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

impl DhKeyPair {
    /// Generate a key pair: x random in [2, p-2], y = g^x mod p.
    pub fn generate(params: &DhParams) -> Result<Self, CryptoError> {
        let mut buf = vec![0u8; params.prime_size() + 8];
        getrandom::getrandom(&mut buf).map_err(|_| CryptoError::RandGenFail)?;
        let x = BigUint::from_bytes_be(&buf) % (&params.p - 3u32) + 2u32;
        buf.zeroize();
        Self::from_private(params, &x.to_bytes_be())
    }

    /// Rebuild a key pair from a known private exponent.
    pub fn from_private(params: &DhParams, x: &[u8]) -> Result<Self, CryptoError> {
        let x_bn = BigUint::from_bytes_be(x);
        if x_bn <= BigUint::one() || x_bn >= &params.p - 1u32 {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self {
            public_key: params.g.modpow(&x_bn, &params.p),
            private_key: x_bn.to_bytes_be(),
            params: params.clone(),
        })
    }

    /// Return the public value in big-endian bytes, padded to prime_size.
    pub fn public_key_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        to_bytes_padded(&self.public_key, self.params.prime_size())
    }
}

impl KeyAgreement for DhKeyPair {
    /// s = peer^x mod p, padded to prime_size; the peer value must lie in [2, p-2].
    fn compute_shared_secret(&self, peer_public: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let p = &self.params.p;
        let peer = BigUint::from_bytes_be(peer_public);
        if peer <= BigUint::one() || peer >= p - 1u32 {
            return Err(CryptoError::InvalidArg);
        }
        let x = BigUint::from_bytes_be(&self.private_key);
        to_bytes_padded(&peer.modpow(&x, p), self.params.prime_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 2409 Oakley group 1 (768-bit MODP)
    const MODP_768: &str = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74\
                            020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437\
                            4FE1356D6D51C245E485B576625E7EC6F44C42E9A63A3620FFFFFFFFFFFFFFFF";

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn test_key_exchange() {
        let params = DhParams::new(&hex(MODP_768), &[2]).unwrap();
        assert_eq!(params.prime_size(), 96);

        let alice = DhKeyPair::generate(&params).unwrap();
        let bob = DhKeyPair::generate(&params).unwrap();
        let secret_alice = alice
            .compute_shared_secret(&bob.public_key_bytes().unwrap())
            .unwrap();
        let secret_bob = bob
            .compute_shared_secret(&alice.public_key_bytes().unwrap())
            .unwrap();
        assert_eq!(secret_alice, secret_bob);
        assert_eq!(secret_alice.len(), 96);
    }

    #[test]
    fn test_small_group() {
        // p = 23, g = 5: 5^6 = 8, 5^15 = 19, shared 2
        let params = DhParams::new(&[23], &[5]).unwrap();
        let alice = DhKeyPair::from_private(&params, &[6]).unwrap();
        let bob = DhKeyPair::from_private(&params, &[15]).unwrap();
        assert_eq!(alice.public_key_bytes().unwrap(), vec![8]);
        assert_eq!(bob.public_key_bytes().unwrap(), vec![19]);
        assert_eq!(alice.compute_shared_secret(&[19]).unwrap(), vec![2]);
        assert_eq!(bob.compute_shared_secret(&[8]).unwrap(), vec![2]);
    }

    #[test]
    fn test_peer_validation() {
        let params = DhParams::new(&[23], &[5]).unwrap();
        let alice = DhKeyPair::from_private(&params, &[6]).unwrap();
        assert_eq!(alice.compute_shared_secret(&[1]), Err(CryptoError::InvalidArg));
        assert_eq!(alice.compute_shared_secret(&[22]), Err(CryptoError::InvalidArg));
        assert!(DhParams::new(&[22], &[5]).is_err());
    }
}
