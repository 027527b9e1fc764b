//! RSA public and private key operations.
//!
//! Only what certificate and keystore handling need: PKCS#1 v1.5 signature
//! verification with the public key, and CRT-based PKCS#1 v1.5 signing with
//! the private key.

mod pkcs1v15;

use crate::to_bytes_padded;
use derkit_types::{CryptoError, HashAlgId};
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use zeroize::Zeroize;

/// An RSA public key.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
    bits: usize,
    /// Modulus byte length (k).
    k: usize,
}

impl std::fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("bits", &self.bits)
            .finish()
    }
}

impl RsaPublicKey {
    /// Create an RSA public key from modulus and exponent (big-endian bytes).
    pub fn new(n: &[u8], e: &[u8]) -> Result<Self, CryptoError> {
        let n = BigUint::from_bytes_be(n);
        let e = BigUint::from_bytes_be(e);
        if n.is_zero() || n.is_even() || e.is_zero() || e.is_even() {
            return Err(CryptoError::InvalidKey);
        }
        let bits = n.bits() as usize;
        Ok(Self {
            n,
            e,
            bits,
            k: bits.div_ceil(8),
        })
    }

    /// Verify a PKCS#1 v1.5 signature over `digest`, computed with `hash`.
    pub fn verify_pkcs1v15(
        &self,
        hash: HashAlgId,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        if signature.len() != self.k {
            return Ok(false);
        }
        let em = match self.raw_public(signature) {
            Ok(em) => em,
            Err(CryptoError::RsaOutOfRange) => return Ok(false),
            Err(e) => return Err(e),
        };
        pkcs1v15::verify_unpad(&em, hash, digest, self.k)
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn modulus_len(&self) -> usize {
        self.k
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    /// Raw RSA public key operation: m^e mod n (RSAVP1).
    fn raw_public(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let m = BigUint::from_bytes_be(data);
        if m >= self.n {
            return Err(CryptoError::RsaOutOfRange);
        }
        to_bytes_padded(&m.modpow(&self.e, &self.n), self.k)
    }
}

/// An RSA private key with CRT parameters.
///
/// Secret components are held as big-endian bytes so they can be wiped on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct RsaPrivateKey {
    n: Vec<u8>,
    e: Vec<u8>,
    d: Vec<u8>,
    p: Vec<u8>,
    q: Vec<u8>,
    /// d mod (p-1)
    dp: Vec<u8>,
    /// d mod (q-1)
    dq: Vec<u8>,
    /// q^(-1) mod p
    qinv: Vec<u8>,
    #[zeroize(skip)]
    bits: usize,
}

impl std::fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("bits", &self.bits)
            .finish()
    }
}

impl RsaPrivateKey {
    /// Create an RSA private key from its components (big-endian bytes).
    ///
    /// The CRT parameters are recomputed from `d`, `p` and `q`.
    pub fn new(n: &[u8], e: &[u8], d: &[u8], p: &[u8], q: &[u8]) -> Result<Self, CryptoError> {
        let n_bn = BigUint::from_bytes_be(n);
        let d_bn = BigUint::from_bytes_be(d);
        let p_bn = BigUint::from_bytes_be(p);
        let q_bn = BigUint::from_bytes_be(q);
        let one = BigUint::one();

        if n_bn.is_zero() || d_bn.is_zero() || BigUint::from_bytes_be(e).is_zero() {
            return Err(CryptoError::InvalidKey);
        }
        if p_bn <= one || q_bn <= one || &p_bn * &q_bn != n_bn {
            return Err(CryptoError::InvalidKey);
        }

        let dp = &d_bn % (&p_bn - &one);
        let dq = &d_bn % (&q_bn - &one);
        // p is prime, so q^(p-2) is the inverse of q mod p
        let qinv = q_bn.modpow(&(&p_bn - 2u32), &p_bn);
        if qinv.is_zero() {
            return Err(CryptoError::InvalidKey);
        }

        Ok(Self {
            n: n_bn.to_bytes_be(),
            e: BigUint::from_bytes_be(e).to_bytes_be(),
            d: d_bn.to_bytes_be(),
            p: p_bn.to_bytes_be(),
            q: q_bn.to_bytes_be(),
            dp: dp.to_bytes_be(),
            dq: dq.to_bytes_be(),
            qinv: qinv.to_bytes_be(),
            bits: n_bn.bits() as usize,
        })
    }

    /// Sign a message digest computed with `hash` (RSASSA-PKCS1-v1_5).
    pub fn sign_pkcs1v15(&self, hash: HashAlgId, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let k = self.modulus_len();
        let em = pkcs1v15::sign_pad(hash, digest, k)?;
        let signature = self.raw_private(&em)?;

        // guard against a faulty CRT result leaking a factor
        if !self.public_key().verify_pkcs1v15(hash, digest, &signature)? {
            return Err(CryptoError::VerifyFail);
        }
        Ok(signature)
    }

    /// Extract the corresponding public key.
    pub fn public_key(&self) -> RsaPublicKey {
        let n = BigUint::from_bytes_be(&self.n);
        RsaPublicKey {
            k: self.modulus_len(),
            bits: self.bits,
            e: BigUint::from_bytes_be(&self.e),
            n,
        }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn modulus_len(&self) -> usize {
        self.bits.div_ceil(8)
    }

    /// Return the modulus as big-endian bytes.
    pub fn n_bytes(&self) -> &[u8] {
        &self.n
    }

    /// Return the public exponent as big-endian bytes.
    pub fn e_bytes(&self) -> &[u8] {
        &self.e
    }

    /// Return the private exponent as big-endian bytes.
    pub fn d_bytes(&self) -> &[u8] {
        &self.d
    }

    /// Return prime factor p as big-endian bytes.
    pub fn p_bytes(&self) -> &[u8] {
        &self.p
    }

    /// Return prime factor q as big-endian bytes.
    pub fn q_bytes(&self) -> &[u8] {
        &self.q
    }

    /// Return the CRT exponents and coefficient (dp, dq, qinv).
    pub fn crt_bytes(&self) -> (&[u8], &[u8], &[u8]) {
        (&self.dp, &self.dq, &self.qinv)
    }

    /// Raw RSA private key operation: c^d mod n (RSASP1) via CRT.
    fn raw_private(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let n = BigUint::from_bytes_be(&self.n);
        let c = BigUint::from_bytes_be(data);
        if c >= n {
            return Err(CryptoError::RsaOutOfRange);
        }
        let p = BigUint::from_bytes_be(&self.p);
        let q = BigUint::from_bytes_be(&self.q);

        // m1 = c^dp mod p, m2 = c^dq mod q
        let m1 = c.modpow(&BigUint::from_bytes_be(&self.dp), &p);
        let m2 = c.modpow(&BigUint::from_bytes_be(&self.dq), &q);

        // h = qinv * (m1 - m2) mod p, kept non-negative
        let diff = (&m1 + &p - (&m2 % &p)) % &p;
        let h = (diff * BigUint::from_bytes_be(&self.qinv)) % &p;

        let m = m2 + h * q;
        to_bytes_padded(&m, self.modulus_len())
    }
}
