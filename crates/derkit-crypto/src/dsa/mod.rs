//! DSA (FIPS 186-4) signing and verification.
//!
//! Signatures travel as the DER `Dss-Sig-Value ::= SEQUENCE { r INTEGER, s INTEGER }`
//! used by X.509 and CMS.

use crate::provider::{Signer, Verifier};
use derkit_types::CryptoError;
use derkit_utils::asn1::{write_length, Length, Reader, Tag};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use zeroize::Zeroize;

/// DSA domain parameters (p, q, g).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaParams {
    /// The prime modulus p.
    p: BigUint,
    /// The subgroup order q.
    q: BigUint,
    /// The generator g.
    g: BigUint,
}

impl DsaParams {
    /// Create DSA parameters from big-endian p, q and g.
    pub fn new(p: &[u8], q: &[u8], g: &[u8]) -> Result<Self, CryptoError> {
        let p = BigUint::from_bytes_be(p);
        let q = BigUint::from_bytes_be(q);
        let g = BigUint::from_bytes_be(g);
        let one = BigUint::one();
        if p <= one || q <= one || g <= one || g >= p {
            return Err(CryptoError::InvalidArg);
        }
        if !((&p - &one) % &q).is_zero() {
            return Err(CryptoError::InvalidArg);
        }
        Ok(Self { p, q, g })
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Leftmost min(N, outlen) bits of the digest, as an integer.
    fn truncate_digest(&self, digest: &[u8]) -> BigUint {
        let z = BigUint::from_bytes_be(digest);
        let n = self.q.bits() as usize;
        let digest_bits = digest.len() * 8;
        if digest_bits > n {
            z >> (digest_bits - n)
        } else {
            z
        }
    }

    /// a^(-1) mod q, using that q is prime.
    fn inverse_mod_q(&self, a: &BigUint) -> BigUint {
        a.modpow(&(&self.q - 2u32), &self.q)
    }
}

/// A DSA public key y = g^x mod p.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaPublicKey {
    params: DsaParams,
    y: BigUint,
}

impl DsaPublicKey {
    pub fn new(params: DsaParams, y: &[u8]) -> Result<Self, CryptoError> {
        let y = BigUint::from_bytes_be(y);
        if y <= BigUint::one() || y >= params.p {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self { params, y })
    }

    pub fn params(&self) -> &DsaParams {
        &self.params
    }

    pub fn y(&self) -> &BigUint {
        &self.y
    }

    /// Verify a DER signature over a message digest.
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        let Some((r, s)) = decode_signature(signature) else {
            return Ok(false);
        };
        let DsaParams { p, q, g } = &self.params;
        if r.is_zero() || &r >= q || s.is_zero() || &s >= q {
            return Ok(false);
        }

        let w = self.params.inverse_mod_q(&s);
        let z = self.params.truncate_digest(digest);
        let u1 = (z * &w) % q;
        let u2 = (&r * &w) % q;
        let v = ((g.modpow(&u1, p) * self.y.modpow(&u2, p)) % p) % q;
        Ok(v == r)
    }
}

impl Verifier for DsaPublicKey {
    fn verify(&self, digest: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        DsaPublicKey::verify(self, digest, signature)
    }
}

/// A DSA private key x.
#[derive(Clone)]
pub struct DsaPrivateKey {
    params: DsaParams,
    /// Big-endian private exponent; wiped on drop.
    x: Vec<u8>,
}

impl std::fmt::Debug for DsaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsaPrivateKey")
            .field("params", &self.params)
            .finish()
    }
}

impl Drop for DsaPrivateKey {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

impl DsaPrivateKey {
    pub fn new(params: DsaParams, x: &[u8]) -> Result<Self, CryptoError> {
        let x_bn = BigUint::from_bytes_be(x);
        if x_bn.is_zero() || x_bn >= params.q {
            return Err(CryptoError::InvalidKey);
        }
        Ok(Self {
            params,
            x: x_bn.to_bytes_be(),
        })
    }

    pub fn params(&self) -> &DsaParams {
        &self.params
    }

    /// Return the private exponent as big-endian bytes.
    pub fn x_bytes(&self) -> &[u8] {
        &self.x
    }

    /// Derive the public key y = g^x mod p.
    pub fn public_key(&self) -> DsaPublicKey {
        let x = BigUint::from_bytes_be(&self.x);
        DsaPublicKey {
            y: self.params.g.modpow(&x, &self.params.p),
            params: self.params.clone(),
        }
    }

    /// Sign a message digest, returning a DER `Dss-Sig-Value`.
    pub fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let DsaParams { p, q, g } = &self.params;
        let x = BigUint::from_bytes_be(&self.x);
        let z = self.params.truncate_digest(digest);

        loop {
            let k = random_nonce(q)?;
            let r = g.modpow(&k, p) % q;
            if r.is_zero() {
                continue;
            }
            let k_inv = self.params.inverse_mod_q(&k);
            let s = (k_inv * ((&z + &x * &r) % q)) % q;
            if s.is_zero() {
                continue;
            }
            return Ok(encode_signature(&r, &s));
        }
    }
}

impl Signer for DsaPrivateKey {
    fn sign(&self, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        DsaPrivateKey::sign(self, digest)
    }
}

/// Uniform-enough k in [1, q-1]: 64 extra random bits reduced mod q-1.
fn random_nonce(q: &BigUint) -> Result<BigUint, CryptoError> {
    let len = (q.bits() as usize).div_ceil(8) + 8;
    let mut buf = vec![0u8; len];
    getrandom::getrandom(&mut buf).map_err(|_| CryptoError::RandGenFail)?;
    let k = BigUint::from_bytes_be(&buf) % (q - 1u32) + 1u32;
    buf.zeroize();
    Ok(k)
}

fn push_integer(out: &mut Vec<u8>, value: &BigUint) {
    let mut bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    out.push(0x02);
    write_length(out, bytes.len());
    out.extend_from_slice(&bytes);
}

/// DER `SEQUENCE { r INTEGER, s INTEGER }`.
pub fn encode_signature(r: &BigUint, s: &BigUint) -> Vec<u8> {
    let mut body = Vec::new();
    push_integer(&mut body, r);
    push_integer(&mut body, s);
    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(0x30);
    write_length(&mut out, body.len());
    out.extend_from_slice(&body);
    out
}

/// Parse a DER `Dss-Sig-Value`; `None` if it is not exactly two non-negative INTEGERs.
pub fn decode_signature(der: &[u8]) -> Option<(BigUint, BigUint)> {
    let mut outer = Reader::new(der);
    let (tag, length) = outer.read_header().ok()?;
    let Length::Definite(len) = length else {
        return None;
    };
    if tag != Tag::SEQUENCE {
        return None;
    }
    let mut body = outer.sub(len).ok()?;
    if !outer.is_empty() {
        return None;
    }

    let mut read_integer = || -> Option<BigUint> {
        let (tag, length) = body.read_header().ok()?;
        let Length::Definite(len) = length else {
            return None;
        };
        if tag != Tag::universal(2, false) || len == 0 {
            return None;
        }
        let bytes = body.take(len).ok()?;
        if bytes[0] & 0x80 != 0 {
            return None;
        }
        Some(BigUint::from_bytes_be(bytes))
    };
    let r = read_integer()?;
    let s = read_integer()?;
    if !body.is_empty() {
        return None;
    }
    Some((r, s))
}
