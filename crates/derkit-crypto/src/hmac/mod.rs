//! HMAC (RFC 2104) over any supported digest.
//!
//! The MAC itself is RustCrypto's `hmac::Hmac<D>`; this wrapper picks `D`
//! from a [`HashAlgId`] at runtime.

use ::hmac::Mac;
use derkit_types::{CryptoError, HashAlgId};

enum State {
    Md5(::hmac::Hmac<md5::Md5>),
    Sha1(::hmac::Hmac<sha1::Sha1>),
    Sha224(::hmac::Hmac<sha2::Sha224>),
    Sha256(::hmac::Hmac<sha2::Sha256>),
    Sha384(::hmac::Hmac<sha2::Sha384>),
    Sha512(::hmac::Hmac<sha2::Sha512>),
    Ripemd160(::hmac::Hmac<ripemd::Ripemd160>),
}

macro_rules! each_state {
    ($state:expr, $mac:ident => $body:expr) => {
        match $state {
            State::Md5($mac) => $body,
            State::Sha1($mac) => $body,
            State::Sha224($mac) => $body,
            State::Sha256($mac) => $body,
            State::Sha384($mac) => $body,
            State::Sha512($mac) => $body,
            State::Ripemd160($mac) => $body,
        }
    };
}

/// HMAC context.
pub struct Hmac {
    alg: HashAlgId,
    state: State,
}

impl Hmac {
    pub fn new(alg: HashAlgId, key: &[u8]) -> Result<Self, CryptoError> {
        fn keyed<M: Mac + ::hmac::digest::KeyInit>(key: &[u8]) -> Result<M, CryptoError> {
            <M as Mac>::new_from_slice(key).map_err(|_| CryptoError::InvalidArg)
        }
        let state = match alg {
            HashAlgId::Md5 => State::Md5(keyed(key)?),
            HashAlgId::Sha1 => State::Sha1(keyed(key)?),
            HashAlgId::Sha224 => State::Sha224(keyed(key)?),
            HashAlgId::Sha256 => State::Sha256(keyed(key)?),
            HashAlgId::Sha384 => State::Sha384(keyed(key)?),
            HashAlgId::Sha512 => State::Sha512(keyed(key)?),
            HashAlgId::Ripemd160 => State::Ripemd160(keyed(key)?),
        };
        Ok(Self { alg, state })
    }

    pub fn output_size(&self) -> usize {
        self.alg.output_size()
    }

    /// Feed data into the HMAC computation.
    pub fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        each_state!(&mut self.state, mac => mac.update(data));
        Ok(())
    }

    /// Finalize the HMAC computation and write the result to `out`.
    /// The context is reset to the same key afterwards.
    pub fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let n = self.output_size();
        if out.len() < n {
            return Err(CryptoError::InvalidArg);
        }
        each_state!(&mut self.state, mac => {
            out[..n].copy_from_slice(&mac.finalize_reset().into_bytes())
        });
        Ok(())
    }

    /// Reset the HMAC state for reuse with the same key.
    pub fn reset(&mut self) -> Result<(), CryptoError> {
        each_state!(&mut self.state, mac => Mac::reset(mac));
        Ok(())
    }

    /// One-shot HMAC computation.
    pub fn mac(alg: HashAlgId, key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut ctx = Self::new(alg, key)?;
        ctx.update(data)?;
        let mut out = vec![0u8; ctx.output_size()];
        ctx.finish(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    // RFC 4231 Test Case 1
    #[test]
    fn test_hmac_sha256_case1() {
        let key = [0x0b; 20];
        let expected = "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7";
        let result = Hmac::mac(HashAlgId::Sha256, &key, b"Hi There").unwrap();
        assert_eq!(hex(&result), expected);
    }

    // RFC 4231 Test Case 2
    #[test]
    fn test_hmac_sha256_case2() {
        let expected = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";
        let result =
            Hmac::mac(HashAlgId::Sha256, b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(hex(&result), expected);
    }

    // RFC 4231 Test Case 6 (key longer than block size)
    #[test]
    fn test_hmac_sha256_long_key() {
        let key = [0xaa; 131];
        let data = b"Test Using Larger Than Block-Size Key - Hash Key First";
        let expected = "60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54";
        let result = Hmac::mac(HashAlgId::Sha256, &key, data).unwrap();
        assert_eq!(hex(&result), expected);
    }

    // RFC 2202 Test Case 2
    #[test]
    fn test_hmac_sha1() {
        let expected = "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79";
        let result =
            Hmac::mac(HashAlgId::Sha1, b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(hex(&result), expected);
    }

    // RFC 4231 Test Case 2, SHA-512 (128-byte block)
    #[test]
    fn test_hmac_sha512() {
        let expected = "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
                        9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737";
        let result =
            Hmac::mac(HashAlgId::Sha512, b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(hex(&result), expected);
    }

    #[test]
    fn test_reset_reuses_key() {
        let mut ctx = Hmac::new(HashAlgId::Sha256, b"Jefe").unwrap();
        ctx.update(b"garbage").unwrap();
        ctx.reset().unwrap();
        ctx.update(b"what do ya want for nothing?").unwrap();
        let mut out = [0u8; 32];
        ctx.finish(&mut out).unwrap();
        assert_eq!(
            out.to_vec(),
            Hmac::mac(HashAlgId::Sha256, b"Jefe", b"what do ya want for nothing?").unwrap()
        );
    }

    // RFC 2202 Test Case 2, MD5
    #[test]
    fn test_hmac_md5() {
        let expected = "750c783e6ab0b503eaa86e310a5db738";
        let result = Hmac::mac(HashAlgId::Md5, b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(hex(&result), expected);
    }

    #[test]
    fn test_short_output_buffer() {
        let mut ctx = Hmac::new(HashAlgId::Sha1, b"key").unwrap();
        let mut out = [0u8; 19];
        assert!(ctx.finish(&mut out).is_err());
    }
}
