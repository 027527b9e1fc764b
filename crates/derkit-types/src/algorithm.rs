/// Hash algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgId {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Ripemd160,
}

impl HashAlgId {
    /// Digest output length in bytes.
    pub fn output_size(self) -> usize {
        match self {
            HashAlgId::Md5 => 16,
            HashAlgId::Sha1 | HashAlgId::Ripemd160 => 20,
            HashAlgId::Sha224 => 28,
            HashAlgId::Sha256 => 32,
            HashAlgId::Sha384 => 48,
            HashAlgId::Sha512 => 64,
        }
    }

    /// Internal block length in bytes (the `v` of the PKCS#12 KDF).
    pub fn block_size(self) -> usize {
        match self {
            HashAlgId::Sha384 | HashAlgId::Sha512 => 128,
            _ => 64,
        }
    }

    /// Look up an algorithm by one of its common names ("SHA-1", "sha256", "MD5", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "md5" => Some(HashAlgId::Md5),
            "sha1" | "sha" => Some(HashAlgId::Sha1),
            "sha224" => Some(HashAlgId::Sha224),
            "sha256" => Some(HashAlgId::Sha256),
            "sha384" => Some(HashAlgId::Sha384),
            "sha512" => Some(HashAlgId::Sha512),
            "ripemd160" | "rmd160" => Some(HashAlgId::Ripemd160),
            _ => None,
        }
    }

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            HashAlgId::Md5 => "MD5",
            HashAlgId::Sha1 => "SHA-1",
            HashAlgId::Sha224 => "SHA-224",
            HashAlgId::Sha256 => "SHA-256",
            HashAlgId::Sha384 => "SHA-384",
            HashAlgId::Sha512 => "SHA-512",
            HashAlgId::Ripemd160 => "RIPEMD160",
        }
    }
}

/// Symmetric cipher algorithm identifiers (algorithm + mode combination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherAlgId {
    /// Single DES, CBC mode.
    DesCbc,
    /// Two-key triple DES (K1, K2, K1), CBC mode.
    DesEde2Cbc,
    /// Three-key triple DES, CBC mode.
    DesEde3Cbc,
    /// RC2 in CBC mode; the effective key length in bits is carried explicitly.
    Rc2Cbc { effective_bits: usize },
    /// RC4 stream cipher; the key length alone selects the variant.
    Rc4,
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
}

impl CipherAlgId {
    /// Block length in bytes (1 for stream ciphers).
    pub fn block_size(self) -> usize {
        match self {
            CipherAlgId::DesCbc
            | CipherAlgId::DesEde2Cbc
            | CipherAlgId::DesEde3Cbc
            | CipherAlgId::Rc2Cbc { .. } => 8,
            CipherAlgId::Rc4 => 1,
            CipherAlgId::Aes128Cbc | CipherAlgId::Aes192Cbc | CipherAlgId::Aes256Cbc => 16,
        }
    }

    /// Whether the algorithm takes an initialization vector.
    pub fn needs_iv(self) -> bool {
        !matches!(self, CipherAlgId::Rc4)
    }

    /// Look up a cipher by a JCE-style or OpenSSL-style name.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.to_ascii_lowercase();
        match normalized.as_str() {
            "des" | "des-cbc" | "des/cbc" => Some(CipherAlgId::DesCbc),
            "desede2" | "des-ede-cbc" => Some(CipherAlgId::DesEde2Cbc),
            "desede" | "desede3" | "des-ede3-cbc" | "3des" | "tripledes" => {
                Some(CipherAlgId::DesEde3Cbc)
            }
            "rc2" | "rc2-cbc" | "rc2-128-cbc" => Some(CipherAlgId::Rc2Cbc {
                effective_bits: 128,
            }),
            "rc2-40-cbc" => Some(CipherAlgId::Rc2Cbc { effective_bits: 40 }),
            "rc4" | "arcfour" => Some(CipherAlgId::Rc4),
            "aes-128-cbc" | "aes128" => Some(CipherAlgId::Aes128Cbc),
            "aes-192-cbc" | "aes192" => Some(CipherAlgId::Aes192Cbc),
            "aes-256-cbc" | "aes256" => Some(CipherAlgId::Aes256Cbc),
            _ => None,
        }
    }
}

/// Direction of a symmetric cipher operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherDirection {
    Encrypt,
    Decrypt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_from_name() {
        assert_eq!(HashAlgId::from_name("SHA-1"), Some(HashAlgId::Sha1));
        assert_eq!(HashAlgId::from_name("sha256"), Some(HashAlgId::Sha256));
        assert_eq!(HashAlgId::from_name("RIPEMD160"), Some(HashAlgId::Ripemd160));
        assert_eq!(HashAlgId::from_name("whirlpool"), None);
    }

    #[test]
    fn test_block_sizes() {
        assert_eq!(HashAlgId::Sha1.block_size(), 64);
        assert_eq!(HashAlgId::Sha512.block_size(), 128);
        assert_eq!(CipherAlgId::DesEde3Cbc.block_size(), 8);
        assert!(!CipherAlgId::Rc4.needs_iv());
    }
}
