/// ASN.1 encoding and decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Asn1Error {
    // Framing errors
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),
    #[error("declared length {declared} does not match consumed length {consumed}")]
    SizeMismatch { declared: usize, consumed: usize },
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("nesting depth exceeds limit of {0}")]
    DepthExceeded(usize),

    // Schema errors
    #[error("no decoder registered for open type {0}")]
    UnknownOpenType(String),
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("value not set: {0}")]
    ValueNotSet(String),
    #[error("value is not a {0}")]
    TypeMismatch(&'static str),

    // Registry errors
    #[error("oid {oid} already registered by module {existing}, rejected for {module}")]
    OidConflict {
        oid: String,
        existing: String,
        module: String,
    },
    #[error("invalid object identifier: {0}")]
    InvalidOid(String),
}

impl Asn1Error {
    /// True for tag/length framing violations, declared-length mismatches and
    /// truncated input.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Asn1Error::MalformedEncoding(_)
                | Asn1Error::SizeMismatch { .. }
                | Asn1Error::UnexpectedEof
                | Asn1Error::DepthExceeded(_)
        )
    }

    /// Shorthand for [`Asn1Error::MalformedEncoding`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        Asn1Error::MalformedEncoding(msg.into())
    }
}

/// Cryptographic primitive errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid argument")]
    InvalidArg,
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid key")]
    InvalidKey,
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length")]
    InvalidIvLength,
    #[error("invalid padding")]
    InvalidPadding,
    #[error("input length is not a multiple of the block size")]
    InvalidInputLength,
    #[error("rsa: message representative out of range")]
    RsaOutOfRange,
    #[error("signature verification failed")]
    VerifyFail,
    #[error("random generation failed")]
    RandGenFail,
    #[error("kdf: iteration count must be positive")]
    KdfInvalidIterations,
}

/// Certificate and key model errors.
#[derive(Debug, thiserror::Error)]
pub enum PkiError {
    #[error("invalid certificate: {0}")]
    InvalidCert(String),
    #[error("wrong key type: expected {expected}, found {found}")]
    WrongKeyType { expected: &'static str, found: String },
    #[error("invalid key spec: {0}")]
    InvalidKeySpec(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("unrecognized critical extension: {0}")]
    UnrecognizedCriticalExtension(String),
    #[error("pem: {0}")]
    Pem(String),
    #[error("asn1 error: {0}")]
    Asn1(#[from] Asn1Error),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// PKCS#12 keystore errors.
#[derive(Debug, thiserror::Error)]
pub enum KeystoreError {
    #[error("keystore integrity check failed: wrong password or corrupted data")]
    IntegrityCheckFailed,
    #[error("decryption failed: wrong password or corrupted data")]
    DecryptionFailed,
    #[error("no entry for alias {0}")]
    UnknownAlias(String),
    #[error("alias {0} has no private key")]
    NotAKeyEntry(String),
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("invalid keystore structure: {0}")]
    InvalidStructure(String),
    #[error("asn1 error: {0}")]
    Asn1(#[from] Asn1Error),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("pki error: {0}")]
    Pki(#[from] PkiError),
}
