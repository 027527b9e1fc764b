//! Integration tests for derkit.
//! Cross-crate tests against certificates and keystores produced by OpenSSL.

#[cfg(test)]
mod tests {
    use derkit_pki::oid_mapping::STANDARD_MODULES;
    use derkit_pki::pkcs12::{KeyStore, LoadOptions};
    use derkit_pki::pkcs8::PrivateKey;
    use derkit_pki::x509::{
        Certificate, ExtensionValue, GeneralName, KeyUsage, ParseOptions, PublicKey,
    };
    use derkit_pki::{KeystoreError, PkiContext, PkiError};
    use derkit_utils::asn1::{DecoderConfig, StringKind, Template, Value};
    use derkit_utils::oid::{known, Oid, OidEntry, OidModule, OidRegistry};
    use std::sync::Arc;

    const RSA_CERT: &[u8] = include_bytes!("../fixtures/example-rsa.der");
    const RSA_PEM: &str = include_str!("../fixtures/example-rsa.pem");
    const DSA_CERT: &[u8] = include_bytes!("../fixtures/example-dsa.der");
    const CRITICAL_CERT: &[u8] = include_bytes!("../fixtures/unknown-critical.der");
    const LEGACY_P12: &[u8] = include_bytes!("../fixtures/legacy.p12");
    const MODERN_P12: &[u8] = include_bytes!("../fixtures/modern.p12");
    const NOMAC_P12: &[u8] = include_bytes!("../fixtures/nomac.p12");
    const TRUSTSTORE_P12: &[u8] = include_bytes!("../fixtures/truststore.p12");
    const DSA_P12: &[u8] = include_bytes!("../fixtures/dsa.p12");

    const PASSWORD: &str = "test1234";

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn oid(s: &str) -> Oid {
        s.parse().unwrap()
    }

    // -------------------------------------------------------
    // 1. RSA certificate: header fields
    // -------------------------------------------------------
    #[test]
    fn test_rsa_certificate_fields() {
        let cert = Certificate::from_der(RSA_CERT).unwrap();
        assert_eq!(cert.version(), 2);
        assert_eq!(
            cert.serial_number().to_str_radix(16),
            "780f90c27030c9750ef7c770192844aec6d864df"
        );
        assert_eq!(cert.subject_dn(), "CN=Example,O=Example Org,C=US");
        assert_eq!(cert.issuer_dn(), cert.subject_dn());
        assert_eq!(cert.subject().get("CN"), Some("Example"));
        assert!(cert.is_self_signed());
        assert_eq!(cert.not_before(), 1_792_258_938);
        assert_eq!(cert.not_after(), 2_107_618_938);
        assert!(cert.is_valid_at(1_800_000_000));
        assert!(!cert.is_valid_at(1_792_258_937));
        assert_eq!(
            cert.signature_algorithm().oid,
            known::SHA256_WITH_RSA_ENCRYPTION
        );
        assert_eq!(cert.signature().len(), 256);

        let key = cert.public_key().unwrap();
        assert_eq!(key.algorithm_name(), "RSA");
        assert_eq!(key.bits(), 2048);
        match key {
            PublicKey::Rsa(rsa) => assert_eq!(rsa.e().to_u64_digits(), vec![65537]),
            other => panic!("unexpected key {other:?}"),
        }
    }

    // -------------------------------------------------------
    // 2. Re-encoding reproduces the input exactly
    // -------------------------------------------------------
    #[test]
    fn test_certificate_der_reencode() {
        let cert = Certificate::from_der(RSA_CERT).unwrap();
        assert_eq!(cert.raw(), RSA_CERT);
        assert_eq!(cert.to_der().unwrap(), RSA_CERT);
        assert_eq!(&RSA_CERT[4..4 + cert.tbs_der().len()], cert.tbs_der());

        let ctx = PkiContext::shared().unwrap();
        assert_eq!(ctx.codec().to_der(cert.tree()).unwrap(), RSA_CERT);

        let dsa = Certificate::from_der(DSA_CERT).unwrap();
        assert_eq!(dsa.to_der().unwrap(), DSA_CERT);
    }

    // -------------------------------------------------------
    // 3. PEM input and output
    // -------------------------------------------------------
    #[test]
    fn test_certificate_pem() {
        let cert = Certificate::from_pem(RSA_PEM).unwrap();
        assert_eq!(cert.raw(), RSA_CERT);
        let pem = cert.to_pem();
        assert!(pem.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert_eq!(Certificate::from_pem(&pem).unwrap().raw(), RSA_CERT);
        assert!(matches!(
            Certificate::from_pem("no armor here"),
            Err(PkiError::Pem(_))
        ));
    }

    // -------------------------------------------------------
    // 4. Standard extensions
    // -------------------------------------------------------
    #[test]
    fn test_rsa_certificate_extensions() {
        let cert = Certificate::from_der(RSA_CERT).unwrap();
        assert!(cert.extensions().iter().all(|e| e.is_recognized()));

        let bc = cert.basic_constraints().unwrap();
        assert!(bc.is_ca);
        assert_eq!(bc.path_len_constraint, Some(0));
        assert!(cert.is_ca());
        assert!(cert
            .extension(&oid(known::BASIC_CONSTRAINTS))
            .unwrap()
            .is_critical());

        let ku = cert.key_usage().unwrap();
        assert!(ku.has(KeyUsage::DIGITAL_SIGNATURE));
        assert!(ku.has(KeyUsage::KEY_CERT_SIGN));
        assert!(ku.has(KeyUsage::CRL_SIGN));
        assert!(!ku.has(KeyUsage::KEY_ENCIPHERMENT));

        assert_eq!(
            cert.subject_alt_names(),
            &[
                GeneralName::DnsName("example.com".into()),
                GeneralName::DnsName("www.example.com".into()),
                GeneralName::Rfc822Name("admin@example.com".into()),
            ]
        );

        let ski = hex("d341a9bb73630576c6eb291d7e787d19adbbd584");
        assert_eq!(cert.subject_key_identifier(), Some(&ski[..]));
        match cert
            .extension(&oid(known::AUTHORITY_KEY_IDENTIFIER))
            .unwrap()
            .value()
        {
            ExtensionValue::AuthorityKeyIdentifier(aki) => {
                assert_eq!(aki.key_identifier.as_deref(), Some(&ski[..]));
            }
            other => panic!("unexpected {other:?}"),
        }

        match cert
            .extension(&oid(known::EXT_KEY_USAGE))
            .unwrap()
            .value()
        {
            ExtensionValue::ExtendedKeyUsage(purposes) => {
                let ids: Vec<String> = purposes.iter().map(|p| p.oid.to_dot_string()).collect();
                assert_eq!(ids, ["1.3.6.1.5.5.7.3.1", "1.3.6.1.5.5.7.3.2"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // -------------------------------------------------------
    // 5. Text dump
    // -------------------------------------------------------
    #[test]
    fn test_certificate_text() {
        let text = Certificate::from_der(RSA_CERT).unwrap().to_text();
        for line in [
            "Version: 3 (0x2)",
            "Signature Algorithm: sha256WithRSAEncryption",
            "Not After : Oct 14 17:42:18 2036 GMT",
            "CA:TRUE, pathlen:0",
            "Digital Signature, Certificate Sign, CRL Sign",
            "DNS:example.com, DNS:www.example.com, email:admin@example.com",
            "D3:41:A9:BB:73:63:05:76:C6:EB:29:1D:7E:78:7D:19:AD:BB:D5:84",
            "Exponent: 65537 (0x10001)",
        ] {
            assert!(text.contains(line), "missing {line:?} in\n{text}");
        }
    }

    // -------------------------------------------------------
    // 6. DSA certificate
    // -------------------------------------------------------
    #[test]
    fn test_dsa_certificate() {
        let cert = Certificate::from_der(DSA_CERT).unwrap();
        assert_eq!(cert.subject_dn(), "CN=DSA Example,O=Example Org,C=US");
        assert_eq!(cert.signature_algorithm().oid, known::DSA_WITH_SHA256);
        let key = cert.public_key().unwrap();
        assert_eq!(key.algorithm_name(), "DSA");
        assert_eq!(key.bits(), 2048);
        assert!(cert.to_text().contains("dsa_with_SHA256"));
    }

    // -------------------------------------------------------
    // 7. Signature checks
    // -------------------------------------------------------
    #[test]
    fn test_self_signatures_verify() {
        let rsa = Certificate::from_der(RSA_CERT).unwrap();
        assert!(rsa.verify_issued_by(&rsa).unwrap());
        let dsa = Certificate::from_der(DSA_CERT).unwrap();
        assert!(dsa.verify_issued_by(&dsa).unwrap());
        assert!(!dsa.verify_signature(&rsa.public_key().unwrap()).unwrap_or(false));
    }

    #[test]
    fn test_issued_certificate_verifies() {
        let ca = Certificate::from_der(RSA_CERT).unwrap();
        let leaf = Certificate::from_der(CRITICAL_CERT).unwrap();
        assert_eq!(leaf.issuer(), ca.subject());
        assert!(!leaf.is_self_signed());
        assert!(leaf.verify_issued_by(&ca).unwrap());
    }

    #[test]
    fn test_tampered_certificate_fails_verification() {
        let mut der = RSA_CERT.to_vec();
        let last = der.len() - 1;
        der[last] ^= 0x01;
        let cert = Certificate::from_der(&der).unwrap();
        assert!(!cert.verify_issued_by(&cert).unwrap());
    }

    // -------------------------------------------------------
    // 8. Unrecognized critical extensions
    // -------------------------------------------------------
    #[test]
    fn test_unknown_critical_tolerated_by_default() {
        let cert = Certificate::from_der(CRITICAL_CERT).unwrap();
        let critical = cert.extension(&oid("1.3.6.1.4.1.99999.1")).unwrap();
        assert!(critical.is_critical());
        assert!(!critical.is_recognized());
        assert_eq!(critical.value(), &ExtensionValue::Opaque);
        assert_eq!(critical.raw_value(), hex("0c0568656c6c6f"));

        let plain = cert.extension(&oid("1.3.6.1.4.1.99999.2")).unwrap();
        assert!(!plain.is_critical());
        assert_eq!(plain.value(), &ExtensionValue::Opaque);
    }

    #[test]
    fn test_unknown_critical_rejected_in_strict_mode() {
        let ctx = PkiContext::shared().unwrap();
        let err = Certificate::from_der_with(ctx, CRITICAL_CERT, &ParseOptions::strict())
            .unwrap_err();
        match err {
            PkiError::UnrecognizedCriticalExtension(id) => assert_eq!(id, "1.3.6.1.4.1.99999.1"),
            other => panic!("unexpected {other}"),
        }
        // strict mode has nothing to reject on a certificate it fully understands
        Certificate::from_der_with(ctx, RSA_CERT, &ParseOptions::strict()).unwrap();
    }

    fn utf8_text() -> Value {
        Value::string(StringKind::Utf8)
    }

    static TEST_MODULE: OidModule = OidModule {
        name: "test",
        entries: &[OidEntry::new("1.3.6.1.4.1.99999.1", "testExtension")
            .with_decoder(Template(utf8_text))],
    };

    #[test]
    fn test_registered_extension_decoder() {
        let registry = OidRegistry::builder()
            .modules(STANDARD_MODULES)
            .module(&TEST_MODULE)
            .build()
            .unwrap();
        let ctx = PkiContext::from_registry(Arc::new(registry), DecoderConfig::default());
        let cert = Certificate::from_der_with(&ctx, CRITICAL_CERT, &ParseOptions::strict()).unwrap();

        let ext = cert.extension(&oid("1.3.6.1.4.1.99999.1")).unwrap();
        assert!(ext.is_recognized());
        match ext.value() {
            ExtensionValue::Other(v) => assert_eq!(v.as_text().as_deref(), Some("hello")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(cert.to_text().contains("testExtension: critical"));
        assert!(cert.to_text().contains("hello"));
    }

    // -------------------------------------------------------
    // 9. PKCS#12 keystores
    // -------------------------------------------------------
    #[test]
    fn test_legacy_keystore() {
        let store = KeyStore::load(LEGACY_P12, PASSWORD).unwrap();
        assert_eq!(store.aliases(), ["mykey"]);
        assert!(store.is_key_entry("mykey"));
        assert!(!store.is_certificate_entry("mykey"));

        let cert = store.get_certificate("mykey").unwrap().unwrap();
        assert_eq!(cert.raw(), RSA_CERT);
        let chain = store.get_certificate_chain("mykey").unwrap();
        assert_eq!(chain.len(), 1);

        let key = store.get_key("mykey", PASSWORD).unwrap();
        assert_eq!(key.algorithm_name(), "RSA");
        assert!(key.public_matches(&cert.public_key().unwrap()));
    }

    #[test]
    fn test_modern_keystore() {
        let store = KeyStore::load(MODERN_P12, PASSWORD).unwrap();
        assert_eq!(store.aliases(), ["mykey"]);
        let cert = store.get_certificate("mykey").unwrap().unwrap();
        assert_eq!(cert.raw(), RSA_CERT);
        let key = store.get_key("mykey", PASSWORD).unwrap();
        assert!(key.as_rsa().is_ok());
        assert!(key.public_matches(&cert.public_key().unwrap()));
    }

    #[test]
    fn test_keystore_wrong_password() {
        for bytes in [LEGACY_P12, MODERN_P12, DSA_P12] {
            assert!(matches!(
                KeyStore::load(bytes, "wrong"),
                Err(KeystoreError::IntegrityCheckFailed)
            ));
        }
    }

    #[test]
    fn test_keystore_without_mac() {
        let store = KeyStore::load(NOMAC_P12, "wrong").unwrap();
        assert_eq!(store.aliases(), ["mykey"]);
        assert_eq!(
            store.get_certificate("mykey").unwrap().unwrap().raw(),
            RSA_CERT
        );
        assert!(matches!(
            store.get_key("mykey", "wrong"),
            Err(KeystoreError::DecryptionFailed)
        ));
        store.get_key("mykey", PASSWORD).unwrap();
    }

    #[test]
    fn test_mac_check_can_be_skipped() {
        let options = LoadOptions {
            verify_mac: false,
            ..LoadOptions::default()
        };
        let ctx = PkiContext::shared().unwrap();
        // the certificate safe is encrypted, so a wrong password still fails
        assert!(matches!(
            KeyStore::load_with(ctx, LEGACY_P12, "wrong", &options),
            Err(KeystoreError::DecryptionFailed)
        ));
        KeyStore::load_with(ctx, LEGACY_P12, PASSWORD, &options).unwrap();
    }

    #[test]
    fn test_truststore() {
        let store = KeyStore::load(TRUSTSTORE_P12, PASSWORD).unwrap();
        assert_eq!(store.aliases(), ["exampleca"]);
        assert!(store.is_certificate_entry("exampleca"));
        assert!(!store.is_key_entry("exampleca"));
        assert!(matches!(
            store.get_key("exampleca", PASSWORD),
            Err(KeystoreError::NotAKeyEntry(_))
        ));
        assert!(matches!(
            store.get_key("missing", PASSWORD),
            Err(KeystoreError::UnknownAlias(_))
        ));
        assert_eq!(store.certificates().len(), 1);
    }

    #[test]
    fn test_dsa_keystore() {
        let store = KeyStore::load(DSA_P12, PASSWORD).unwrap();
        assert_eq!(store.aliases(), ["dsakey"]);
        let cert = store.get_certificate("dsakey").unwrap().unwrap();
        assert_eq!(cert.raw(), DSA_CERT);
        let key = store.get_key("dsakey", PASSWORD).unwrap();
        assert!(matches!(key, PrivateKey::Dsa(_)));
        assert!(key.public_matches(&cert.public_key().unwrap()));
        assert!(key.as_rsa().is_err());
    }

    #[test]
    fn test_keystore_key_mismatch_across_stores() {
        let rsa = KeyStore::load(LEGACY_P12, PASSWORD).unwrap();
        let dsa = KeyStore::load(DSA_P12, PASSWORD).unwrap();
        let key = rsa.get_key("mykey", PASSWORD).unwrap();
        let dsa_cert = dsa.get_certificate("dsakey").unwrap().unwrap();
        assert!(!key.public_matches(&dsa_cert.public_key().unwrap()));
    }
}
