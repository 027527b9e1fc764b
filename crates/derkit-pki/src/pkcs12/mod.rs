//! PKCS#12 (PFX) keystores (RFC 7292).
//!
//! [`KeyStore::load`] walks the container once: it checks the password MAC,
//! decrypts each `encryptedData` safe, and routes every SafeBag into an alias
//! table. Private keys stay encrypted until [`KeyStore::get_key`].

mod mac;

use crate::cms::{ContentInfo, ContentType};
use crate::context::PkiContext;
use crate::encoding::{hex, oid_field, structure};
use crate::pkcs8::{EncryptedPrivateKeyInfo, PbeParameters, PrivateKey};
use crate::schema;
use crate::x509::{Certificate, ParseOptions};
use derkit_types::{KeystoreError, PkiError};
use derkit_utils::asn1::{Structure, Value};
use derkit_utils::oid::known;
use std::fmt;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Limits and switches for [`KeyStore::load_with`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Check the password MAC when the file carries one.
    pub verify_mac: bool,
    /// Largest MAC or PBE iteration count accepted from the file.
    pub max_iterations: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            verify_mac: true,
            max_iterations: 10_000_000,
        }
    }
}

#[derive(Clone)]
enum KeyMaterial {
    Shrouded(EncryptedPrivateKeyInfo),
    /// PrivateKeyInfo DER from an unencrypted keyBag.
    Plain(Zeroizing<Vec<u8>>),
}

/// How bags that belong together are matched.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BagGroup {
    LocalKeyId(Vec<u8>),
    FriendlyName(String),
    Index(usize),
}

/// The part of an entry a bag fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Certificate,
    Key,
}

#[derive(Default)]
struct BagAttributes {
    friendly_name: Option<String>,
    local_key_id: Option<Vec<u8>>,
}

#[derive(Clone)]
struct Entry {
    group: BagGroup,
    alias: String,
    certificate: Option<Certificate>,
    key: Option<KeyMaterial>,
}

/// A loaded PKCS#12 keystore.
#[derive(Clone)]
pub struct KeyStore {
    ctx: PkiContext,
    options: LoadOptions,
    entries: Vec<Entry>,
    /// Every certificate in the file, in bag order.
    certificates: Vec<Certificate>,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("aliases", &self.aliases())
            .field("certificates", &self.certificates.len())
            .finish()
    }
}

impl KeyStore {
    /// Load a keystore with the shared context and default options.
    pub fn load(bytes: &[u8], password: &str) -> Result<Self, KeystoreError> {
        Self::load_with(
            PkiContext::shared()?,
            bytes,
            password,
            &LoadOptions::default(),
        )
    }

    pub fn load_with(
        ctx: &PkiContext,
        bytes: &[u8],
        password: &str,
        options: &LoadOptions,
    ) -> Result<Self, KeystoreError> {
        let pfx = ctx.decode(schema::pfx, bytes)?;
        let pfx = structure(&pfx, "PFX")?;
        let version = pfx.require("version")?.as_u64();
        if version != Some(3) {
            return Err(KeystoreError::InvalidStructure(format!(
                "unsupported PFX version {version:?}"
            )));
        }

        let auth_safe = ContentInfo::from_value(pfx.require("authSafe")?)?;
        if auth_safe.content_type != ContentType::Data {
            return Err(KeystoreError::UnsupportedFeature(format!(
                "{} integrity mode",
                auth_safe.content_type
            )));
        }
        let auth_safe_der = auth_safe.data()?;

        match pfx.get("macData") {
            Some(mac_data) if options.verify_mac => {
                mac::verify(
                    structure(mac_data, "MacData")?,
                    password,
                    auth_safe_der,
                    options.max_iterations,
                )?;
                debug!("keystore MAC verified");
            }
            Some(_) => debug!("keystore MAC present but not checked"),
            None => debug!("keystore has no MAC"),
        }

        let mut store = KeyStore {
            ctx: ctx.clone(),
            options: options.clone(),
            entries: Vec::new(),
            certificates: Vec::new(),
        };
        let safes = ctx.decode(schema::authenticated_safe, auth_safe_der)?;
        let safes = safes.as_collection().ok_or_else(|| {
            KeystoreError::InvalidStructure("AuthenticatedSafe is not a sequence".into())
        })?;
        for (index, safe) in safes.iter().enumerate() {
            let info = ContentInfo::from_value(safe)?;
            debug!(index, content = %info.content_type, "reading safe");
            let contents = match info.content_type {
                ContentType::Data => ctx.decode(schema::safe_contents, info.data()?)?,
                ContentType::EncryptedData => {
                    let encrypted = info.encrypted_data()?;
                    store.check_iterations(&encrypted.parameters().map_err(pbe_error)?)?;
                    let plain = encrypted.decrypt(password).map_err(pbe_error)?;
                    ctx.decode(schema::safe_contents, &plain).map_err(|e| {
                        debug!(error = %e, "decrypted safe does not decode");
                        KeystoreError::DecryptionFailed
                    })?
                }
                other => {
                    return Err(KeystoreError::UnsupportedFeature(format!(
                        "{other} safe contents"
                    )))
                }
            };
            store.add_safe_contents(&contents)?;
        }
        store.assign_aliases();
        debug!(
            entries = store.entries.len(),
            certificates = store.certificates.len(),
            "keystore loaded"
        );
        Ok(store)
    }

    fn check_iterations(&self, params: &PbeParameters) -> Result<(), KeystoreError> {
        if params.iterations() == 0 || params.iterations() > self.options.max_iterations {
            return Err(KeystoreError::InvalidStructure(format!(
                "PBE iteration count {} out of range",
                params.iterations()
            )));
        }
        Ok(())
    }

    fn add_safe_contents(&mut self, contents: &Value) -> Result<(), KeystoreError> {
        let bags = contents.as_collection().ok_or_else(|| {
            KeystoreError::InvalidStructure("SafeContents is not a sequence".into())
        })?;
        for bag in bags.iter() {
            self.add_bag(structure(bag, "SafeBag")?)?;
        }
        Ok(())
    }

    fn add_bag(&mut self, bag: &Structure) -> Result<(), KeystoreError> {
        let bag_id = oid_field(bag, "bagId")?;
        let attributes = bag_attributes(bag)?;
        let value = bag.require("bagValue")?;
        match bag_id.to_dot_string().as_str() {
            known::CERT_BAG => {
                let cert_bag = structure(value, "CertBag")?;
                let cert_id = oid_field(cert_bag, "certId")?;
                if cert_id.to_dot_string() != known::X509_CERTIFICATE {
                    warn!(cert_type = %cert_id, "skipping non-X.509 certificate bag");
                    return Ok(());
                }
                let der = cert_bag.require("certValue")?.as_octets().ok_or_else(|| {
                    KeystoreError::InvalidStructure("certificate bag without octets".into())
                })?;
                let cert = Certificate::from_der_with(&self.ctx, der, &ParseOptions::default())?;
                debug!(subject = %cert.subject(), "certificate bag");
                self.certificates.push(cert.clone());
                let entry = self.entry_for(attributes, Slot::Certificate);
                if entry.certificate.is_none() {
                    entry.certificate = Some(cert);
                }
            }
            known::PKCS8_SHROUDED_KEY_BAG => {
                let key = EncryptedPrivateKeyInfo::from_value(value)?;
                debug!(algorithm = %key.algorithm.oid, "shrouded key bag");
                self.add_key(attributes, KeyMaterial::Shrouded(key));
            }
            known::KEY_BAG => {
                debug!("plain key bag");
                let der = Zeroizing::new(self.ctx.codec().to_der(value.inner())?);
                self.add_key(attributes, KeyMaterial::Plain(der));
            }
            known::SAFE_CONTENTS_BAG => {
                debug!("nested safe contents bag");
                self.add_safe_contents(value)?;
            }
            other => debug!(bag = other, "skipping bag"),
        }
        Ok(())
    }

    fn add_key(&mut self, attributes: BagAttributes, key: KeyMaterial) {
        let entry = self.entry_for(attributes, Slot::Key);
        if entry.key.is_some() {
            warn!(alias = %entry.alias, "second private key for the same entry ignored");
        } else {
            entry.key = Some(key);
        }
    }

    /// Find the entry a bag belongs to: same localKeyId first, then an entry
    /// with the same friendlyName whose `slot` is still empty.
    fn entry_for(&mut self, attributes: BagAttributes, slot: Slot) -> &mut Entry {
        let group = match (&attributes.local_key_id, &attributes.friendly_name) {
            (Some(id), _) => BagGroup::LocalKeyId(id.clone()),
            (None, Some(name)) => BagGroup::FriendlyName(name.clone()),
            (None, None) => BagGroup::Index(self.entries.len()),
        };
        let by_group = self.entries.iter().position(|e| e.group == group);
        let by_name = || {
            let name = attributes.friendly_name.as_deref()?;
            self.entries.iter().position(|e| {
                e.alias == name
                    && match slot {
                        Slot::Certificate => e.certificate.is_none(),
                        Slot::Key => e.key.is_none(),
                    }
            })
        };
        let position = match by_group.or_else(by_name) {
            Some(position) => {
                // a name match adopts the localKeyId so later bags join too
                if let BagGroup::LocalKeyId(_) = group {
                    if !matches!(self.entries[position].group, BagGroup::LocalKeyId(_)) {
                        self.entries[position].group = group;
                    }
                }
                position
            }
            None => {
                self.entries.push(Entry {
                    group,
                    alias: String::new(),
                    certificate: None,
                    key: None,
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[position];
        if let Some(name) = attributes.friendly_name {
            entry.alias = name;
        }
        entry
    }

    /// Fill in aliases: friendlyName, else hex of the localKeyId, else the
    /// entry index. Later entries reusing an alias are dropped.
    fn assign_aliases(&mut self) {
        let mut kept: Vec<Entry> = Vec::with_capacity(self.entries.len());
        for mut entry in std::mem::take(&mut self.entries) {
            if entry.alias.is_empty() {
                entry.alias = match &entry.group {
                    BagGroup::LocalKeyId(id) => hex(id),
                    BagGroup::FriendlyName(name) => name.clone(),
                    BagGroup::Index(index) => index.to_string(),
                };
            }
            if kept.iter().any(|e| e.alias == entry.alias) {
                warn!(alias = %entry.alias, "duplicate alias, keeping the first entry");
                continue;
            }
            kept.push(entry);
        }
        self.entries = kept;
    }

    fn entry(&self, alias: &str) -> Result<&Entry, KeystoreError> {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .ok_or_else(|| KeystoreError::UnknownAlias(alias.to_string()))
    }

    /// Aliases in the order their entries first appear.
    pub fn aliases(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.alias.as_str()).collect()
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entry(alias).is_ok()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_key_entry(&self, alias: &str) -> bool {
        self.entry(alias).is_ok_and(|e| e.key.is_some())
    }

    /// True for a trusted-certificate entry: a certificate with no key.
    pub fn is_certificate_entry(&self, alias: &str) -> bool {
        self.entry(alias)
            .is_ok_and(|e| e.key.is_none() && e.certificate.is_some())
    }

    pub fn get_certificate(&self, alias: &str) -> Result<Option<&Certificate>, KeystoreError> {
        Ok(self.entry(alias)?.certificate.as_ref())
    }

    /// The entry certificate followed by its issuers, as far as the store
    /// holds them.
    pub fn get_certificate_chain(&self, alias: &str) -> Result<Vec<&Certificate>, KeystoreError> {
        let Some(leaf) = self.entry(alias)?.certificate.as_ref() else {
            return Ok(Vec::new());
        };
        let mut chain = vec![leaf];
        let mut current = leaf;
        while !current.is_self_signed() && chain.len() <= self.certificates.len() {
            let issuer = self.certificates.iter().find(|c| {
                c.subject() == current.issuer() && !chain.iter().any(|seen| seen.raw() == c.raw())
            });
            match issuer {
                Some(issuer) => {
                    chain.push(issuer);
                    current = issuer;
                }
                None => break,
            }
        }
        Ok(chain)
    }

    /// Decrypt and parse the private key stored under `alias`.
    pub fn get_key(&self, alias: &str, password: &str) -> Result<PrivateKey, KeystoreError> {
        let entry = self.entry(alias)?;
        let key = entry
            .key
            .as_ref()
            .ok_or_else(|| KeystoreError::NotAKeyEntry(alias.to_string()))?;
        let der = match key {
            KeyMaterial::Plain(der) => der.clone(),
            KeyMaterial::Shrouded(info) => {
                self.check_iterations(&info.parameters().map_err(pbe_error)?)?;
                info.decrypt(&self.ctx, password).map_err(pbe_error)?
            }
        };
        Ok(PrivateKey::from_der_with(&self.ctx, &der)?)
    }

    /// Every certificate in the store, in file order.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }
}

/// Password-based decryption failures all look alike to the caller.
fn pbe_error(err: PkiError) -> KeystoreError {
    match err {
        PkiError::UnsupportedAlgorithm(alg) => KeystoreError::UnsupportedFeature(alg),
        other => {
            debug!(error = %other, "decryption failed");
            KeystoreError::DecryptionFailed
        }
    }
}

fn bag_attributes(bag: &Structure) -> Result<BagAttributes, KeystoreError> {
    let mut attributes = BagAttributes::default();
    let Some(list) = bag.get("bagAttributes").and_then(Value::as_collection) else {
        return Ok(attributes);
    };
    for attribute in list.iter() {
        let attribute = structure(attribute, "Attribute")?;
        let id = oid_field(attribute, "attrId")?;
        let first = attribute
            .require("attrValues")?
            .as_collection()
            .and_then(|values| values.iter().next());
        match id.to_dot_string().as_str() {
            known::FRIENDLY_NAME => attributes.friendly_name = first.and_then(Value::as_text),
            known::LOCAL_KEY_ID => {
                attributes.local_key_id = first.and_then(Value::as_octets).map(<[u8]>::to_vec)
            }
            _ => {}
        }
    }
    Ok(attributes)
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

    // Password "secret", SHA-1 MAC over 3 iterations. A data safe holds a
    // keyBag ("plain", localKeyId 01) and a shrouded key (localKeyId 02, no
    // name); a 3DES encryptedData safe holds a keyBag named "inner". All keys
    // are the toy DSA key p = 283, q = 47, g = 64, x = 24.
    const STORE: &str = "308201ce0201033082019906092a864886f70d010701a082018a048201863082\
        01823081e306092a864886f70d010701a081d50481d23081cf305f060b2a864886f70d010c0a0101a021301f\
        020100301506072a8648ce380401300a0202011b02012f0201400403020118312d301006092a864886f70d01\
        09153103040101301906092a864886f70d010914310c1e0a0070006c00610069006e306c060b2a864886f70d\
        010c0a0102a0493047301b060a2a864886f70d010c0103300d04080102030405060708020103042\
        89cb51c085061cc5c191319b1012bc7cc008b448d0abca811568bd9f0ef03cdd1faa3e597de4bd3c6311230\
        1006092a864886f70d010915310304010230819906092a864886f70d010706a0818b30818802010030818206\
        092a864886f70d010701301b060a2a864886f70d010c0103300d040801020304050607080201038058b74b8f\
        f2e8970c3761a4d7f405a8ca72080a1427374c0e01061912166f39b8db0a817b470932fd1c859f5b6f0c9e62\
        fa23bbe11b0575424749b9ab2eb7d93c7fb1bfcdfb565cbdb73cf0321a325575acaffe7c14b57c2fd2302c30\
        21300906052b0e03021a0500041470445d346caefc7eac5530f918e210c350b5e69304040a0b0c0d020103";
    const MAC_OFFSET: usize = 437;

    // A store whose only safe is envelopedData.
    const ENVELOPED: &str =
        "302a020103302506092a864886f70d010701a01804163014301206092a864886f70d010703a0053003020100";

    #[test]
    fn test_load_and_aliases() {
        let store = KeyStore::load(&hex(STORE), "secret").unwrap();
        assert_eq!(store.aliases(), ["plain", "02", "inner"]);
        assert_eq!(store.len(), 3);
        assert!(store.is_key_entry("02"));
        assert!(!store.is_certificate_entry("plain"));
        assert!(store.certificates().is_empty());
        assert!(store.get_certificate("plain").unwrap().is_none());
        assert!(store.get_certificate_chain("plain").unwrap().is_empty());
    }

    #[test]
    fn test_pairs_by_friendly_name_without_key_id() {
        // certBag {friendlyName "mykey"} then keyBag {friendlyName "mykey", localKeyId 01}
        let safe = hex("308201233081bf060b2a864886f70d010c0a0103a0819230818f060a2a864886f70d01\
            091601a08180047e307c3067020101300d06092a864886f70d01010b05003010310e300c06035504030c\
            056f776e65723020170d3236303130313030303030305a180f32303336303130313030303030305a3010\
            310e300c06035504030c056f776e6572300d300506032b6570030400010203300d06092a864886f70d01\
            010b0500030200aa311b301906092a864886f70d010914310c1e0a006d0079006b00650079305f060b2a\
            864886f70d010c0a0101a021301f020100301506072a8648ce380401300a0202011b02012f0201400403\
            020118312d301906092a864886f70d010914310c1e0a006d0079006b00650079301006092a864886f70d\
            0109153103040101");
        let ctx = PkiContext::shared().unwrap();
        let mut store = KeyStore {
            ctx: ctx.clone(),
            options: LoadOptions::default(),
            entries: Vec::new(),
            certificates: Vec::new(),
        };
        let contents = ctx.decode(schema::safe_contents, &safe).unwrap();
        store.add_safe_contents(&contents).unwrap();
        store.assign_aliases();
        assert_eq!(store.aliases(), ["mykey"]);
        assert!(store.is_key_entry("mykey"));
        assert!(store.get_certificate("mykey").unwrap().is_some());
        assert!(store.get_key("mykey", "").is_ok());
    }

    #[test]
    fn test_get_keys() {
        let store = KeyStore::load(&hex(STORE), "secret").unwrap();
        for alias in ["plain", "02", "inner"] {
            let key = store.get_key(alias, "secret").unwrap();
            assert_eq!(key.as_dsa().unwrap().x_bytes(), &[24]);
        }
        // plain key bags need no password
        assert!(store.get_key("plain", "").is_ok());
        assert!(matches!(
            store.get_key("02", "wrong"),
            Err(KeystoreError::DecryptionFailed)
        ));
        assert!(matches!(
            store.get_key("missing", "secret"),
            Err(KeystoreError::UnknownAlias(_))
        ));
    }

    #[test]
    fn test_integrity() {
        assert!(matches!(
            KeyStore::load(&hex(STORE), "wrong"),
            Err(KeystoreError::IntegrityCheckFailed)
        ));
        let mut tampered = hex(STORE);
        tampered[MAC_OFFSET] ^= 1;
        assert!(matches!(
            KeyStore::load(&tampered, "secret"),
            Err(KeystoreError::IntegrityCheckFailed)
        ));
    }

    #[test]
    fn test_load_options() {
        let ctx = PkiContext::shared().unwrap();
        let unchecked = LoadOptions {
            verify_mac: false,
            ..LoadOptions::default()
        };
        assert!(matches!(
            KeyStore::load_with(ctx, &hex(STORE), "wrong", &unchecked),
            Err(KeystoreError::DecryptionFailed)
        ));
        let tight = LoadOptions {
            max_iterations: 2,
            ..LoadOptions::default()
        };
        assert!(matches!(
            KeyStore::load_with(ctx, &hex(STORE), "secret", &tight),
            Err(KeystoreError::InvalidStructure(_))
        ));
    }

    #[test]
    fn test_unsupported_safe() {
        assert!(matches!(
            KeyStore::load(&hex(ENVELOPED), "secret"),
            Err(KeystoreError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_garbage_input() {
        assert!(KeyStore::load(&[0x30, 0x03, 0x02, 0x01], "secret").is_err());
        assert!(KeyStore::load(&[], "secret").is_err());
    }
}
