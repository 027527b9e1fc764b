//! OID registry: dotted OID → display name, short name and open-type decoder.

use super::Oid;
use crate::asn1::Template;
use derkit_types::Asn1Error;
use std::collections::HashMap;
use tracing::debug;

/// One registry row, declared statically in an [`OidModule`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OidEntry {
    pub oid: &'static str,
    pub name: &'static str,
    pub short_name: Option<&'static str>,
    pub decoder: Option<Template>,
}

impl OidEntry {
    pub const fn new(oid: &'static str, name: &'static str) -> Self {
        Self {
            oid,
            name,
            short_name: None,
            decoder: None,
        }
    }

    pub const fn with_short_name(mut self, short_name: &'static str) -> Self {
        self.short_name = Some(short_name);
        self
    }

    pub const fn with_decoder(mut self, decoder: Template) -> Self {
        self.decoder = Some(decoder);
        self
    }

    fn same_as(&self, other: &OidEntry) -> bool {
        self.name == other.name
            && self.short_name == other.short_name
            && self.decoder.is_some() == other.decoder.is_some()
    }
}

/// A named namespace of entries registered together (X.509, PKCS#7, ...).
#[derive(Debug)]
pub struct OidModule {
    pub name: &'static str,
    pub entries: &'static [OidEntry],
}

#[derive(Debug, Clone, Copy)]
struct Registered {
    module: &'static str,
    entry: OidEntry,
}

/// Table of known OIDs.
///
/// Built once, then shared read-only (typically behind an `Arc`) by every
/// codec that needs open-type resolution.
#[derive(Debug, Default)]
pub struct OidRegistry {
    entries: HashMap<String, Registered>,
}

impl OidRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder that loads modules in order.
    pub fn builder() -> OidRegistryBuilder {
        OidRegistryBuilder::default()
    }

    /// Register one OID under `module`.
    ///
    /// Registering an identical entry again from the same module is a no-op;
    /// any other collision is an [`Asn1Error::OidConflict`].
    pub fn register(&mut self, module: &'static str, entry: OidEntry) -> Result<(), Asn1Error> {
        let key = entry.oid.parse::<Oid>()?.to_dot_string();
        if let Some(existing) = self.entries.get(&key) {
            if existing.module == module && existing.entry.same_as(&entry) {
                return Ok(());
            }
            return Err(Asn1Error::OidConflict {
                oid: key,
                existing: existing.module.to_string(),
                module: module.to_string(),
            });
        }
        self.entries.insert(key, Registered { module, entry });
        Ok(())
    }

    /// Register every entry of a module table.
    pub fn register_module(&mut self, module: &OidModule) -> Result<(), Asn1Error> {
        for entry in module.entries {
            self.register(module.name, *entry)?;
        }
        debug!(
            module = module.name,
            entries = module.entries.len(),
            "registered oid module"
        );
        Ok(())
    }

    fn get(&self, oid: &Oid) -> Option<&Registered> {
        self.entries.get(&oid.to_dot_string())
    }

    pub fn lookup_name(&self, oid: &Oid) -> Option<&'static str> {
        self.get(oid).map(|r| r.entry.name)
    }

    pub fn lookup_short_name(&self, oid: &Oid) -> Option<&'static str> {
        self.get(oid).and_then(|r| r.entry.short_name)
    }

    /// The decoder template for an open type governed by `oid`.
    pub fn resolve_decoder(&self, oid: &Oid) -> Option<Template> {
        self.get(oid).and_then(|r| r.entry.decoder)
    }

    /// Which module registered `oid`.
    pub fn module_of(&self, oid: &Oid) -> Option<&'static str> {
        self.get(oid).map(|r| r.module)
    }

    /// Short name if present, else long name, else the dotted form.
    pub fn display_name(&self, oid: &Oid) -> String {
        self.lookup_short_name(oid)
            .or_else(|| self.lookup_name(oid))
            .map_or_else(|| oid.to_dot_string(), str::to_string)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for `OidRegistry`.
#[derive(Debug, Default)]
pub struct OidRegistryBuilder {
    modules: Vec<&'static OidModule>,
}

impl OidRegistryBuilder {
    pub fn module(mut self, module: &'static OidModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn modules(mut self, modules: &[&'static OidModule]) -> Self {
        self.modules.extend_from_slice(modules);
        self
    }

    pub fn build(self) -> Result<OidRegistry, Asn1Error> {
        let mut registry = OidRegistry::new();
        for module in self.modules {
            registry.register_module(module)?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn1::Value;

    static ATTRS: OidModule = OidModule {
        name: "attrs",
        entries: &[
            OidEntry::new("2.5.4.3", "commonName").with_short_name("CN"),
            OidEntry::new("2.5.4.6", "countryName").with_short_name("C"),
        ],
    };

    static CLASHING: OidModule = OidModule {
        name: "clashing",
        entries: &[OidEntry::new("2.5.4.3", "cn")],
    };

    static DECODERS: OidModule = OidModule {
        name: "decoders",
        entries: &[OidEntry::new("1.2.840.113549.1.9.21", "localKeyId")
            .with_decoder(Template(Value::octet_string))],
    };

    #[test]
    fn test_lookup() {
        let registry = OidRegistry::builder()
            .modules(&[&ATTRS, &DECODERS])
            .build()
            .unwrap();
        let cn: Oid = "2.5.4.3".parse().unwrap();
        assert_eq!(registry.lookup_name(&cn), Some("commonName"));
        assert_eq!(registry.lookup_short_name(&cn), Some("CN"));
        assert_eq!(registry.module_of(&cn), Some("attrs"));
        assert!(registry.resolve_decoder(&cn).is_none());

        let key_id: Oid = "1.2.840.113549.1.9.21".parse().unwrap();
        assert_eq!(registry.lookup_short_name(&key_id), None);
        let template = registry.resolve_decoder(&key_id).unwrap();
        assert_eq!(template.instantiate(), Value::octet_string());
    }

    #[test]
    fn test_unknown_oid() {
        let registry = OidRegistry::builder().module(&ATTRS).build().unwrap();
        let oid: Oid = "1.3.6.1.4.1.99999.1".parse().unwrap();
        assert!(registry.lookup_name(&oid).is_none());
        assert_eq!(registry.display_name(&oid), "1.3.6.1.4.1.99999.1");
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let mut registry = OidRegistry::new();
        registry.register_module(&ATTRS).unwrap();
        registry.register_module(&ATTRS).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_conflict() {
        let err = OidRegistry::builder()
            .modules(&[&ATTRS, &CLASHING])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            Asn1Error::OidConflict {
                oid: "2.5.4.3".into(),
                existing: "attrs".into(),
                module: "clashing".into(),
            }
        );
    }

    #[test]
    fn test_invalid_oid_rejected() {
        let mut registry = OidRegistry::new();
        assert!(matches!(
            registry.register("bad", OidEntry::new("1.2.x", "bad")),
            Err(Asn1Error::InvalidOid(_))
        ));
    }
}
