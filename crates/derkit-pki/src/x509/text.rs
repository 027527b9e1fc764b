//! Human-readable text output for certificates and extensions.
//!
//! Provides `to_text()` output similar to `openssl x509 -text`, and `Display`
//! for extension values so every extension renders, decoded or not.

use super::{
    AuthorityKeyIdentifier, Certificate, Extension, ExtensionValue, GeneralName, PolicyInformation,
    PublicKey,
};
use crate::encoding::hex_colon;
use derkit_utils::asn1::{format_generalized_time, Value};
use derkit_utils::oid::Oid;
use std::fmt;

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn hex_dump(data: &[u8], indent: usize) -> String {
    let prefix = " ".repeat(indent);
    data.chunks(15)
        .map(|chunk| {
            let hex = chunk
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect::<Vec<_>>()
                .join(":");
            format!("{prefix}{hex}")
        })
        .collect::<Vec<_>>()
        .join(":\n")
}

/// "Jan  1 00:00:00 2026 GMT", from the GeneralizedTime form.
fn format_time(unix_ts: i64) -> String {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let g = format_generalized_time(unix_ts);
    let field = |range: std::ops::Range<usize>| g.get(range).unwrap_or("??");
    let month = field(4..6)
        .parse::<usize>()
        .ok()
        .and_then(|m| MONTHS.get(m.wrapping_sub(1)))
        .copied()
        .unwrap_or("???");
    let day = field(6..8).trim_start_matches('0');
    format!(
        "{month} {day:>2} {}:{}:{} {} GMT",
        field(8..10),
        field(10..12),
        field(12..14),
        field(0..4)
    )
}

fn format_ip(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => bytes
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join("."),
        16 => bytes
            .chunks(2)
            .map(|pair| format!("{:X}", u16::from_be_bytes([pair[0], pair[1]])))
            .collect::<Vec<_>>()
            .join(":"),
        _ => format!("<invalid {}>", hex_colon(bytes)),
    }
}

/// Best-effort rendering of a decoded tree with no typed view.
pub(crate) fn render_value(value: &Value) -> String {
    let value = value.inner();
    if let Some(text) = value.as_text() {
        return text;
    }
    if let Some(b) = value.as_bool() {
        return if b { "TRUE" } else { "FALSE" }.to_string();
    }
    if let Some(i) = value.as_integer() {
        return i.to_string();
    }
    if let Some(oid) = value.as_oid() {
        return oid.to_string();
    }
    if let Some(bytes) = value.as_octets().or_else(|| value.as_any()) {
        return hex_colon(bytes);
    }
    if let Some(bits) = value.as_bit_string() {
        return hex_colon(&bits.bytes);
    }
    if let Some(s) = value.as_structure() {
        return s
            .components()
            .iter()
            .filter(|c| s.is_component_set(c.name))
            .map(|c| format!("{}: {}", c.name, render_value(&c.value)))
            .collect::<Vec<_>>()
            .join(", ");
    }
    if let Some(list) = value.as_collection() {
        return list
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", ");
    }
    match value {
        Value::Null(true) => "NULL".to_string(),
        _ => "<unset>".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Display impls
// ---------------------------------------------------------------------------

impl fmt::Display for GeneralName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneralName::OtherName { type_id, .. } => write!(f, "othername:{type_id}"),
            GeneralName::Rfc822Name(s) => write!(f, "email:{s}"),
            GeneralName::DnsName(s) => write!(f, "DNS:{s}"),
            GeneralName::DirectoryName(dn) => write!(f, "DirName:{dn}"),
            GeneralName::Uri(s) => write!(f, "URI:{s}"),
            GeneralName::IpAddress(ip) => write!(f, "IP Address:{}", format_ip(ip)),
            GeneralName::RegisteredId(oid) => write!(f, "Registered ID:{oid}"),
        }
    }
}

fn join_names(names: &[GeneralName]) -> String {
    names
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_aki(aki: &AuthorityKeyIdentifier) -> String {
    let mut parts = Vec::new();
    if let Some(id) = &aki.key_identifier {
        parts.push(hex_colon(id));
    }
    if !aki.authority_cert_issuer.is_empty() {
        parts.push(join_names(&aki.authority_cert_issuer));
    }
    if let Some(serial) = &aki.authority_cert_serial_number {
        parts.push(format!("serial:{}", hex_colon(&serial.to_bytes_be().1)));
    }
    parts.join(", ")
}

fn format_policies(policies: &[PolicyInformation]) -> String {
    let mut lines = Vec::new();
    for policy in policies {
        lines.push(format!("Policy: {}", policy.policy_identifier));
        for q in &policy.qualifiers {
            match &q.text {
                Some(text) => lines.push(format!("  {}: {text}", q.qualifier_id)),
                None => lines.push(format!("  {}: {}", q.qualifier_id, hex_colon(&q.qualifier))),
            }
        }
    }
    lines.join("\n")
}

impl fmt::Display for ExtensionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionValue::BasicConstraints(bc) => {
                write!(f, "CA:{}", if bc.is_ca { "TRUE" } else { "FALSE" })?;
                if let Some(len) = bc.path_len_constraint {
                    write!(f, ", pathlen:{len}")?;
                }
                Ok(())
            }
            ExtensionValue::KeyUsage(ku) => {
                let names = ku.names();
                if names.is_empty() {
                    f.write_str("(none)")
                } else {
                    f.write_str(&names.join(", "))
                }
            }
            ExtensionValue::ExtendedKeyUsage(purposes) => f.write_str(
                &purposes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            ExtensionValue::SubjectAltName(names) | ExtensionValue::IssuerAltName(names) => {
                f.write_str(&join_names(names))
            }
            ExtensionValue::SubjectKeyIdentifier(id) => f.write_str(&hex_colon(id)),
            ExtensionValue::AuthorityKeyIdentifier(aki) => f.write_str(&format_aki(aki)),
            ExtensionValue::CertificatePolicies(policies) => {
                f.write_str(&format_policies(policies))
            }
            ExtensionValue::Other(value) => f.write_str(&render_value(value)),
            ExtensionValue::Opaque => f.write_str("<unsupported>"),
            ExtensionValue::Undecodable(reason) => write!(f, "<undecodable: {reason}>"),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name)?,
            None => write!(f, "{}", self.oid())?,
        }
        if self.is_critical() {
            f.write_str(" (critical)")?;
        }
        if self.is_recognized() {
            write!(f, ": {}", self.value())
        } else {
            write!(f, ": {} {}", self.value(), hex_colon(self.raw_value()))
        }
    }
}

// ---------------------------------------------------------------------------
// Certificate::to_text()
// ---------------------------------------------------------------------------

impl Certificate {
    fn oid_name(&self, oid: &Oid) -> String {
        self.registry()
            .lookup_name(oid)
            .map_or_else(|| oid.to_dot_string(), str::to_string)
    }

    fn format_public_key(&self, out: &mut String) {
        let spki = self.subject_public_key_info();
        out.push_str(&format!(
            "            Public Key Algorithm: {}\n",
            self.oid_name(&spki.algorithm.oid)
        ));
        match self.public_key() {
            Ok(PublicKey::Rsa(key)) => {
                out.push_str(&format!(
                    "                Public-Key: ({} bit)\n",
                    key.bits()
                ));
                let mut modulus = key.n().to_bytes_be();
                if modulus.first().is_some_and(|b| b & 0x80 != 0) {
                    modulus.insert(0, 0);
                }
                out.push_str("                Modulus:\n");
                out.push_str(&hex_dump(&modulus, 20));
                out.push('\n');
                out.push_str(&format!(
                    "                Exponent: {} (0x{:x})\n",
                    key.e(),
                    key.e()
                ));
            }
            Ok(PublicKey::Dsa(key)) => {
                out.push_str(&format!(
                    "                Public-Key: ({} bit)\n",
                    key.params().p().bits()
                ));
                for (label, value) in [
                    ("pub", key.y()),
                    ("P", key.params().p()),
                    ("Q", key.params().q()),
                    ("G", key.params().g()),
                ] {
                    out.push_str(&format!("                {label}:\n"));
                    out.push_str(&hex_dump(&value.to_bytes_be(), 20));
                    out.push('\n');
                }
            }
            Ok(PublicKey::Other { key, .. }) => {
                out.push_str("                pub:\n");
                out.push_str(&hex_dump(&key, 20));
                out.push('\n');
            }
            Err(e) => out.push_str(&format!("                <unreadable key: {e}>\n")),
        }
    }

    /// Produce human-readable text output similar to `openssl x509 -text`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Certificate:\n");
        out.push_str("    Data:\n");
        out.push_str(&format!(
            "        Version: {} (0x{:x})\n",
            self.version() + 1,
            self.version()
        ));
        let (_, serial) = self.serial_number().to_bytes_be();
        out.push_str("        Serial Number:\n");
        out.push_str(&format!(
            "            {}\n",
            hex_colon(&serial).to_lowercase()
        ));
        let sig_alg = self.oid_name(&self.signature_algorithm().oid);
        out.push_str(&format!("        Signature Algorithm: {sig_alg}\n"));
        out.push_str(&format!("        Issuer: {}\n", self.issuer()));
        out.push_str("        Validity\n");
        out.push_str(&format!(
            "            Not Before: {}\n",
            format_time(self.not_before())
        ));
        out.push_str(&format!(
            "            Not After : {}\n",
            format_time(self.not_after())
        ));
        out.push_str(&format!("        Subject: {}\n", self.subject()));
        out.push_str("        Subject Public Key Info:\n");
        self.format_public_key(&mut out);

        if !self.extensions().is_empty() {
            out.push_str("        X509v3 extensions:\n");
            for ext in self.extensions() {
                let name = self.oid_name(ext.oid());
                let crit = if ext.is_critical() { " critical" } else { "" };
                out.push_str(&format!("            {name}:{crit}\n"));
                let body = if ext.is_recognized() {
                    ext.value().to_string()
                } else {
                    hex_colon(ext.raw_value())
                };
                for line in body.lines() {
                    out.push_str(&format!("                {line}\n"));
                }
            }
        }

        out.push_str(&format!("    Signature Algorithm: {sig_alg}\n"));
        out.push_str("    Signature Value:\n");
        out.push_str(&hex_dump(self.signature(), 8));
        out.push('\n');
        out
    }
}
