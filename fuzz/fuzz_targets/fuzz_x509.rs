#![no_main]
use derkit_pki::x509::Certificate;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(cert) = Certificate::from_der(data) {
        let _ = cert.to_der();
        let _ = cert.to_text();
        let _ = cert.public_key();
    }
});
