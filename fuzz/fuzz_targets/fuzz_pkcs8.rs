#![no_main]
use derkit_pki::pkcs8::{EncryptedPrivateKeyInfo, PrivateKey};
use derkit_pki::PkiContext;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = PrivateKey::from_der(data);
    let Ok(ctx) = PkiContext::shared() else {
        return;
    };
    if let Ok(info) = EncryptedPrivateKeyInfo::from_der_with(ctx, data) {
        let _ = info.parameters();
    }
});
