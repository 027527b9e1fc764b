#![no_main]
use derkit_pki::pkcs12::{KeyStore, LoadOptions};
use derkit_pki::PkiContext;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(ctx) = PkiContext::shared() else {
        return;
    };
    let options = LoadOptions {
        verify_mac: false,
        max_iterations: 16,
    };
    if let Ok(store) = KeyStore::load_with(ctx, data, "", &options) {
        for alias in store.aliases() {
            let _ = store.get_certificate_chain(alias);
            let _ = store.get_key(alias, "");
        }
    }
});
