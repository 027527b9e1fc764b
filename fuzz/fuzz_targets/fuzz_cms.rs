#![no_main]
use derkit_pki::cms::ContentInfo;
use derkit_pki::PkiContext;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(ctx) = PkiContext::shared() else {
        return;
    };
    if let Ok(info) = ContentInfo::from_der_with(ctx, data) {
        let _ = info.data();
        if let Ok(encrypted) = info.encrypted_data() {
            let _ = encrypted.parameters();
        }
    }
});
