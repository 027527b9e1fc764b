#![no_main]
use derkit_pki::PkiContext;
use derkit_utils::asn1::{Reader, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(data);
    while !reader.is_empty() {
        let Ok((_, length)) = reader.read_header() else {
            break;
        };
        if reader.skip_contents(length).is_err() {
            break;
        }
    }

    let Ok(ctx) = PkiContext::shared() else {
        return;
    };
    if let Ok(value) = ctx.decode(Value::any, data) {
        let _ = ctx.codec().to_der(&value);
    }
});
