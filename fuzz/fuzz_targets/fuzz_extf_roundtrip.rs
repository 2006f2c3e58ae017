#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Parse → render → parse must not panic, and whatever parsed once must
    // render and parse back to the same batch.
    if let Ok(stapel) = extf::Buchungsstapel::from_bytes(data) {
        let bytes = stapel.to_bytes().expect("parsed batch must render");
        let again = extf::Buchungsstapel::from_bytes(&bytes).expect("rendered batch must parse");
        assert_eq!(again, stapel);
    }
});
