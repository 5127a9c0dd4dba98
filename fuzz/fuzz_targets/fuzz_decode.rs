#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Structural parse, probe and full decode must never panic
    let _ = zeniff::chunk::ChunkForest::parse(data);
    let _ = zeniff::ImageInfo::from_bytes(data);

    if let Ok(decoded) = zeniff::decode(data, enough::Unstoppable) {
        assert_eq!(
            decoded.pixels().len(),
            decoded.row_bytes() * decoded.height as usize
        );
    }
});
