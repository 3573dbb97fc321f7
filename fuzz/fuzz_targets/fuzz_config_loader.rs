#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation may reject input but must never panic.
    if let Ok(cfg) = reckon_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // Accepted configs keep every slot inside the store image.
            let capacity = cfg.storage.slot_capacity();
            for c in &cfg.covers {
                for slot in [c.position_slot, c.tilt_slot].into_iter().flatten() {
                    assert!(usize::from(slot) < capacity);
                }
                assert!(c.full_travel_ms > 0);
            }
        }
    }
});
