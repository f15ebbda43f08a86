#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(args) = brokerbench::fuzzing::apply_config_from_json(data) {
        debug_assert!(!args.timing.run_duration.is_zero());
        debug_assert!(args.sweep.checkpoint_every.get() > 0);
    }
});
