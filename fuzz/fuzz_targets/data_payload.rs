#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = brokerbench::fuzzing::parse_data_payload_input(data) {
        let encoded = message.encode(0);
        let reparsed = brokerbench::fuzzing::parse_data_payload_input(&encoded);
        debug_assert!(matches!(reparsed, Ok(again) if again == message));
    }
});
