#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(rows) = brokerbench::fuzzing::parse_results_csv_input(input) {
            debug_assert!(rows.len() < input.lines().count().max(1));
        }
    }
});
